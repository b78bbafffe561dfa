//! Per-vertex normal regeneration and attribute remapping.

use corelib::Vec3;

use crate::mesh::{FaceIndexTable, NormalSource};

/// Produce exactly one normal per vertex.
///
/// Declared normals are kept when they already line up with the vertex
/// indices, remapped per corner when they don't, and synthesized from face
/// geometry when the file has none.
pub fn ensure_normals(
    vertices: &[[f32; 4]],
    faces: &FaceIndexTable,
    declared: Vec<[f32; 3]>,
) -> (Vec<[f32; 3]>, NormalSource) {
    let normal_index = match faces.normal.as_deref() {
        Some(idx) if !declared.is_empty() => idx,
        _ => return (synthesize_normals(vertices, &faces.vertex), NormalSource::Synthesized),
    };

    if declared.len() != vertices.len() || faces.vertex.as_slice() != normal_index {
        log::debug!(
            "Remapping {} declared normals onto {} vertices",
            declared.len(),
            vertices.len()
        );
        let remapped = remap_per_vertex(vertices.len(), &faces.vertex, normal_index, &declared);
        return (remapped, NormalSource::Remapped);
    }

    (declared, NormalSource::Declared)
}

/// Accumulate unnormalized face normals into each corner's vertex, then
/// normalize. Vertices with zero accumulated length stay zero.
pub fn synthesize_normals(vertices: &[[f32; 4]], vertex_index: &[u32]) -> Vec<[f32; 3]> {
    let mut acc = vec![Vec3::ZERO; vertices.len()];
    let position = |i: u32| {
        let v = vertices[i as usize];
        Vec3::new(v[0], v[1], v[2])
    };

    for tri in vertex_index.chunks_exact(3) {
        let (i0, i1, i2) = (tri[0], tri[1], tri[2]);
        let p0 = position(i0);
        let e1 = position(i1) - p0;
        let e2 = position(i2) - p0;
        let n = e1.cross(e2);

        acc[i0 as usize] += n;
        acc[i1 as usize] += n;
        acc[i2 as usize] += n;
    }

    acc.into_iter()
        .map(|n| n.normalize_or_zero().to_array())
        .collect()
}

/// Scatter per-corner attributes onto vertex slots; last writer wins.
///
/// Slots no corner touches stay zero.
pub fn remap_per_vertex<const N: usize>(
    vertex_count: usize,
    vertex_index: &[u32],
    attr_index: &[u32],
    attrs: &[[f32; N]],
) -> Vec<[f32; N]> {
    let mut out = vec![[0.0; N]; vertex_count];
    for (&v, &a) in vertex_index.iter().zip(attr_index) {
        out[v as usize] = attrs[a as usize];
    }
    out
}

/// Remap texcoords to one per vertex when their topology differs.
///
/// Returns `None` when the texcoords already line up.
pub fn remap_texcoords(
    vertex_count: usize,
    faces: &FaceIndexTable,
    texcoords: &[[f32; 2]],
) -> Option<Vec<[f32; 2]>> {
    let tex_index = faces.texcoord.as_deref()?;
    if texcoords.len() == vertex_count && faces.vertex.as_slice() == tex_index {
        return None;
    }
    Some(remap_per_vertex(vertex_count, &faces.vertex, tex_index, texcoords))
}
