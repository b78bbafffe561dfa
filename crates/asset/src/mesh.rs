//! CPU-side mesh representation produced by the OBJ loader.

use corelib::{Bounds, Vec3};

/// Number of `v`, `vt`, `vn` and `f` lines found in the first pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RawCounts {
    pub vertices: usize,
    pub texcoords: usize,
    pub normals: usize,
    pub faces: usize,
}

/// Resolved, 0-based face indices. Every array is `faces * 3` long.
///
/// `texcoord`/`normal` exist only when the file declares that attribute.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FaceIndexTable {
    pub vertex: Vec<u32>,
    pub texcoord: Option<Vec<u32>>,
    pub normal: Option<Vec<u32>>,
}

impl FaceIndexTable {
    /// Zero-filled table sized for `counts.faces` triangles.
    pub fn zeroed(counts: &RawCounts) -> Self {
        let len = counts.faces * 3;
        Self {
            vertex: vec![0; len],
            texcoord: (counts.texcoords > 0).then(|| vec![0; len]),
            normal: (counts.normals > 0).then(|| vec![0; len]),
        }
    }
}

/// How the per-vertex normal buffer was obtained.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NormalSource {
    /// File normals already matched vertex topology.
    Declared,
    /// File normals copied per face corner onto vertex slots.
    Remapped,
    /// Accumulated from face cross products.
    Synthesized,
}

/// Result of a successful OBJ load. Immutable once built.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjMesh {
    pub(crate) counts: RawCounts,
    pub(crate) vertices: Vec<[f32; 4]>,
    pub(crate) normals: Vec<[f32; 3]>,
    pub(crate) texcoords: Option<Vec<[f32; 2]>>,
    /// Texcoords are indexed by the vertex index array.
    pub(crate) texcoords_per_vertex: bool,
    pub(crate) faces: FaceIndexTable,
    pub(crate) bounds: Bounds,
    pub(crate) scale: f32,
    pub(crate) normal_source: NormalSource,
}

impl ObjMesh {
    /// Positions with the scale factor in `w`, stride 4.
    pub fn vertex_buffer(&self) -> &[f32] {
        bytemuck::cast_slice(&self.vertices)
    }

    /// One normal per vertex, stride 3.
    pub fn normal_buffer(&self) -> &[f32] {
        bytemuck::cast_slice(&self.normals)
    }

    /// Texture coordinates, stride 2.
    pub fn texcoord_buffer(&self) -> Option<&[f32]> {
        self.texcoords.as_deref().map(bytemuck::cast_slice)
    }

    /// Flat triangle list of vertex indices.
    pub fn indices(&self) -> &[u32] {
        &self.faces.vertex
    }

    pub fn index_count(&self) -> usize {
        self.faces.vertex.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn vertices(&self) -> &[[f32; 4]] {
        &self.vertices
    }

    pub fn normals(&self) -> &[[f32; 3]] {
        &self.normals
    }

    pub fn texcoords(&self) -> Option<&[[f32; 2]]> {
        self.texcoords.as_deref()
    }

    /// `true` when `texcoords()[i]` belongs to vertex `i`, either because the
    /// file indexed them that way or because they were remapped.
    pub fn texcoords_per_vertex(&self) -> bool {
        self.texcoords_per_vertex
    }

    pub fn faces(&self) -> &FaceIndexTable {
        &self.faces
    }

    pub fn counts(&self) -> RawCounts {
        self.counts
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn normal_source(&self) -> NormalSource {
        self.normal_source
    }

    /// Mean of all vertex positions.
    pub fn centroid(&self) -> Vec3 {
        let sum = self
            .vertices
            .iter()
            .fold(Vec3::ZERO, |acc, v| acc + Vec3::new(v[0], v[1], v[2]));
        sum / self.vertices.len().max(1) as f32
    }

    /// Interleave into [`MeshVertex`] records sharing the OBJ index list.
    ///
    /// UVs are filled only when texcoords are indexed per vertex; otherwise
    /// they stay zero.
    pub fn to_mesh_data(&self) -> MeshData {
        let per_vertex_uv = self
            .texcoords
            .as_ref()
            .filter(|_| self.texcoords_per_vertex);

        let vertices = self
            .vertices
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let normal = self.normals.get(i).copied().unwrap_or([0.0; 3]);
                let uv = per_vertex_uv.map(|t| t[i]).unwrap_or([0.0, 0.0]);
                MeshVertex::new([v[0], v[1], v[2]], normal, uv)
            })
            .collect();

        MeshData::new(vertices, self.faces.vertex.clone())
    }
}

/// Vertex with position/normal/uv. Values are in object space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Indexed triangle mesh with tightly-packed vertices.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    pub fn new(vertices: Vec<MeshVertex>, indices: Vec<u32>) -> Self {
        Self { vertices, indices }
    }

    /// Returns `true` if both vertex and index buffers are non-empty.
    pub fn is_valid(&self) -> bool {
        !self.vertices.is_empty() && !self.indices.is_empty()
    }
}
