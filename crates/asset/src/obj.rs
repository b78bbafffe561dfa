//! Two-pass OBJ loader for triangular meshes.
//!
//! Pass 1 counts `v`/`vt`/`vn`/`f` lines so every buffer is allocated once at
//! its final size; pass 2 rewinds and fills them. Only the first three
//! references of a face are used.

use std::{
    fs::File,
    io::{self, BufRead, BufReader, Seek},
    path::Path,
};

use corelib::{Bounds, BoundsSeed, DEFAULT_SCALE_DIVISOR, Vec3};

use crate::{
    error::{Attribute, LoadError, LoadResult},
    face::{self, Corner},
    mesh::{FaceIndexTable, ObjMesh, RawCounts},
    normals,
};

/// Knobs for post-processing a parsed mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoadOptions {
    /// Starting point of the bounding-box accumulation.
    pub bounds_seed: BoundsSeed,
    /// Bounding-box diagonal is divided by this to get the scale factor.
    pub scale_divisor: f32,
    /// Re-index texcoords to one per vertex when their topology differs.
    pub remap_texcoords: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            bounds_seed: BoundsSeed::default(),
            scale_divisor: DEFAULT_SCALE_DIVISOR,
            remap_texcoords: false,
        }
    }
}

/// Load an OBJ mesh from a file path.
pub fn load_obj_from_path(path: impl AsRef<Path>, options: &LoadOptions) -> LoadResult<ObjMesh> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::CannotOpenSource {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Opened OBJ file {:?}", path);
    load_obj_from_reader(BufReader::new(file), options)
}

/// Load an OBJ mesh from a rewindable reader.
pub fn load_obj_from_reader<R: BufRead + Seek>(
    mut reader: R,
    options: &LoadOptions,
) -> LoadResult<ObjMesh> {
    let counts = count_entities(&mut reader)?;
    log::debug!("OBJ pass 1: {:?}", counts);
    if counts.vertices == 0 || counts.faces == 0 {
        return Err(LoadError::EmptyOrInvalidMesh {
            vertices: counts.vertices,
            faces: counts.faces,
        });
    }

    reader.rewind()?;
    let parsed = populate(&mut reader, &counts)?;
    validate_indices(&parsed.faces, &counts)?;

    if parsed.truncated_faces > 0 {
        log::warn!(
            "{} face(s) had more than 3 vertices; extra vertices were ignored",
            parsed.truncated_faces
        );
    }

    Ok(finish(parsed, counts, options))
}

/// Convenience helper to parse an OBJ string literal.
pub fn load_obj_from_str(contents: &str, options: &LoadOptions) -> LoadResult<ObjMesh> {
    load_obj_from_reader(io::Cursor::new(contents), options)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LineKind {
    Vertex,
    TexCoord,
    Normal,
    Face,
    Ignored,
}

/// Split a line into its kind and the text after the tag.
fn classify(line: &str) -> (LineKind, &str) {
    let trimmed = line.trim_start();
    let (tag, rest) = trimmed
        .split_once(char::is_whitespace)
        .unwrap_or((trimmed, ""));
    let kind = match tag {
        "v" => LineKind::Vertex,
        "vt" => LineKind::TexCoord,
        "vn" => LineKind::Normal,
        "f" => LineKind::Face,
        _ => LineKind::Ignored,
    };
    (kind, rest)
}

/// Feed every line to `f` with its 0-based number.
///
/// Lines are read as raw bytes and decoded lossily, so non-UTF-8 comments or
/// unknown directives never fail a load; only the payloads we parse matter.
fn for_each_line<R, F>(mut reader: R, mut f: F) -> LoadResult<()>
where
    R: BufRead,
    F: FnMut(usize, &str) -> LoadResult<()>,
{
    let mut buf = Vec::new();
    let mut line_no = 0;
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 {
            return Ok(());
        }
        let line = String::from_utf8_lossy(&buf);
        f(line_no, line.trim_end_matches(['\n', '\r']))?;
        line_no += 1;
    }
}

fn count_entities<R: BufRead>(reader: R) -> LoadResult<RawCounts> {
    let mut counts = RawCounts::default();
    for_each_line(reader, |_, line| {
        match classify(line).0 {
            LineKind::Vertex => counts.vertices += 1,
            LineKind::TexCoord => counts.texcoords += 1,
            LineKind::Normal => counts.normals += 1,
            LineKind::Face => counts.faces += 1,
            LineKind::Ignored => {}
        }
        Ok(())
    })?;
    Ok(counts)
}

struct Parsed {
    vertices: Vec<[f32; 4]>,
    texcoords: Vec<[f32; 2]>,
    normals: Vec<[f32; 3]>,
    faces: FaceIndexTable,
    truncated_faces: usize,
}

fn populate<R: BufRead>(reader: R, counts: &RawCounts) -> LoadResult<Parsed> {
    let mut vertices = vec![[0.0f32; 4]; counts.vertices];
    let mut texcoords = vec![[0.0f32; 2]; counts.texcoords];
    let mut normals = vec![[0.0f32; 3]; counts.normals];
    let mut faces = FaceIndexTable::zeroed(counts);

    let (mut itr_v, mut itr_t, mut itr_n, mut itr_f) = (0usize, 0usize, 0usize, 0usize);
    let mut truncated_faces = 0;

    for_each_line(reader, |line_no, line| {
        let (kind, rest) = classify(line);
        let mut parts = rest.split_whitespace();

        match kind {
            LineKind::Vertex => {
                let slot = next_slot(&mut vertices, &mut itr_v)?;
                slot[0] = parse_f32(parts.next(), line_no, "x coordinate")?;
                slot[1] = parse_f32(parts.next(), line_no, "y coordinate")?;
                slot[2] = parse_f32(parts.next(), line_no, "z coordinate")?;
            }
            LineKind::TexCoord => {
                let slot = next_slot(&mut texcoords, &mut itr_t)?;
                slot[0] = parse_f32(parts.next(), line_no, "u coordinate")?;
                slot[1] = parse_f32(parts.next(), line_no, "v coordinate")?;
            }
            LineKind::Normal => {
                let slot = next_slot(&mut normals, &mut itr_n)?;
                slot[0] = parse_f32(parts.next(), line_no, "nx coordinate")?;
                slot[1] = parse_f32(parts.next(), line_no, "ny coordinate")?;
                slot[2] = parse_f32(parts.next(), line_no, "nz coordinate")?;
            }
            LineKind::Face => {
                if itr_f >= counts.faces {
                    return Err(source_changed());
                }
                let parsed = face::parse_face(rest).map_err(|reason| {
                    LoadError::MalformedFaceRecord {
                        line: line_no + 1,
                        reason,
                    }
                })?;
                if parsed.ignored_refs > 0 {
                    truncated_faces += 1;
                }
                for (slot, corner) in parsed.record.corners().into_iter().enumerate() {
                    store_corner(&mut faces, 3 * itr_f + slot, corner, counts)?;
                }
                itr_f += 1;
            }
            LineKind::Ignored => {}
        }
        Ok(())
    })?;

    Ok(Parsed {
        vertices,
        texcoords,
        normals,
        faces,
        truncated_faces,
    })
}

fn next_slot<'a, T>(buf: &'a mut [T], cursor: &mut usize) -> LoadResult<&'a mut T> {
    let slot = buf.get_mut(*cursor).ok_or_else(source_changed)?;
    *cursor += 1;
    Ok(slot)
}

fn source_changed() -> LoadError {
    LoadError::Read(io::Error::new(
        io::ErrorKind::InvalidData,
        "OBJ source changed between passes",
    ))
}

fn store_corner(
    faces: &mut FaceIndexTable,
    at: usize,
    corner: Corner,
    counts: &RawCounts,
) -> LoadResult<()> {
    faces.vertex[at] = resolve_index(corner.vertex, counts.vertices, Attribute::Vertex)?;

    if let Some(raw) = corner.texcoord {
        let table = faces.texcoord.as_mut().ok_or(LoadError::IndexOutOfRange {
            attribute: Attribute::TexCoord,
            index: raw,
            count: 0,
        })?;
        table[at] = resolve_index(raw, counts.texcoords, Attribute::TexCoord)?;
    }

    if let Some(raw) = corner.normal {
        let table = faces.normal.as_mut().ok_or(LoadError::IndexOutOfRange {
            attribute: Attribute::Normal,
            index: raw,
            count: 0,
        })?;
        table[at] = resolve_index(raw, counts.normals, Attribute::Normal)?;
    }

    Ok(())
}

/// Convert a 1-based or negative (relative-from-end) reference to 0-based.
///
/// Upper-bound checks are left to [`validate_indices`]; anything that would
/// land below zero is rejected here.
pub fn resolve_index(raw: i64, count: usize, attribute: Attribute) -> LoadResult<u32> {
    let idx = if raw < 0 { count as i64 + raw } else { raw - 1 };
    u32::try_from(idx).map_err(|_| LoadError::IndexOutOfRange {
        attribute,
        index: idx,
        count,
    })
}

/// Reject tables whose largest index reaches past its attribute's count.
pub fn validate_indices(faces: &FaceIndexTable, counts: &RawCounts) -> LoadResult<()> {
    check_max(&faces.vertex, counts.vertices, Attribute::Vertex)?;
    if let Some(idx) = &faces.texcoord {
        check_max(idx, counts.texcoords, Attribute::TexCoord)?;
    }
    if let Some(idx) = &faces.normal {
        check_max(idx, counts.normals, Attribute::Normal)?;
    }
    Ok(())
}

fn check_max(indices: &[u32], count: usize, attribute: Attribute) -> LoadResult<()> {
    match indices.iter().copied().max() {
        Some(max) if max as usize >= count => Err(LoadError::IndexOutOfRange {
            attribute,
            index: i64::from(max),
            count,
        }),
        _ => Ok(()),
    }
}

fn finish(parsed: Parsed, counts: RawCounts, options: &LoadOptions) -> ObjMesh {
    let Parsed {
        mut vertices,
        texcoords,
        normals: declared,
        faces,
        ..
    } = parsed;

    let bounds = Bounds::from_points(
        vertices.iter().map(|v| Vec3::new(v[0], v[1], v[2])),
        options.bounds_seed,
    );
    let scale = bounds.scale_factor(options.scale_divisor);
    for v in &mut vertices {
        v[3] = scale;
    }

    let (normals, normal_source) = normals::ensure_normals(&vertices, &faces, declared);
    log::debug!("Normals: {:?}", normal_source);

    let lined_up = texcoords.len() == vertices.len()
        && faces.texcoord.as_deref() == Some(faces.vertex.as_slice());
    let (texcoords, texcoords_per_vertex) = if texcoords.is_empty() {
        (None, false)
    } else if options.remap_texcoords && !lined_up {
        match normals::remap_texcoords(vertices.len(), &faces, &texcoords) {
            Some(remapped) => (Some(remapped), true),
            None => (Some(texcoords), false),
        }
    } else {
        (Some(texcoords), lined_up)
    };

    log::info!(
        "Loaded OBJ: {} vertices, {} texcoords, {} normals, {} triangles (scale {:.4})",
        counts.vertices,
        counts.texcoords,
        counts.normals,
        counts.faces,
        scale
    );

    ObjMesh {
        counts,
        vertices,
        normals,
        texcoords,
        texcoords_per_vertex,
        faces,
        bounds,
        scale,
        normal_source,
    }
}

fn parse_f32(value: Option<&str>, line_no: usize, what: &'static str) -> LoadResult<f32> {
    value
        .and_then(|token| token.parse::<f32>().ok())
        .ok_or(LoadError::MalformedAttribute {
            line: line_no + 1,
            what,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::NormalSource;

    const TETRAHEDRON: &str = r#"
        # unit tetrahedron
        o tetra
        v 0.0 0.0 0.0
        v 1.0 0.0 0.0
        v 0.0 1.0 0.0
        v 0.0 0.0 1.0
        f 1 3 2
        f 1 2 4
        f 1 4 3
        f 2 3 4
    "#;

    fn load(src: &str) -> LoadResult<ObjMesh> {
        load_obj_from_str(src, &LoadOptions::default())
    }

    #[test]
    fn classify_tags() {
        assert_eq!(classify("v 1 2 3").0, LineKind::Vertex);
        assert_eq!(classify("  vt 0 1").0, LineKind::TexCoord);
        assert_eq!(classify("vn 0 0 1").0, LineKind::Normal);
        assert_eq!(classify("f 1 2 3").1, "1 2 3");
        assert_eq!(classify("vp 1 2").0, LineKind::Ignored);
        assert_eq!(classify("v").0, LineKind::Vertex);
        assert_eq!(classify("").0, LineKind::Ignored);
        assert_eq!(classify("#v 1 2 3").0, LineKind::Ignored);
    }

    #[test]
    fn tetrahedron_loads_with_synthesized_normals() {
        let mesh = load(TETRAHEDRON).expect("parse tetrahedron");
        assert!(mesh.has_normals());
        assert_eq!(mesh.normal_source(), NormalSource::Synthesized);
        assert_eq!(mesh.index_count(), 12);
        assert!(mesh.indices().iter().all(|&i| i <= 3));
        assert_eq!(mesh.vertex_buffer().len(), 16);
        assert_eq!(mesh.normal_buffer().len(), 12);
        assert!(mesh.texcoord_buffer().is_none());
        for n in mesh.normals() {
            assert!((Vec3::from_array(*n).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn scale_is_written_into_w() {
        let mesh = load(TETRAHEDRON).expect("parse tetrahedron");
        let expected = 3f32.sqrt() / DEFAULT_SCALE_DIVISOR;
        assert!((mesh.scale() - expected).abs() < 1e-6);
        assert!(mesh.vertices().iter().all(|v| v[3] == mesh.scale()));
    }

    #[test]
    fn buffer_lengths_follow_counts() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nvn 0 0 1\nf 1/1/1 2/2/1 3/3/1\n";
        let mesh = load(src).expect("parse triangle");
        assert_eq!(
            mesh.counts(),
            RawCounts {
                vertices: 3,
                texcoords: 3,
                normals: 1,
                faces: 1
            }
        );
        assert_eq!(mesh.vertex_buffer().len(), 12);
        assert_eq!(mesh.texcoord_buffer().map(<[f32]>::len), Some(6));
        assert_eq!(mesh.normal_buffer().len(), 9);
        assert_eq!(mesh.index_count(), 3);
        assert_eq!(mesh.normal_source(), NormalSource::Remapped);
        assert_eq!(mesh.normals(), &[[0.0, 0.0, 1.0]; 3]);
    }

    #[test]
    fn negative_indices_count_from_end() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 0 0 1
vn 0 0 1
vn 0 1 0
f -1//-1 -2//-2 -3//-1
";
        let mesh = load(src).expect("parse relative face");
        let faces = mesh.faces();
        assert_eq!(faces.vertex, vec![3, 2, 1]);
        assert_eq!(faces.normal.as_deref(), Some(&[1, 0, 1][..]));
        assert!(faces.texcoord.is_none());
    }

    #[test]
    fn face_overrun_is_rejected() {
        let src = TETRAHEDRON.replace("f 2 3 4", "f 1 2 99");
        match load(&src) {
            Err(LoadError::IndexOutOfRange {
                attribute: Attribute::Vertex,
                index: 98,
                count: 4,
            }) => {}
            other => panic!("expected IndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn one_past_the_end_is_rejected() {
        let src = TETRAHEDRON.replace("f 2 3 4", "f 2 3 5");
        assert!(matches!(load(&src), Err(LoadError::IndexOutOfRange { .. })));
    }

    #[test]
    fn zero_and_underflowing_indices_are_rejected() {
        let zero = TETRAHEDRON.replace("f 2 3 4", "f 0 3 4");
        assert!(matches!(load(&zero), Err(LoadError::IndexOutOfRange { index: -1, .. })));
        let under = TETRAHEDRON.replace("f 2 3 4", "f -5 3 4");
        assert!(matches!(load(&under), Err(LoadError::IndexOutOfRange { .. })));
    }

    #[test]
    fn normals_referenced_but_not_declared() {
        let src = TETRAHEDRON.replace("f 2 3 4", "f 2//1 3//1 4//1");
        match load(&src) {
            Err(LoadError::IndexOutOfRange {
                attribute: Attribute::Normal,
                count: 0,
                ..
            }) => {}
            other => panic!("expected normal IndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn empty_mesh_is_rejected() {
        assert!(matches!(
            load("# nothing here\n"),
            Err(LoadError::EmptyOrInvalidMesh {
                vertices: 0,
                faces: 0
            })
        ));
        assert!(matches!(
            load("v 0 0 0\nv 1 0 0\nv 0 1 0\n"),
            Err(LoadError::EmptyOrInvalidMesh { faces: 0, .. })
        ));
    }

    #[test]
    fn malformed_face_reports_line() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2\n";
        assert!(matches!(
            load(src),
            Err(LoadError::MalformedFaceRecord { line: 4, .. })
        ));
        let mixed = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nf 1/1 2 3\n";
        assert!(matches!(
            load(mixed),
            Err(LoadError::MalformedFaceRecord { line: 5, .. })
        ));
    }

    #[test]
    fn malformed_vertex_reports_line() {
        let src = "v 0 0 0\nv 1 zero 0\nv 0 1 0\nf 1 2 3\n";
        assert!(matches!(
            load(src),
            Err(LoadError::MalformedAttribute {
                line: 2,
                what: "y coordinate"
            })
        ));
    }

    #[test]
    fn polygon_faces_are_truncated_to_first_triangle() {
        let src = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";
        let mesh = load(src).expect("parse quad");
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        // Vertex 4 is never referenced, so its synthesized normal is zero.
        assert_eq!(mesh.normals()[3], [0.0; 3]);
    }

    #[test]
    fn consistent_declared_normals_are_kept() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vn 0 0 1
vn 0 0 1
vn 0 0 1
f 1//1 2//2 3//3
";
        let mesh = load(src).expect("parse triangle");
        assert_eq!(mesh.normal_source(), NormalSource::Declared);
        assert_eq!(mesh.normals(), &[[0.0, 0.0, 1.0]; 3]);
    }

    #[test]
    fn mismatched_normal_topology_remaps() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
v 1 1 0
vn 1 0 0
vn 0 1 0
vn 0 0 1
vn 0 0 -1
f 1//2 2//3 3//4
f 2//1 4//1 3//1
";
        let mesh = load(src).expect("parse quad");
        assert_eq!(mesh.normal_source(), NormalSource::Remapped);
        assert_eq!(mesh.normals().len(), 4);
        // 1-based vertices 2 and 3 appear in both faces; the second face writes last.
        assert_eq!(mesh.normals()[0], [0.0, 1.0, 0.0]);
        assert_eq!(mesh.normals()[1], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.normals()[2], [1.0, 0.0, 0.0]);
        assert_eq!(mesh.normals()[3], [1.0, 0.0, 0.0]);
    }

    #[test]
    fn bounds_seed_option() {
        let src = "v -3 -2 -1\nv -1 -4 -2\nv -2 -3 -5\nf 1 2 3\n";
        let first = load(src).expect("parse");
        assert_eq!(first.bounds().max, Vec3::new(-1.0, -2.0, -1.0));

        let options = LoadOptions {
            bounds_seed: BoundsSeed::Origin,
            ..LoadOptions::default()
        };
        let origin = load_obj_from_str(src, &options).expect("parse");
        assert_eq!(origin.bounds().max, Vec3::ZERO);
        assert_eq!(origin.bounds().min, Vec3::new(-3.0, -4.0, -5.0));
    }

    #[test]
    fn scale_tracks_uniform_coordinate_scaling() {
        let scaled: String = TETRAHEDRON
            .lines()
            .map(|l| {
                let t = l.trim_start();
                match t.strip_prefix("v ") {
                    Some(rest) => {
                        let c: Vec<String> = rest
                            .split_whitespace()
                            .map(|x| (x.parse::<f32>().unwrap() * 4.0).to_string())
                            .collect();
                        format!("v {}\n", c.join(" "))
                    }
                    None => format!("{t}\n"),
                }
            })
            .collect();
        let base = load(TETRAHEDRON).expect("parse").scale();
        let big = load(&scaled).expect("parse scaled").scale();
        assert!((big - base * 4.0).abs() < 1e-5);
    }

    #[test]
    fn texcoord_remap_option() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.5 0.5
vt 1 1
f 1/2 2/1 3/2
";
        let plain = load(src).expect("parse");
        assert_eq!(plain.texcoords().map(<[[f32; 2]]>::len), Some(2));

        let options = LoadOptions {
            remap_texcoords: true,
            ..LoadOptions::default()
        };
        let remapped = load_obj_from_str(src, &options).expect("parse");
        assert_eq!(
            remapped.texcoords(),
            Some(&[[1.0, 1.0], [0.5, 0.5], [1.0, 1.0]][..])
        );
        assert_eq!(remapped.to_mesh_data().vertices[1].uv, [0.5, 0.5]);
    }

    #[test]
    fn non_utf8_comments_are_ignored() {
        let src: &[u8] = b"# Cr\xe9\xe9 par exporter\nv 0 0 0\nv 1 0 0\nv 0 1 0\no caf\xe9\nf 1 2 3\n";
        let mesh = load_obj_from_reader(io::Cursor::new(src), &LoadOptions::default())
            .expect("latin-1 comment");
        assert_eq!(mesh.indices(), &[0, 1, 2]);
        assert_eq!(mesh.counts().vertices, 3);
    }

    #[test]
    fn texcoord_overrun_is_rejected() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/9 2/1 3/1\n";
        match load(src) {
            Err(LoadError::IndexOutOfRange {
                attribute: Attribute::TexCoord,
                index: 8,
                count: 3,
            }) => {}
            other => panic!("expected texcoord IndexOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn permuted_texcoords_are_not_treated_as_per_vertex() {
        let src = "\
v 0 0 0
v 1 0 0
v 0 1 0
vt 0.1 0.1
vt 0.2 0.2
vt 0.3 0.3
f 1/3 2/1 3/2
";
        let plain = load(src).expect("parse");
        assert!(!plain.texcoords_per_vertex());
        assert!(plain.to_mesh_data().vertices.iter().all(|v| v.uv == [0.0, 0.0]));

        let options = LoadOptions {
            remap_texcoords: true,
            ..LoadOptions::default()
        };
        let remapped = load_obj_from_str(src, &options).expect("parse");
        assert!(remapped.texcoords_per_vertex());
        assert_eq!(remapped.to_mesh_data().vertices[0].uv, [0.3, 0.3]);
        assert_eq!(remapped.to_mesh_data().vertices[1].uv, [0.1, 0.1]);
    }

    #[test]
    fn aligned_texcoords_are_per_vertex() {
        let src = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvt 1 0\nvt 0 1\nf 1/1 2/2 3/3\n";
        let mesh = load(src).expect("parse");
        assert!(mesh.texcoords_per_vertex());
        assert_eq!(mesh.to_mesh_data().vertices[2].uv, [0.0, 1.0]);
    }
}
