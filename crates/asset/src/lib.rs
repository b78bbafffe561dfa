//! Asset loading: Wavefront OBJ meshes into flat, GPU-ready buffers.

pub mod error;
pub mod face;
pub mod loader;
pub mod mesh;
pub mod normals;
pub mod obj;

pub use error::{Attribute, LoadError, LoadResult};
pub use loader::MeshLoader;
pub use mesh::{FaceIndexTable, MeshData, MeshVertex, NormalSource, ObjMesh, RawCounts};
pub use obj::{LoadOptions, load_obj_from_path, load_obj_from_reader, load_obj_from_str};
