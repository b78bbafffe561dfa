//! Owner of a loaded mesh for a renderer to read from.

use std::path::Path;

use crate::{
    error::LoadResult,
    mesh::ObjMesh,
    obj::{LoadOptions, load_obj_from_path},
};

/// Holds at most one loaded mesh.
///
/// A load always drops whatever was held before, so a failed load leaves the
/// loader empty.
#[derive(Debug, Default)]
pub struct MeshLoader {
    options: LoadOptions,
    mesh: Option<ObjMesh>,
}

impl MeshLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: LoadOptions) -> Self {
        Self {
            options,
            mesh: None,
        }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Load `path`, replacing the current mesh.
    pub fn load(&mut self, path: impl AsRef<Path>) -> LoadResult<()> {
        self.release();
        let path = path.as_ref();
        match load_obj_from_path(path, &self.options) {
            Ok(mesh) => {
                self.mesh = Some(mesh);
                Ok(())
            }
            Err(err) => {
                log::error!("Failed to load {:?}: {}", path, err);
                Err(err)
            }
        }
    }

    /// Drop all buffers. Does nothing when empty.
    pub fn release(&mut self) {
        if self.mesh.take().is_some() {
            log::debug!("Released mesh buffers");
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.mesh.is_some()
    }

    pub fn mesh(&self) -> Option<&ObjMesh> {
        self.mesh.as_ref()
    }

    pub fn vertex_buffer(&self) -> Option<&[f32]> {
        self.mesh.as_ref().map(ObjMesh::vertex_buffer)
    }

    pub fn normal_buffer(&self) -> Option<&[f32]> {
        self.mesh.as_ref().map(ObjMesh::normal_buffer)
    }

    pub fn texcoord_buffer(&self) -> Option<&[f32]> {
        self.mesh.as_ref().and_then(ObjMesh::texcoord_buffer)
    }

    pub fn indices(&self) -> Option<&[u32]> {
        self.mesh.as_ref().map(ObjMesh::indices)
    }

    /// Number of indices to draw; zero when nothing is loaded.
    pub fn index_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, ObjMesh::index_count)
    }

    pub fn has_normals(&self) -> bool {
        self.mesh.as_ref().is_some_and(ObjMesh::has_normals)
    }
}
