//! Load errors.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

/// Face attribute an index refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attribute {
    Vertex,
    TexCoord,
    Normal,
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Attribute::Vertex => "vertex",
            Attribute::TexCoord => "texcoord",
            Attribute::Normal => "normal",
        })
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to open OBJ file {}: {source}", .path.display())]
    CannotOpenSource {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to read OBJ source: {0}")]
    Read(#[from] io::Error),
    #[error("OBJ contains no geometry ({vertices} vertices, {faces} faces)")]
    EmptyOrInvalidMesh { vertices: usize, faces: usize },
    #[error("OBJ {attribute} index {index} out of range (count={count})")]
    IndexOutOfRange {
        attribute: Attribute,
        index: i64,
        count: usize,
    },
    #[error("Malformed face record on line {line}: {reason}")]
    MalformedFaceRecord { line: usize, reason: String },
    #[error("Missing or invalid {what} on line {line}")]
    MalformedAttribute { line: usize, what: &'static str },
}

pub type LoadResult<T> = Result<T, LoadError>;
