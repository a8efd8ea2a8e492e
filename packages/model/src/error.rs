use crate::path::Path;
use thiserror::Error;

pub type ModelResult<T> = Result<T, ModelError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("Cannot find a node at path {path:?}")]
    UnresolvedPath { path: Path },

    #[error("Node at path {path:?} is not a text leaf")]
    NotText { path: Path },

    #[error("Node at path {path:?} cannot have children")]
    NotAncestor { path: Path },

    #[error("Offset {offset} is out of range for text of length {len} at path {path:?}")]
    OffsetOutOfRange { path: Path, offset: usize, len: usize },

    #[error("Cannot get the {relation} of the root path")]
    RootPath { relation: &'static str },

    #[error("Path {path:?} has no previous sibling")]
    NoPrevious { path: Path },

    #[error("Path {path:?} is not a descendant of {ancestor:?}")]
    NotDescendant { path: Path, ancestor: Path },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),
}

impl ModelError {
    pub fn unresolved(path: &[usize]) -> Self {
        Self::UnresolvedPath {
            path: path.to_vec(),
        }
    }

    pub fn not_text(path: &[usize]) -> Self {
        Self::NotText {
            path: path.to_vec(),
        }
    }

    pub fn not_ancestor(path: &[usize]) -> Self {
        Self::NotAncestor {
            path: path.to_vec(),
        }
    }

    pub fn offset_out_of_range(path: &[usize], offset: usize, len: usize) -> Self {
        Self::OffsetOutOfRange {
            path: path.to_vec(),
            offset,
            len,
        }
    }

    pub fn root_path(relation: &'static str) -> Self {
        Self::RootPath { relation }
    }

    pub fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}
