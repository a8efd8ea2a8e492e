//! Error types for the editor

use quire_model::{ModelError, Path};
use thiserror::Error;

pub type EditorResult<T> = Result<T, EditorError>;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Model error: {0}")]
    Model(#[from] ModelError),

    #[error("Cannot resolve a node at path {path:?}")]
    UnresolvedPath { path: Path },

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Raised by schema hooks, never by the core.
    #[error("Schema violation: {0}")]
    SchemaViolation(String),

    #[error("Could not completely normalize the editor after {iterations} iterations")]
    NormalizationLimit { iterations: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl EditorError {
    pub fn unresolved(path: &[usize]) -> Self {
        EditorError::UnresolvedPath {
            path: path.to_vec(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        EditorError::InvalidOperation(message.into())
    }
}
