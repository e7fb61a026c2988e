//! Error types for powermis-storage

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while staging artifacts
#[derive(Debug, Error)]
pub enum StorageError {
    /// I/O error while writing or removing a staged file
    #[error("I/O error: {0}")]
    Io(String),

    /// A path that cannot be expressed as a local file URI
    #[error("Invalid path: {}", .0.display())]
    InvalidPath(PathBuf),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::Io(err.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;
