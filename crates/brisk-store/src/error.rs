use crate::ArtifactKey;
use std::path::PathBuf;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors raised by an [`ArtifactStore`](crate::ArtifactStore).
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No artifact is stored under the key
    #[error("Artifact not found: {0}")]
    NotFound(ArtifactKey),

    /// The logical name cannot be mapped to a storage location
    #[error("Invalid artifact name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// Disk backend I/O failure
    #[error("I/O error at {}: {message}", .path.display())]
    Io { path: PathBuf, message: String },
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            message: err.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}
