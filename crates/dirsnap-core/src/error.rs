//! Error types for snapshot operations.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used across the dirsnap crates.
pub type Result<T, E = SnapshotError> = std::result::Result<T, E>;

/// Errors that can occur while saving or restoring a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// Source directory or document file does not exist.
    #[error("Path not found: {path}")]
    PathNotFound { path: PathBuf },

    /// The snapshot source is not a directory.
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// File bytes could not be decoded as UTF-8 text.
    #[error("File is not valid UTF-8 text: {path}")]
    NotUtf8Content { path: PathBuf },

    /// Document could not be parsed into a snapshot.
    #[error("Malformed document at `{location}`: {reason}")]
    MalformedDocument { location: String, reason: String },

    /// A directory or file could not be written during restore or save.
    #[error("Failed to write {path}: {source}")]
    IoWriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No document was given and none could be found in the directory.
    #[error("No snapshot document (*.json) found in {dir}")]
    AmbiguousDefaultDocument { dir: PathBuf },

    /// Generic I/O error while reading.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Document serialization failed.
    #[error("Failed to serialize document: {0}")]
    Json(#[from] serde_json::Error),
}

impl SnapshotError {
    /// Create a read-side I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::PathNotFound { path },
            _ => Self::Io { path, source },
        }
    }

    /// Create a write-side I/O error with path context.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::IoWriteFailure {
            path: path.into(),
            source,
        }
    }

    /// Create a malformed document error.
    pub fn malformed(location: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedDocument {
            location: location.into(),
            reason: reason.into(),
        }
    }
}
