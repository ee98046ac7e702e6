//! Error taxonomy for the build and query pipelines.
//!
//! Build-time errors are all-or-nothing: any of them aborts the build before
//! artifacts are committed. Query-time `NotFound` conditions are reported per
//! result row by the query engine and only surface here when a caller resolves
//! an ordinal directly.

use std::path::PathBuf;

use crate::embeddings::EmbeddingError;
use crate::identity::IdentityMapError;
use crate::search::VectorSearchError;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Top-level error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required input file does not exist
    #[error("Input file not found: {}", .0.display())]
    InputMissing(PathBuf),
    /// The embedding or vector-index backend failed
    #[error("Capability failure: {0}")]
    CapabilityFailure(String),
    /// An ordinal has no entry in the identity map
    #[error("Ordinal {ordinal} not found in identity map")]
    NotFound {
        /// Ordinal that failed to resolve
        ordinal: usize,
    },
    /// Vector dimensionality disagrees with the index
    #[error("Dimension mismatch: index has {expected} dimensions, got {actual}")]
    DimensionMismatch {
        /// Dimensionality of the index
        expected: usize,
        /// Dimensionality that was supplied
        actual: usize,
    },
    /// Invalid argument or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Source dataset could not be parsed
    #[error("Invalid dataset: {0}")]
    InvalidDataset(String),
    /// Persisted index and identity map do not belong together
    #[error("Artifact mismatch: {0}")]
    ArtifactMismatch(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// SQLite dataset error
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;

impl From<EmbeddingError> for Error {
    fn from(err: EmbeddingError) -> Self {
        match err {
            EmbeddingError::InvalidInput(msg) => Error::InvalidInput(msg),
            other => Error::CapabilityFailure(other.to_string()),
        }
    }
}

impl From<VectorSearchError> for Error {
    fn from(err: VectorSearchError) -> Self {
        match err {
            VectorSearchError::InvalidDimensions(expected, actual) => {
                Error::DimensionMismatch { expected, actual }
            }
            VectorSearchError::IndexMissing(path) => Error::InputMissing(path),
            other => Error::CapabilityFailure(other.to_string()),
        }
    }
}

impl From<IdentityMapError> for Error {
    fn from(err: IdentityMapError) -> Self {
        match err {
            IdentityMapError::NotFound(ordinal) => Error::NotFound { ordinal },
            IdentityMapError::Missing(path) => Error::InputMissing(path),
            IdentityMapError::Io(e) => Error::Io(e),
            IdentityMapError::Json(e) => Error::Json(e),
            other => Error::ArtifactMismatch(other.to_string()),
        }
    }
}

impl Error {
    /// Map a missing-file IO error onto `InputMissing` for `path`
    pub(crate) fn from_io_at(err: std::io::Error, path: &std::path::Path) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Error::InputMissing(path.to_path_buf())
        } else {
            Error::Io(err)
        }
    }
}
