//! Identity Map
//!
//! Maps each vector's ordinal position in the index to the stable key of the
//! record it was embedded from. The map stores domain keys only, never row
//! positions of a dataset that may be reloaded or re-sorted.
//!
//! The persisted form also carries build provenance (model identifier,
//! dimensionality, build time) so the query side can check that it embeds
//! queries with the same capability that built the index.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dataset::RecordId;

/// On-disk format version
pub const IDENTITY_MAP_VERSION: u32 = 1;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Identity map error types
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum IdentityMapError {
    /// Ordinal outside the built range
    #[error("Ordinal not found: {0}")]
    NotFound(usize),
    /// Persisted map has an unknown format version
    #[error("Unsupported identity map version {found} (expected {expected})")]
    UnsupportedVersion {
        /// Version found in the file
        found: u32,
        /// Version this build understands
        expected: u32,
    },
    /// No map file at the given path
    #[error("Identity map not found: {}", .0.display())]
    Missing(PathBuf),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization error
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// PROVENANCE
// ============================================================================

/// How the paired vector index was built
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    /// Embedding model identifier
    pub model: String,
    /// Embedding dimensionality
    pub dimensions: usize,
    /// When the build finished
    pub built_at: DateTime<Utc>,
}

impl Provenance {
    /// Provenance stamped with the current time
    pub fn now(model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            model: model.into(),
            dimensions,
            built_at: Utc::now(),
        }
    }
}

// ============================================================================
// IDENTITY MAP
// ============================================================================

#[derive(Serialize, Deserialize)]
struct IdentityMapFile {
    version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    provenance: Option<Provenance>,
    keys: Vec<RecordId>,
}

/// Ordinal -> record key
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IdentityMap {
    keys: Vec<RecordId>,
    provenance: Option<Provenance>,
}

impl IdentityMap {
    /// Build from keys in index insertion order
    pub fn build<I>(keys: I) -> Self
    where
        I: IntoIterator<Item = RecordId>,
    {
        Self {
            keys: keys.into_iter().collect(),
            provenance: None,
        }
    }

    /// Attach build provenance
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        self.provenance = Some(provenance);
        self
    }

    /// Build provenance, if recorded
    pub fn provenance(&self) -> Option<&Provenance> {
        self.provenance.as_ref()
    }

    /// Resolve an ordinal to its record key
    pub fn resolve(&self, ordinal: usize) -> Result<RecordId, IdentityMapError> {
        self.keys
            .get(ordinal)
            .copied()
            .ok_or(IdentityMapError::NotFound(ordinal))
    }

    /// Number of mapped ordinals
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if the map is empty
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// `(ordinal, key)` pairs in ordinal order
    pub fn iter(&self) -> impl Iterator<Item = (usize, RecordId)> + '_ {
        self.keys.iter().copied().enumerate()
    }

    /// Write the map as JSON
    pub fn persist(&self, path: &Path) -> Result<(), IdentityMapError> {
        let file = IdentityMapFile {
            version: IDENTITY_MAP_VERSION,
            provenance: self.provenance.clone(),
            keys: self.keys.clone(),
        };
        let json = serde_json::to_vec(&file)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Read a map written by [`IdentityMap::persist`]
    pub fn load(path: &Path) -> Result<Self, IdentityMapError> {
        let bytes = std::fs::read(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => IdentityMapError::Missing(path.to_path_buf()),
            _ => IdentityMapError::Io(e),
        })?;
        let file: IdentityMapFile = serde_json::from_slice(&bytes)?;
        if file.version != IDENTITY_MAP_VERSION {
            return Err(IdentityMapError::UnsupportedVersion {
                found: file.version,
                expected: IDENTITY_MAP_VERSION,
            });
        }
        Ok(Self {
            keys: file.keys,
            provenance: file.provenance,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
