//! Vector Index
//!
//! Wraps USearch with a fixed configuration: squared Euclidean (L2²) metric
//! and full `f32` storage, so reported distances are exact. Vectors are keyed
//! by their ordinal, assigned in insertion order at build time. There is no
//! insert after build; a changed corpus means a full rebuild.
//!
//! Queries scan every stored vector (`exact_search`), so the top `k` never
//! depends on graph traversal. The HNSW graph is still built and persisted
//! with the index. Search results are sorted ascending by distance with ties
//! broken by ascending ordinal. Distances are unbounded dissimilarities, not
//! scores.

use std::path::{Path, PathBuf};

use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

// ============================================================================
// CONSTANTS
// ============================================================================

/// HNSW connectivity parameter (higher = better recall, more memory)
pub const DEFAULT_CONNECTIVITY: usize = 16;

/// HNSW expansion factor for index building
pub const DEFAULT_EXPANSION_ADD: usize = 128;

/// HNSW expansion factor for search (higher = better recall, slower)
pub const DEFAULT_EXPANSION_SEARCH: usize = 64;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Vector search error types
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum VectorSearchError {
    /// Failed to create the index
    #[error("Index creation failed: {0}")]
    IndexCreation(String),
    /// Failed to add a vector
    #[error("Failed to add vector: {0}")]
    IndexAdd(String),
    /// Failed to search
    #[error("Search failed: {0}")]
    IndexSearch(String),
    /// No index file at the given path
    #[error("Index file not found: {}", .0.display())]
    IndexMissing(PathBuf),
    /// Failed to persist/load index
    #[error("Persistence failed: {0}")]
    IndexPersistence(String),
    /// Dimension mismatch (expected, got)
    #[error("Invalid dimensions: expected {0}, got {1}")]
    InvalidDimensions(usize, usize),
}

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Configuration for vector index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorIndexConfig {
    /// Number of dimensions
    pub dimensions: usize,
    /// HNSW connectivity parameter
    pub connectivity: usize,
    /// Expansion factor for adding vectors
    pub expansion_add: usize,
    /// Expansion factor for searching
    pub expansion_search: usize,
}

impl VectorIndexConfig {
    /// Default graph parameters for `dimensions`-wide vectors
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            connectivity: DEFAULT_CONNECTIVITY,
            expansion_add: DEFAULT_EXPANSION_ADD,
            expansion_search: DEFAULT_EXPANSION_SEARCH,
        }
    }

    fn options(&self) -> IndexOptions {
        IndexOptions {
            dimensions: self.dimensions,
            metric: MetricKind::L2sq,
            quantization: ScalarKind::F32,
            connectivity: self.connectivity,
            expansion_add: self.expansion_add,
            expansion_search: self.expansion_search,
            multi: false,
        }
    }
}

/// Index statistics
#[derive(Debug, Clone)]
pub struct VectorIndexStats {
    /// Total number of vectors
    pub total_vectors: usize,
    /// Vector dimensions
    pub dimensions: usize,
    /// HNSW connectivity
    pub connectivity: usize,
    /// Serialized size in bytes
    pub memory_bytes: usize,
}

/// One search hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Position of the vector in build order
    pub ordinal: usize,
    /// Squared Euclidean distance to the query
    pub distance: f32,
}

// ============================================================================
// VECTOR INDEX
// ============================================================================

/// Immutable nearest-neighbor index over embeddings, keyed by ordinal
pub struct VectorIndex {
    index: Index,
    config: VectorIndexConfig,
}

impl VectorIndex {
    /// Build an index from embeddings; ordinal `i` is `embeddings[i]`
    pub fn build<V: AsRef<[f32]>>(
        dimensions: usize,
        embeddings: &[V],
    ) -> Result<Self, VectorSearchError> {
        Self::build_with_config(VectorIndexConfig::new(dimensions), embeddings)
    }

    /// Build with custom graph parameters
    pub fn build_with_config<V: AsRef<[f32]>>(
        config: VectorIndexConfig,
        embeddings: &[V],
    ) -> Result<Self, VectorSearchError> {
        if config.dimensions == 0 {
            return Err(VectorSearchError::IndexCreation(
                "dimensions must be at least 1".to_string(),
            ));
        }

        let index = Index::new(&config.options())
            .map_err(|e| VectorSearchError::IndexCreation(e.to_string()))?;

        // usearch requires reserve() before add()
        index
            .reserve(embeddings.len().max(1))
            .map_err(|e| {
                VectorSearchError::IndexCreation(format!("Failed to reserve capacity: {}", e))
            })?;

        for (ordinal, vector) in embeddings.iter().enumerate() {
            let vector = vector.as_ref();
            if vector.len() != config.dimensions {
                return Err(VectorSearchError::InvalidDimensions(
                    config.dimensions,
                    vector.len(),
                ));
            }
            index
                .add(ordinal as u64, vector)
                .map_err(|e| VectorSearchError::IndexAdd(e.to_string()))?;
        }

        tracing::info!(
            vectors = embeddings.len(),
            dimensions = config.dimensions,
            "Vector index built"
        );

        Ok(Self { index, config })
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.index.size()
    }

    /// Check if the index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the dimensions of the index
    pub fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    /// Find the `k` nearest vectors to `query`
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, VectorSearchError> {
        if query.len() != self.config.dimensions {
            return Err(VectorSearchError::InvalidDimensions(
                self.config.dimensions,
                query.len(),
            ));
        }

        if self.is_empty() || k == 0 {
            return Ok(vec![]);
        }

        // Widen until the cut-off no longer falls inside a run of equal
        // distances, so ties at rank k are settled by ordinal
        let mut limit = k.min(self.len());
        loop {
            let mut neighbors = self.exact_neighbors(query, limit)?;
            neighbors.sort_by(|a, b| {
                a.distance
                    .total_cmp(&b.distance)
                    .then(a.ordinal.cmp(&b.ordinal))
            });

            // The farthest fetched candidate ties the k-th: unfetched vectors
            // at that same distance may carry smaller ordinals
            let boundary_tied = neighbors.len() == limit
                && neighbors.len() >= k
                && neighbors[limit - 1].distance == neighbors[k - 1].distance;

            if boundary_tied && limit < self.len() {
                limit = limit.saturating_mul(2).min(self.len());
                continue;
            }

            neighbors.truncate(k);
            return Ok(neighbors);
        }
    }

    fn exact_neighbors(
        &self,
        query: &[f32],
        limit: usize,
    ) -> Result<Vec<Neighbor>, VectorSearchError> {
        let matches = self
            .index
            .exact_search(query, limit)
            .map_err(|e| VectorSearchError::IndexSearch(e.to_string()))?;

        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .map(|(&key, &distance)| Neighbor {
                ordinal: key as usize,
                distance,
            })
            .collect())
    }

    /// Save the index to disk
    pub fn persist(&self, path: &Path) -> Result<(), VectorSearchError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| VectorSearchError::IndexPersistence("Invalid path".to_string()))?;

        self.index
            .save(path_str)
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))
    }

    /// Load an index saved by [`VectorIndex::persist`]
    pub fn load(path: &Path, dimensions: usize) -> Result<Self, VectorSearchError> {
        Self::load_with_config(path, VectorIndexConfig::new(dimensions))
    }

    /// Load with custom graph parameters
    pub fn load_with_config(
        path: &Path,
        config: VectorIndexConfig,
    ) -> Result<Self, VectorSearchError> {
        let path_str = path
            .to_str()
            .ok_or_else(|| VectorSearchError::IndexPersistence("Invalid path".to_string()))?;
        if !path.is_file() {
            return Err(VectorSearchError::IndexMissing(path.to_path_buf()));
        }

        let index = Index::new(&config.options())
            .map_err(|e| VectorSearchError::IndexCreation(e.to_string()))?;

        index
            .load(path_str)
            .map_err(|e| VectorSearchError::IndexPersistence(e.to_string()))?;

        if index.dimensions() != config.dimensions {
            return Err(VectorSearchError::InvalidDimensions(
                config.dimensions,
                index.dimensions(),
            ));
        }

        Ok(Self { index, config })
    }

    /// Get index statistics
    pub fn stats(&self) -> VectorIndexStats {
        VectorIndexStats {
            total_vectors: self.len(),
            dimensions: self.config.dimensions,
            connectivity: self.config.connectivity,
            memory_bytes: self.index.serialized_length(),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
