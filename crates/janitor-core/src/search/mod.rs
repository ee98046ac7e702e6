//! Search Module
//!
//! - Vector index over embeddings (USearch, squared L2)
//! - Query engine resolving hits back to source records

mod engine;
mod vector;

pub use vector::{
    Neighbor, VectorIndex, VectorIndexConfig, VectorIndexStats, VectorSearchError,
    DEFAULT_CONNECTIVITY, DEFAULT_EXPANSION_ADD, DEFAULT_EXPANSION_SEARCH,
};

pub use engine::{ArtifactPaths, EnrichedResult, Lookup, QueryEngine};
