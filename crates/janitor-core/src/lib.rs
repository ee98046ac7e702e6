//! # Janitor Core
//!
//! Semantic similarity search over a corpus of questions:
//!
//! - **Text normalization**: markup stripped, whitespace collapsed, idempotent
//! - **Batched embeddings**: pluggable [`EmbeddingProvider`] (fastembed locally, or feature hashing)
//! - **Vector index**: USearch with squared L2 distance, persisted as an opaque binary
//! - **Identity map**: ordinal -> stable record key, built in the same pass as the index
//! - **Query engine**: ranked results joined back to the current dataset
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use janitor_core::{build_artifacts, provider_for, BuildOptions, Dataset, EmbeddingConfig};
//! use janitor_core::{ArtifactPaths, QueryEngine};
//!
//! let dataset = Dataset::load("questions.jsonl".as_ref())?;
//! let provider = provider_for(&EmbeddingConfig::default())?;
//!
//! let built = build_artifacts(&dataset, &provider, &BuildOptions::default())?;
//! built.commit("questions.usearch".as_ref(), "id_map.json".as_ref())?;
//!
//! let engine = QueryEngine::open(
//!     ArtifactPaths {
//!         index: "questions.usearch".as_ref(),
//!         map: "id_map.json".as_ref(),
//!         dataset: "questions.jsonl".as_ref(),
//!     },
//!     provider,
//! )?;
//! for hit in engine.query("python maximum recursion depth", 5)? {
//!     println!("{} {:?} {:.2}", hit.rank, hit.lookup.record().map(|r| &r.title), hit.distance);
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `embeddings` (default): local embedding generation with fastembed
//! - `bundled-sqlite` (default): compile SQLite in for `.db` datasets

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod config;
pub mod dataset;
pub mod embeddings;
pub mod error;
pub mod identity;
pub mod pipeline;
pub mod search;
pub mod text;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::{
    BuildOptions, DatasetOptions, EmbeddingConfig, SearchOptions, DEFAULT_BATCH_SIZE,
    DEFAULT_BUILD_TIMEOUT_SECS, DEFAULT_MODEL, DEFAULT_TEXT_FIELDS, DEFAULT_TOP_K,
};

pub use dataset::{Dataset, DatasetFormat, Record, RecordId};

#[cfg(feature = "embeddings")]
#[cfg_attr(docsrs, doc(cfg(feature = "embeddings")))]
pub use embeddings::FastEmbedProvider;
pub use embeddings::{
    provider_for, EmbeddingError, EmbeddingGenerator, EmbeddingProvider, HashingEmbedder,
};

pub use error::{Error, Result};

pub use identity::{IdentityMap, IdentityMapError, Provenance};

pub use pipeline::{build_artifacts, BuiltArtifacts, PreparedCorpus};

pub use search::{
    ArtifactPaths, EnrichedResult, Lookup, Neighbor, QueryEngine, VectorIndex, VectorIndexConfig,
    VectorIndexStats, VectorSearchError,
};

pub use text::normalize;
