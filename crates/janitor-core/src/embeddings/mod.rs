//! Embeddings Module
//!
//! The embedding capability is a pluggable [`EmbeddingProvider`]:
//!
//! - [`FastEmbedProvider`] (feature `embeddings`): local ONNX inference via fastembed
//! - [`HashingEmbedder`]: deterministic feature hashing, no model download
//!
//! [`EmbeddingGenerator`] batches texts through any provider.

mod generator;
mod hashing;
#[cfg(feature = "embeddings")]
mod local;
mod provider;

pub use generator::EmbeddingGenerator;
pub use hashing::{HashingEmbedder, DEFAULT_HASHING_DIMENSIONS, HASHING_MODEL_PREFIX};
#[cfg(feature = "embeddings")]
pub use local::FastEmbedProvider;
pub use provider::{l2_normalize, squared_l2, EmbeddingError, EmbeddingProvider};

use crate::config::EmbeddingConfig;

/// Create the provider named by `config.model_id`.
///
/// `hashing-<dims>` selects [`HashingEmbedder`]; anything else is handed to
/// fastembed when the `embeddings` feature is enabled.
pub fn provider_for(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, EmbeddingError> {
    if let Some(hashing) = HashingEmbedder::from_model_id(&config.model_id) {
        return Ok(Box::new(hashing));
    }

    #[cfg(feature = "embeddings")]
    {
        Ok(Box::new(FastEmbedProvider::new(config)?))
    }

    #[cfg(not(feature = "embeddings"))]
    {
        Err(EmbeddingError::ModelInit(format!(
            "model '{}' requires the `embeddings` feature",
            config.model_id
        )))
    }
}
