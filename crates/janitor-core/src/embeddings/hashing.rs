//! Feature-hashing embedder
//!
//! A deterministic bag-of-words embedder that needs no model download.
//! Tokens are lowercased alphanumeric runs, hashed with FNV-1a into one of
//! `dims` buckets, and the count vector is L2-normalised. Texts that share
//! words end up close under squared L2; texts with no shared words sit at
//! distance 2.0 (barring bucket collisions).

use super::provider::{l2_normalize, EmbeddingError, EmbeddingProvider};

/// Model identifier prefix, e.g. `hashing-256`
pub const HASHING_MODEL_PREFIX: &str = "hashing-";

/// Default bucket count
pub const DEFAULT_HASHING_DIMENSIONS: usize = 256;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET, |hash, &b| {
        (hash ^ u64::from(b)).wrapping_mul(FNV_PRIME)
    })
}

/// Deterministic bag-of-words embedder
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    model_id: String,
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::new(DEFAULT_HASHING_DIMENSIONS)
    }
}

impl HashingEmbedder {
    /// Create an embedder with `dimensions` buckets (at least 1)
    pub fn new(dimensions: usize) -> Self {
        let dimensions = dimensions.max(1);
        Self {
            dimensions,
            model_id: format!("{HASHING_MODEL_PREFIX}{dimensions}"),
        }
    }

    /// Parse a `hashing-<dims>` identifier (`hashing` alone uses the default size)
    pub fn from_model_id(model_id: &str) -> Option<Self> {
        if model_id == "hashing" {
            return Some(Self::default());
        }
        let dims: usize = model_id.strip_prefix(HASHING_MODEL_PREFIX)?.parse().ok()?;
        (dims > 0).then(|| Self::new(dims))
    }

    fn embed_one(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
        {
            let token = token.to_lowercase();
            let bucket = (fnv1a(token.as_bytes()) % self.dimensions as u64) as usize;
            vector[bucket] += 1.0;
        }
        l2_normalize(&mut vector);
        vector
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|t| self.embed_one(t)).collect())
    }
}
