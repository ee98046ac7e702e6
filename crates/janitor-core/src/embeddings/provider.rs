//! Embedding capability interface

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Embedding error types
#[non_exhaustive]
#[derive(Debug, Clone, thiserror::Error)]
pub enum EmbeddingError {
    /// Failed to initialize the embedding model
    #[error("Model initialization failed: {0}")]
    ModelInit(String),
    /// Failed to generate embedding
    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),
    /// Invalid input or configuration
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// The capability returned a different number of vectors than texts
    #[error("Batch returned {actual} vectors for {expected} texts")]
    CountMismatch {
        /// Texts sent
        expected: usize,
        /// Vectors received
        actual: usize,
    },
    /// The capability returned a vector of unexpected length
    #[error("Vector {position} has {actual} dimensions, expected {expected}")]
    DimensionMismatch {
        /// Position of the offending text in the input
        position: usize,
        /// Dimensionality reported by the provider
        expected: usize,
        /// Dimensionality received
        actual: usize,
    },
}

// ============================================================================
// PROVIDER TRAIT
// ============================================================================

/// Text -> fixed-dimension vector capability.
///
/// `encode` returns one vector per input text, in input order. For a fixed
/// `model_id` the output must be deterministic and each vector must depend
/// only on its own text, so callers are free to batch however they like.
pub trait EmbeddingProvider: Send + Sync {
    /// Identifier of the model, recorded in built artifacts
    fn model_id(&self) -> &str;

    /// Dimensionality of every vector this provider returns
    fn dimensions(&self) -> usize;

    /// Embed a batch of texts
    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<P> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).encode(texts)
    }
}

impl<P: EmbeddingProvider + ?Sized> EmbeddingProvider for &P {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        (**self).encode(texts)
    }
}

// ============================================================================
// DISTANCE
// ============================================================================

/// Squared Euclidean distance, the metric used by the vector index
#[inline]
pub fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::MAX;
    }

    a.iter().zip(b.iter()).map(|(x, y)| (x - y).powi(2)).sum()
}

/// Scale a vector to unit length in place (zero vectors are left alone)
#[inline]
pub fn l2_normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}
