//! Batched embedding generation

use super::provider::{EmbeddingError, EmbeddingProvider};

/// Splits texts into consecutive batches and embeds them through a provider.
///
/// Batching only affects throughput: the output is the concatenation of the
/// per-batch results in input order, one vector per text.
pub struct EmbeddingGenerator<'a, P: EmbeddingProvider + ?Sized> {
    provider: &'a P,
    batch_size: usize,
}

impl<'a, P: EmbeddingProvider + ?Sized> EmbeddingGenerator<'a, P> {
    /// Create a generator; `batch_size` must be at least 1
    pub fn new(provider: &'a P, batch_size: usize) -> Result<Self, EmbeddingError> {
        if batch_size == 0 {
            return Err(EmbeddingError::InvalidInput(
                "batch size must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            provider,
            batch_size,
        })
    }

    /// Texts per provider call
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Embed all texts. Any batch failure aborts the whole run.
    pub fn generate<S: AsRef<str>>(&self, texts: &[S]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let expected_dims = self.provider.dimensions();
        let total_batches = texts.len().div_ceil(self.batch_size);
        let mut vectors = Vec::with_capacity(texts.len());

        for (batch_index, chunk) in texts.chunks(self.batch_size).enumerate() {
            let batch: Vec<&str> = chunk.iter().map(AsRef::as_ref).collect();
            let embedded = self.provider.encode(&batch)?;

            if embedded.len() != batch.len() {
                return Err(EmbeddingError::CountMismatch {
                    expected: batch.len(),
                    actual: embedded.len(),
                });
            }

            for vector in embedded {
                if vector.len() != expected_dims {
                    return Err(EmbeddingError::DimensionMismatch {
                        position: vectors.len(),
                        expected: expected_dims,
                        actual: vector.len(),
                    });
                }
                vectors.push(vector);
            }

            tracing::debug!(
                batch = batch_index + 1,
                total_batches,
                embedded = vectors.len(),
                "Embedded batch"
            );
        }

        tracing::info!(
            model = self.provider.model_id(),
            texts = texts.len(),
            batches = total_batches,
            "Embedding complete"
        );
        Ok(vectors)
    }
}
