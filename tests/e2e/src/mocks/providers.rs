//! Embedding providers with scripted failures

use std::sync::atomic::{AtomicUsize, Ordering};

use janitor_core::{EmbeddingError, EmbeddingProvider, HashingEmbedder};

/// Delegates to a [`HashingEmbedder`] until `fail_on_call`, then errors
///
/// Calls are counted from 1, so `fail_on_call = 1` fails the first batch.
pub struct FailingProvider {
    inner: HashingEmbedder,
    fail_on_call: usize,
    calls: AtomicUsize,
}

impl FailingProvider {
    /// Fail on the `fail_on_call`-th encode call
    pub fn new(dimensions: usize, fail_on_call: usize) -> Self {
        Self {
            inner: HashingEmbedder::new(dimensions),
            fail_on_call,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of encode calls seen so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl EmbeddingProvider for FailingProvider {
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call >= self.fail_on_call {
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "backend unavailable on call {}",
                call
            )));
        }
        self.inner.encode(texts)
    }
}
