//! Local Semantic Embeddings
//!
//! Uses fastembed v5 for local ONNX inference. The model is loaded once by
//! [`FastEmbedProvider::new`] and owned by the caller; dropping the provider
//! releases it.
//!
//! ## Models
//!
//! - **Default**: `sentence-transformers/all-MiniLM-L6-v2` (384d)
//! - Any other identifier fastembed lists in `TextEmbedding::list_supported_models()`

use std::path::PathBuf;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};

use super::provider::{EmbeddingError, EmbeddingProvider};
use crate::config::EmbeddingConfig;

/// Get the default cache directory for fastembed models
///
/// Uses the configured path (`FASTEMBED_CACHE_PATH`), or falls back to the
/// platform cache directory.
fn cache_dir(config: &EmbeddingConfig) -> PathBuf {
    if let Some(path) = &config.cache_dir {
        return path.clone();
    }

    // Linux: ~/.cache/janitor/fastembed
    // macOS: ~/Library/Caches/org.so-janitor.janitor/fastembed
    if let Some(proj_dirs) = directories::ProjectDirs::from("org", "so-janitor", "janitor") {
        return proj_dirs.cache_dir().join("fastembed");
    }

    if let Some(base_dirs) = directories::BaseDirs::new() {
        return base_dirs.home_dir().join(".cache/janitor/fastembed");
    }

    PathBuf::from(".fastembed_cache")
}

/// Last path segment, lowercased, without an `-onnx` suffix
fn short_name(model_code: &str) -> String {
    let last = model_code.rsplit('/').next().unwrap_or(model_code);
    let last = last.to_ascii_lowercase();
    last.strip_suffix("-onnx").map(str::to_string).unwrap_or(last)
}

/// Resolve a model identifier to a fastembed model and its dimensionality
fn resolve_model(model_id: &str) -> Result<(EmbeddingModel, usize), EmbeddingError> {
    let supported = TextEmbedding::list_supported_models();

    let exact = supported
        .iter()
        .find(|info| info.model_code.eq_ignore_ascii_case(model_id));
    let by_name = || {
        let wanted = short_name(model_id);
        supported
            .iter()
            .find(|info| short_name(&info.model_code) == wanted)
    };

    exact
        .or_else(by_name)
        .map(|info| (info.model.clone(), info.dim))
        .ok_or_else(|| {
            EmbeddingError::ModelInit(format!(
                "Unknown embedding model '{}'. Supported: {}",
                model_id,
                supported
                    .iter()
                    .map(|info| info.model_code.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            ))
        })
}

/// fastembed-backed embedding provider
pub struct FastEmbedProvider {
    model: Mutex<TextEmbedding>,
    model_id: String,
    dimensions: usize,
}

impl FastEmbedProvider {
    /// Load (downloading if necessary) the configured model
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let (model, dimensions) = resolve_model(&config.model_id)?;

        let cache_dir = cache_dir(config);
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            tracing::warn!("Failed to create cache directory {:?}: {}", cache_dir, e);
        }

        let options = InitOptions::new(model)
            .with_show_download_progress(config.show_download_progress)
            .with_cache_dir(cache_dir);

        let embedding = TextEmbedding::try_new(options).map_err(|e| {
            EmbeddingError::ModelInit(format!(
                "Failed to initialize {}: {}. \
                Ensure ONNX runtime is available and model files can be downloaded.",
                config.model_id, e
            ))
        })?;

        tracing::info!(model = %config.model_id, dimensions, "Embedding model loaded");

        Ok(Self {
            model: Mutex::new(embedding),
            model_id: config.model_id.clone(),
            dimensions,
        })
    }
}

impl EmbeddingProvider for FastEmbedProvider {
    fn model_id(&self) -> &str {
        &self.model_id
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn encode(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let mut model = self
            .model
            .lock()
            .map_err(|e| EmbeddingError::ModelInit(format!("Lock poisoned: {}", e)))?;

        model
            .embed(texts.to_vec(), Some(texts.len()))
            .map_err(|e| EmbeddingError::EmbeddingFailed(e.to_string()))
    }
}
