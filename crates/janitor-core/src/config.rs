//! Configuration
//!
//! Defaults, overridable through environment variables. Command-line flags
//! take precedence over both and are applied by the binary.
//!
//! | Variable | Effect |
//! |----------|--------|
//! | `JANITOR_MODEL` | embedding model identifier |
//! | `JANITOR_BATCH_SIZE` | texts per embedding call |
//! | `JANITOR_DATASET_TABLE` | SQLite table holding the records |
//! | `JANITOR_QUERY_CACHE` | number of query embeddings kept in memory |
//! | `FASTEMBED_CACHE_PATH` | model download cache directory |

use std::path::PathBuf;
use std::str::FromStr;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default embedding model
pub const DEFAULT_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";

/// Default number of texts per embedding call
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Record fields concatenated into the embedded text by default
pub const DEFAULT_TEXT_FIELDS: [&str; 2] = ["title", "body"];

/// Default number of results per query
pub const DEFAULT_TOP_K: usize = 5;

/// Default SQLite table for record datasets
pub const DEFAULT_DATASET_TABLE: &str = "questions";

/// Default number of cached query embeddings
pub const DEFAULT_QUERY_CACHE_SIZE: usize = 128;

/// Default upper bound on the embedding phase of a build, in seconds
pub const DEFAULT_BUILD_TIMEOUT_SECS: u64 = 3600;

/// Read and parse an environment variable, ignoring (with a warning) bad values
fn env_var<T: FromStr>(name: &str) -> Option<T> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Ignoring {}={:?}: not a valid value", name, raw);
            None
        }
    }
}

// ============================================================================
// EMBEDDING
// ============================================================================

/// Embedding model selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddingConfig {
    /// Model identifier, e.g. `sentence-transformers/all-MiniLM-L6-v2` or `hashing-256`
    pub model_id: String,
    /// Model download cache (platform cache dir when `None`)
    pub cache_dir: Option<PathBuf>,
    /// Show a progress bar while downloading model files
    pub show_download_progress: bool,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model_id: DEFAULT_MODEL.to_string(),
            cache_dir: None,
            show_download_progress: true,
        }
    }
}

impl EmbeddingConfig {
    /// Defaults with `JANITOR_MODEL` and `FASTEMBED_CACHE_PATH` applied
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(model) = env_var::<String>("JANITOR_MODEL").filter(|m| !m.is_empty()) {
            config.model_id = model;
        }
        if let Some(path) = env_var::<PathBuf>("FASTEMBED_CACHE_PATH") {
            config.cache_dir = Some(path);
        }
        config
    }

    /// Replace the model identifier
    pub fn with_model(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }
}

// ============================================================================
// BUILD
// ============================================================================

/// Options for a build pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Record fields joined (in order) into each embedded text
    pub text_fields: Vec<String>,
    /// Texts per embedding call
    pub batch_size: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            text_fields: DEFAULT_TEXT_FIELDS.iter().map(|f| f.to_string()).collect(),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl BuildOptions {
    /// Defaults with `JANITOR_BATCH_SIZE` applied
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(batch) = env_var("JANITOR_BATCH_SIZE") {
            options.batch_size = batch;
        }
        options
    }
}

// ============================================================================
// DATASET / SEARCH
// ============================================================================

/// Options for reading the source dataset
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetOptions {
    /// Table read from SQLite datasets
    pub table: String,
}

impl Default for DatasetOptions {
    fn default() -> Self {
        Self {
            table: DEFAULT_DATASET_TABLE.to_string(),
        }
    }
}

impl DatasetOptions {
    /// Defaults with `JANITOR_DATASET_TABLE` applied
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(table) = env_var::<String>("JANITOR_DATASET_TABLE").filter(|t| !t.is_empty()) {
            options.table = table;
        }
        options
    }
}

/// Options for the query engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchOptions {
    /// Query embeddings kept in the LRU cache (0 disables caching)
    pub query_cache_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            query_cache_size: DEFAULT_QUERY_CACHE_SIZE,
        }
    }
}

impl SearchOptions {
    /// Defaults with `JANITOR_QUERY_CACHE` applied
    pub fn from_env() -> Self {
        let mut options = Self::default();
        if let Some(size) = env_var("JANITOR_QUERY_CACHE") {
            options.query_cache_size = size;
        }
        options
    }
}
