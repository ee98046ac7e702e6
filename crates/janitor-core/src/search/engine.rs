//! Query Engine
//!
//! Resolves a free-text query to ranked source records:
//! normalize -> embed -> k-NN search -> ordinal to key -> dataset lookup.
//!
//! The engine owns the loaded artifacts and never mutates them; `query`
//! takes `&self`. A record that has disappeared from the dataset since the
//! index was built is reported for its rank instead of failing the query.

use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;

use lru::LruCache;
use serde::Serialize;

use crate::config::{DatasetOptions, SearchOptions};
use crate::dataset::{Dataset, Record, RecordId};
use crate::embeddings::EmbeddingProvider;
use crate::error::{Error, Result};
use crate::identity::{IdentityMap, Provenance};
use crate::search::vector::VectorIndex;
use crate::text;

/// What a ranked hit resolved to
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Lookup {
    /// The record exists in the current dataset
    Found {
        /// The source record
        record: Record,
    },
    /// The identity map names a key the dataset no longer has
    MissingRecord {
        /// Key recorded at build time
        key: RecordId,
    },
    /// The identity map has no entry for the ordinal
    UnmappedOrdinal,
}

impl Lookup {
    /// The record, if found
    pub fn record(&self) -> Option<&Record> {
        match self {
            Lookup::Found { record } => Some(record),
            _ => None,
        }
    }

    /// True unless the record was found
    pub fn is_not_found(&self) -> bool {
        !matches!(self, Lookup::Found { .. })
    }
}

/// One ranked query result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedResult {
    /// 1-based rank
    pub rank: usize,
    /// Ordinal in the vector index
    pub ordinal: usize,
    /// Squared L2 distance to the query (lower is closer)
    pub distance: f32,
    /// Resolved record or the reason it could not be resolved
    #[serde(flatten)]
    pub lookup: Lookup,
}

/// Paths of a persisted artifact pair plus its source dataset
#[derive(Debug, Clone, Copy)]
pub struct ArtifactPaths<'a> {
    /// Vector index file
    pub index: &'a Path,
    /// Identity map file
    pub map: &'a Path,
    /// Source dataset
    pub dataset: &'a Path,
}

/// Read-only query engine over a loaded index, identity map and dataset
pub struct QueryEngine<P: EmbeddingProvider> {
    provider: P,
    index: VectorIndex,
    map: IdentityMap,
    dataset: Dataset,
    /// LRU cache for query embeddings to avoid re-embedding repeated queries
    query_cache: Option<Mutex<LruCache<String, Vec<f32>>>>,
}

impl<P: EmbeddingProvider> QueryEngine<P> {
    /// Assemble an engine from already-loaded parts.
    ///
    /// Fails with `ArtifactMismatch` if the index and identity map disagree
    /// in size.
    pub fn new(provider: P, index: VectorIndex, map: IdentityMap, dataset: Dataset) -> Result<Self> {
        if index.len() != map.len() {
            return Err(Error::ArtifactMismatch(format!(
                "vector index holds {} vectors but identity map has {} keys",
                index.len(),
                map.len()
            )));
        }

        if let Some(provenance) = map.provenance() {
            if provenance.model != provider.model_id() {
                tracing::warn!(
                    built_with = %provenance.model,
                    querying_with = provider.model_id(),
                    "Query model differs from build model; distances may be meaningless"
                );
            }
        }

        Ok(Self {
            provider,
            index,
            map,
            dataset,
            query_cache: None,
        })
    }

    /// Load the artifact pair and dataset from disk
    pub fn open(paths: ArtifactPaths<'_>, provider: P) -> Result<Self> {
        Self::open_with(paths, provider, &DatasetOptions::default(), &SearchOptions::default())
    }

    /// Load with explicit dataset and search options
    pub fn open_with(
        paths: ArtifactPaths<'_>,
        provider: P,
        dataset_options: &DatasetOptions,
        search_options: &SearchOptions,
    ) -> Result<Self> {
        Self::open_with_provider(paths, |_| Ok(provider), dataset_options, search_options)
    }

    /// Load the artifacts, choosing the provider once the build provenance
    /// is known.
    ///
    /// `make_provider` sees the provenance stored in the identity map (if
    /// any) before the index or dataset is read.
    pub fn open_with_provider<F>(
        paths: ArtifactPaths<'_>,
        make_provider: F,
        dataset_options: &DatasetOptions,
        search_options: &SearchOptions,
    ) -> Result<Self>
    where
        F: FnOnce(Option<&Provenance>) -> Result<P>,
    {
        for path in [paths.index, paths.map, paths.dataset] {
            if !path.exists() {
                return Err(Error::InputMissing(path.to_path_buf()));
            }
        }

        let map = IdentityMap::load(paths.map)?;
        let provider = make_provider(map.provenance())?;
        let dimensions = map
            .provenance()
            .map(|p| p.dimensions)
            .unwrap_or_else(|| provider.dimensions());
        let index = VectorIndex::load(paths.index, dimensions)?;
        let dataset = Dataset::load_with(paths.dataset, dataset_options)?;

        tracing::info!(
            vectors = index.len(),
            records = dataset.len(),
            model = provider.model_id(),
            query_cache = search_options.query_cache_size,
            "Query engine ready"
        );

        Ok(Self::new(provider, index, map, dataset)?.with_query_cache(search_options.query_cache_size))
    }

    /// Keep up to `capacity` query embeddings in an LRU cache (0 disables it)
    pub fn with_query_cache(mut self, capacity: usize) -> Self {
        self.query_cache = NonZeroUsize::new(capacity).map(|c| Mutex::new(LruCache::new(c)));
        self
    }

    /// Capacity of the query embedding cache (0 when disabled)
    pub fn query_cache_capacity(&self) -> usize {
        self.query_cache
            .as_ref()
            .and_then(|cache| cache.lock().ok().map(|c| c.cap().get()))
            .unwrap_or(0)
    }

    /// The loaded vector index
    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    /// The loaded identity map
    pub fn identity_map(&self) -> &IdentityMap {
        &self.map
    }

    /// The loaded dataset
    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    /// Rank the `k` records closest to `raw_text`
    pub fn query(&self, raw_text: &str, k: usize) -> Result<Vec<EnrichedResult>> {
        let normalized = text::normalize(raw_text);
        if normalized.is_empty() {
            tracing::warn!("Query is empty after normalization; returning no results");
            return Ok(vec![]);
        }

        let query_vector = self.embed_query(&normalized)?;
        self.query_vector(&query_vector, k)
    }

    /// Rank the `k` records closest to an already-embedded query
    pub fn query_vector(&self, query_vector: &[f32], k: usize) -> Result<Vec<EnrichedResult>> {
        if query_vector.len() != self.index.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.index.dimensions(),
                actual: query_vector.len(),
            });
        }

        let neighbors = self.index.search(query_vector, k)?;

        let results = neighbors
            .into_iter()
            .enumerate()
            .map(|(position, neighbor)| EnrichedResult {
                rank: position + 1,
                ordinal: neighbor.ordinal,
                distance: neighbor.distance,
                lookup: self.lookup(neighbor.ordinal),
            })
            .collect::<Vec<_>>();

        let missing = results.iter().filter(|r| r.lookup.is_not_found()).count();
        if missing > 0 {
            tracing::warn!(
                missing,
                "Some results reference records absent from the dataset"
            );
        }

        Ok(results)
    }

    fn lookup(&self, ordinal: usize) -> Lookup {
        match self.map.resolve(ordinal) {
            Ok(key) => match self.dataset.get(key) {
                Some(record) => Lookup::Found {
                    record: record.clone(),
                },
                None => Lookup::MissingRecord { key },
            },
            Err(_) => Lookup::UnmappedOrdinal,
        }
    }

    fn embed_query(&self, normalized: &str) -> Result<Vec<f32>> {
        if let Some(cache) = &self.query_cache {
            if let Ok(mut cache) = cache.lock() {
                if let Some(vector) = cache.get(normalized) {
                    return Ok(vector.clone());
                }
            }
        }

        let mut vectors = self.provider.encode(&[normalized])?;
        let vector = vectors.pop().ok_or_else(|| {
            Error::CapabilityFailure("embedding provider returned no vector".to_string())
        })?;

        if let Some(cache) = &self.query_cache {
            if let Ok(mut cache) = cache.lock() {
                cache.put(normalized.to_string(), vector.clone());
            }
        }

        Ok(vector)
    }
}

// ============================================================================
// TESTS
// ============================================================================
