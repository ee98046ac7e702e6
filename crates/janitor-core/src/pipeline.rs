//! Build Pipeline
//!
//! One traversal of the dataset yields both the record keys and the texts to
//! embed, so ordinal `i` in the vector index and ordinal `i` in the identity
//! map always name the same record. Nothing touches the output paths until
//! both artifacts have been fully written to temporary files, and the pair
//! is then swapped in together: if either rename fails, both destinations
//! are rolled back to their previous contents.

use std::path::{Path, PathBuf};

use crate::config::BuildOptions;
use crate::dataset::{Dataset, RecordId};
use crate::embeddings::{EmbeddingGenerator, EmbeddingProvider};
use crate::error::{Error, Result};
use crate::identity::{IdentityMap, Provenance};
use crate::search::VectorIndex;
use crate::text;

// ============================================================================
// PREPARED CORPUS
// ============================================================================

/// Keys and normalized texts, in dataset order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PreparedCorpus {
    /// Record keys, position `i` becomes ordinal `i`
    pub keys: Vec<RecordId>,
    /// Normalized text for each key
    pub texts: Vec<String>,
}

impl PreparedCorpus {
    /// Walk the dataset once, joining the named fields of each record.
    ///
    /// Fails with `InvalidInput` if no fields are named or a record lacks one.
    pub fn from_dataset(dataset: &Dataset, text_fields: &[String]) -> Result<Self> {
        if text_fields.is_empty() {
            return Err(Error::InvalidInput(
                "at least one text field is required".to_string(),
            ));
        }

        let mut corpus = Self {
            keys: Vec::with_capacity(dataset.len()),
            texts: Vec::with_capacity(dataset.len()),
        };

        for record in dataset.records() {
            let mut parts = Vec::with_capacity(text_fields.len());
            for field in text_fields {
                let part = record.field_text(field).ok_or_else(|| {
                    Error::InvalidInput(format!("record {} has no field '{}'", record.id, field))
                })?;
                parts.push(part);
            }
            corpus.keys.push(record.id);
            corpus.texts.push(text::compose(parts));
        }

        Ok(corpus)
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Check if there are no records
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Embed every text in batches of `batch_size`
    pub fn embed<P: EmbeddingProvider + ?Sized>(
        &self,
        provider: &P,
        batch_size: usize,
    ) -> Result<Vec<Vec<f32>>> {
        let generator = EmbeddingGenerator::new(provider, batch_size)?;
        Ok(generator.generate(&self.texts)?)
    }
}

// ============================================================================
// BUILT ARTIFACTS
// ============================================================================

/// A vector index and the identity map that belongs to it
pub struct BuiltArtifacts {
    /// Vectors keyed by ordinal
    pub index: VectorIndex,
    /// Ordinal -> record key
    pub map: IdentityMap,
}

impl BuiltArtifacts {
    /// Pair embeddings with their keys
    pub fn assemble(keys: Vec<RecordId>, embeddings: &[Vec<f32>], provenance: Provenance) -> Result<Self> {
        if keys.len() != embeddings.len() {
            return Err(Error::CapabilityFailure(format!(
                "{} embeddings for {} records",
                embeddings.len(),
                keys.len()
            )));
        }

        let index = VectorIndex::build(provenance.dimensions, embeddings)?;
        let map = IdentityMap::build(keys).with_provenance(provenance);
        Ok(Self { index, map })
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if nothing was indexed
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Write both artifacts to temporaries, then swap them into place.
    ///
    /// On any failure the temporaries are removed and existing files at the
    /// destination paths are left as they were.
    pub fn commit(&self, index_path: &Path, map_path: &Path) -> Result<()> {
        if index_path == map_path {
            return Err(Error::InvalidInput(
                "index and identity map paths must differ".to_string(),
            ));
        }

        for path in [index_path, map_path] {
            if path.is_dir() {
                return Err(Error::InvalidInput(format!(
                    "output path {} is a directory",
                    path.display()
                )));
            }
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
        }

        let tmp_index = sibling(index_path, "tmp");
        let tmp_map = sibling(map_path, "tmp");

        let written = self
            .index
            .persist(&tmp_index)
            .map_err(Error::from)
            .and_then(|()| self.map.persist(&tmp_map).map_err(Error::from))
            .and_then(|()| {
                swap_into_place(&[
                    (tmp_index.as_path(), index_path),
                    (tmp_map.as_path(), map_path),
                ])
                .map_err(Error::from)
            });

        if let Err(e) = written {
            remove_quietly(&tmp_index);
            remove_quietly(&tmp_map);
            return Err(e);
        }

        tracing::info!(
            index = %index_path.display(),
            map = %map_path.display(),
            vectors = self.len(),
            "Artifacts committed"
        );
        Ok(())
    }
}

/// Build both artifacts from a dataset in a single pass
pub fn build_artifacts<P: EmbeddingProvider + ?Sized>(
    dataset: &Dataset,
    provider: &P,
    options: &BuildOptions,
) -> Result<BuiltArtifacts> {
    let corpus = PreparedCorpus::from_dataset(dataset, &options.text_fields)?;
    tracing::info!(
        records = corpus.len(),
        batch_size = options.batch_size,
        model = provider.model_id(),
        "Embedding corpus"
    );

    let embeddings = corpus.embed(provider, options.batch_size)?;
    let provenance = Provenance::now(provider.model_id(), provider.dimensions());
    BuiltArtifacts::assemble(corpus.keys, &embeddings, provenance)
}

/// Rename each `(staged, dest)` pair into place as one unit.
///
/// Existing destinations are set aside as backups first. If any rename fails,
/// files already placed are removed and every backup is restored.
fn swap_into_place<'a>(pairs: &[(&'a Path, &'a Path)]) -> std::io::Result<()> {
    let mut backups: Vec<(PathBuf, &'a Path)> = Vec::with_capacity(pairs.len());
    for &(_, dest) in pairs {
        if std::fs::symlink_metadata(dest).is_err() {
            continue;
        }
        let backup = sibling(dest, "bak");
        if let Err(e) = std::fs::rename(dest, &backup) {
            roll_back(&[], &backups);
            return Err(e);
        }
        backups.push((backup, dest));
    }

    let mut placed: Vec<&Path> = Vec::with_capacity(pairs.len());
    for &(staged, dest) in pairs {
        if let Err(e) = std::fs::rename(staged, dest) {
            tracing::warn!("Failed to move {:?} into place: {}", dest, e);
            roll_back(&placed, &backups);
            return Err(e);
        }
        placed.push(dest);
    }

    for (backup, _) in &backups {
        remove_quietly(backup);
    }
    Ok(())
}

fn roll_back(placed: &[&Path], backups: &[(PathBuf, &Path)]) {
    for dest in placed {
        remove_quietly(dest);
    }
    for (backup, dest) in backups {
        if let Err(e) = std::fs::rename(backup, dest) {
            tracing::error!("Failed to restore {:?} from {:?}: {}", dest, backup, e);
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "artifact".to_string());
    path.with_file_name(format!(".{}.{}.{}", name, std::process::id(), suffix))
}

fn remove_quietly(path: &Path) {
    if let Err(e) = std::fs::remove_file(path) {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove {:?}: {}", path, e);
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
