//! Reps module - vector+id interchange files produced by the encoders
//!
//! Two on-disk forms carry the same `(vectors, ids)` pair: a bundle (raw f32
//! rows, an id list, JSON metadata) and JSON Lines. Ids are opaque and copied
//! through unchanged.

mod bundle;
mod jsonl;
mod meta;

pub use bundle::{BundlePaths, EmbeddingsWriter};
pub use meta::RepsMeta;

use std::path::Path;

use tracing::info;

use crate::index::VectorBatch;

/// On-disk representation of a reps file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepsFormat {
    Bundle,
    JsonLines,
}

impl RepsFormat {
    /// Pick the format from the file name: `*.jsonl` is JSON Lines, anything
    /// else a bundle
    pub fn detect(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("jsonl") => RepsFormat::JsonLines,
            _ => RepsFormat::Bundle,
        }
    }
}

/// Vectors paired with their external ids, in insertion order
#[derive(Debug, Clone)]
pub struct Reps {
    pub vectors: VectorBatch,
    pub ids: Vec<String>,
}

impl Reps {
    pub fn new(vectors: VectorBatch, ids: Vec<String>) -> anyhow::Result<Self> {
        if vectors.len() != ids.len() {
            anyhow::bail!(
                "{} vectors but {} ids; the lookup must have one id per vector",
                vectors.len(),
                ids.len()
            );
        }
        Ok(Self { vectors, ids })
    }

    /// Load from either format
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let reps = match RepsFormat::detect(path) {
            RepsFormat::Bundle => bundle::load(path)?,
            RepsFormat::JsonLines => jsonl::load(path)?,
        };
        info!("Loaded {} vectors from {}", reps.len(), path.display());
        Ok(reps)
    }

    /// Save in the format implied by `path`
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        match RepsFormat::detect(path) {
            RepsFormat::Bundle => bundle::save(self, path),
            RepsFormat::JsonLines => jsonl::save(self, path),
        }
    }

    pub fn dimensions(&self) -> usize {
        self.vectors.dimensions()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
