//! Bundle storage - raw f32 vectors, an id list, and JSON metadata
//!
//! A bundle named `<stem>` is three files:
//! - `<stem>.reps.json`: [`RepsMeta`]
//! - `<stem>.embeddings`: rows of little-endian f32, no header
//! - `<stem>.ids.txt`: one external id per line, in row order

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use memmap2::Mmap;
use tracing::debug;

use crate::index::VectorBatch;

use super::meta::RepsMeta;
use super::Reps;

const META_SUFFIX: &str = ".reps.json";

/// File locations of one bundle
#[derive(Debug, Clone)]
pub struct BundlePaths {
    pub meta: PathBuf,
    pub embeddings: PathBuf,
    pub ids: PathBuf,
}

impl BundlePaths {
    /// Resolve from either the metadata file or the bare stem
    pub fn resolve(path: &Path) -> Self {
        let raw = path.to_string_lossy();
        let stem = raw.strip_suffix(META_SUFFIX).unwrap_or(&raw).to_string();

        Self {
            meta: PathBuf::from(format!("{}{}", stem, META_SUFFIX)),
            embeddings: PathBuf::from(format!("{}.embeddings", stem)),
            ids: PathBuf::from(format!("{}.ids.txt", stem)),
        }
    }
}

/// Load a bundle, memory-mapping its vector file
pub fn load(path: &Path) -> anyhow::Result<Reps> {
    let paths = BundlePaths::resolve(path);

    let meta = RepsMeta::load(&paths.meta)
        .with_context(|| format!("Failed to read bundle metadata {:?}", paths.meta))?;

    let ids: Vec<String> = std::fs::read_to_string(&paths.ids)
        .with_context(|| format!("Failed to read ids {:?}", paths.ids))?
        .lines()
        .map(|s| s.to_string())
        .collect();

    if ids.len() != meta.count {
        anyhow::bail!(
            "Bundle {:?} lists {} ids but metadata declares {} vectors",
            paths.meta,
            ids.len(),
            meta.count
        );
    }

    let file = File::open(&paths.embeddings)
        .with_context(|| format!("Failed to open vectors {:?}", paths.embeddings))?;
    let expected_bytes = meta
        .count
        .checked_mul(meta.dimensions)
        .and_then(|n| n.checked_mul(std::mem::size_of::<f32>()))
        .with_context(|| {
            format!(
                "Bundle {:?} declares {} x {} values, more than can be addressed",
                paths.meta, meta.count, meta.dimensions
            )
        })?;

    let data: Vec<f32> = if expected_bytes == 0 {
        Vec::new()
    } else {
        // Safety: the file is opened read-only and only read through this map
        let mmap = unsafe { Mmap::map(&file)? };
        if mmap.len() != expected_bytes {
            anyhow::bail!(
                "Vector file {:?} has {} bytes, expected {} ({} x {} f32)",
                paths.embeddings,
                mmap.len(),
                expected_bytes,
                meta.count,
                meta.dimensions
            );
        }
        mmap.chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    };

    debug!("Mapped {} vectors from {:?}", meta.count, paths.embeddings);

    let vectors = VectorBatch::new(meta.dimensions, data)?;
    Reps::new(vectors, ids)
}

/// Write a bundle next to `path`
pub fn save(reps: &Reps, path: &Path) -> anyhow::Result<()> {
    if let Some(id) = reps.ids.iter().find(|id| id.contains('\n')) {
        anyhow::bail!("Id {:?} contains a newline and cannot be stored in a bundle", id);
    }

    let paths = BundlePaths::resolve(path);
    if let Some(parent) = paths.meta.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut writer = EmbeddingsWriter::create(&paths.embeddings, reps.dimensions())?;
    for row in reps.vectors.rows() {
        writer.add(row)?;
    }
    let count = writer.finish()?;

    let mut ids = BufWriter::new(File::create(&paths.ids)?);
    for id in &reps.ids {
        ids.write_all(id.as_bytes())?;
        ids.write_all(b"\n")?;
    }
    ids.flush()?;

    RepsMeta::new(reps.dimensions(), count).save(&paths.meta)?;
    Ok(())
}

/// Writer for the raw vector file
pub struct EmbeddingsWriter {
    writer: BufWriter<File>,
    dimensions: usize,
    count: usize,
}

impl EmbeddingsWriter {
    /// Create a new vector file
    pub fn create(path: &Path, dimensions: usize) -> anyhow::Result<Self> {
        let file = File::create(path)?;
        let writer = BufWriter::new(file);

        Ok(Self {
            writer,
            dimensions,
            count: 0,
        })
    }

    /// Add a vector
    pub fn add(&mut self, embedding: &[f32]) -> anyhow::Result<()> {
        if embedding.len() != self.dimensions {
            anyhow::bail!(
                "Embedding dimension mismatch: expected {}, got {}",
                self.dimensions,
                embedding.len()
            );
        }

        for value in embedding {
            self.writer.write_all(&value.to_le_bytes())?;
        }
        self.count += 1;

        Ok(())
    }

    /// Finish writing
    pub fn finish(mut self) -> anyhow::Result<usize> {
        self.writer.flush()?;
        Ok(self.count)
    }

    /// Get current count
    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}
