//! Backend traits for device-local exact search

use crate::error::Result;
use crate::index::VectorView;

/// Per-device search output: `k` (score, local index) pairs per query,
/// row-major, each row sorted by descending score.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalHits {
    pub k: usize,
    pub scores: Vec<f32>,
    pub indices: Vec<u64>,
}

impl LocalHits {
    /// Assemble from per-query ranked rows, each exactly `k` long
    pub fn from_rows(k: usize, rows: Vec<Vec<(f32, u64)>>) -> Self {
        let mut scores = Vec::with_capacity(rows.len() * k);
        let mut indices = Vec::with_capacity(rows.len() * k);
        for row in rows {
            debug_assert_eq!(row.len(), k);
            for (score, idx) in row {
                scores.push(score);
                indices.push(idx);
            }
        }
        Self { k, scores, indices }
    }

    /// Number of queries covered
    pub fn num_queries(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.scores.len() / self.k
        }
    }

    /// Ranked pairs for one query
    pub fn row(&self, query: usize) -> impl Iterator<Item = (f32, u64)> + '_ {
        let start = query * self.k;
        let end = start + self.k;
        self.scores[start..end]
            .iter()
            .copied()
            .zip(self.indices[start..end].iter().copied())
    }
}

/// A single append-only exact inner-product index living on one device.
///
/// Capacity is not enforced here; the shard manager owns that limit.
pub trait LocalIndex: Send + Sync {
    /// Append vectors; local indices continue from the current length
    fn add(&mut self, vectors: VectorView<'_>) -> Result<()>;

    /// Top-`k` local matches for every query row.
    ///
    /// `k` must be at most `len()`.
    fn search(&self, queries: VectorView<'_>, k: usize) -> Result<LocalHits>;

    /// Vector width accepted by this index
    fn dimensions(&self) -> usize;

    /// Get the number of vectors in the index
    fn len(&self) -> usize;

    /// Check if the index is empty
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
