//! Query engine - fan-out search over every device and global top-k merge

use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use tracing::debug;

use crate::backend::{rank_order, LocalHits};
use crate::error::{Result, ShardError};

use super::results::SearchResults;
use super::shards::ShardManager;
use super::vectors::VectorView;

/// Answers top-k queries over a loaded [`ShardManager`] as if it were one
/// unsharded index.
///
/// Holding the engine borrows the manager, so no vectors can be added while
/// queries run.
pub struct QueryEngine<'a> {
    shards: &'a ShardManager,
    show_progress: bool,
}

impl<'a> QueryEngine<'a> {
    pub fn new(shards: &'a ShardManager) -> Self {
        Self {
            shards,
            show_progress: false,
        }
    }

    /// Show a progress bar while batch searching
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Global top-`k` for every query row.
    ///
    /// Each non-empty device answers with its local top-`min(k, occupancy)`;
    /// local indices are shifted by the device's prefix-sum offset and the
    /// candidates re-ranked by descending score (ties by ascending global
    /// index). Rows are padded with sentinels when the whole collection holds
    /// fewer than `k` vectors with a numeric score; NaN scores are dropped.
    pub fn search<'q>(&self, queries: impl Into<VectorView<'q>>, k: usize) -> Result<SearchResults> {
        let queries = queries.into();
        self.check(&queries, k)?;

        let occupancy = self.shards.device_occupancy();
        let offsets = self.shards.device_offsets();

        let partials: Vec<(usize, LocalHits)> = self
            .shards
            .devices()
            .par_iter()
            .enumerate()
            .filter(|(device, _)| occupancy[*device] > 0)
            .map(|(device, index)| {
                let local_k = k.min(occupancy[device]);
                index
                    .search(queries, local_k)
                    .map(|hits| (offsets[device], hits))
                    .map_err(|e| ShardError::Backend {
                        device,
                        message: e.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(
            "Merging {} queries from {} devices (k={})",
            queries.len(),
            partials.len(),
            k
        );

        let mut results = SearchResults::with_capacity(k, queries.len());
        let mut candidates: Vec<(f32, i64)> = Vec::new();

        for query in 0..queries.len() {
            candidates.clear();
            for (offset, hits) in &partials {
                // A NaN score is never a match
                candidates.extend(
                    hits.row(query)
                        .filter(|(score, _)| !score.is_nan())
                        .map(|(score, local)| (score, (*offset as u64 + local) as i64)),
                );
            }

            candidates.sort_unstable_by(rank_order);
            candidates.truncate(k);
            results.push_row(&candidates);
        }

        Ok(results)
    }

    /// Search in slices of at most `batch_size` queries and concatenate.
    ///
    /// Rankings are identical to a single [`search`](Self::search) call;
    /// batching only bounds peak memory.
    pub fn batch_search<'q>(
        &self,
        queries: impl Into<VectorView<'q>>,
        k: usize,
        batch_size: usize,
    ) -> Result<SearchResults> {
        let queries = queries.into();
        if batch_size == 0 {
            return Err(ShardError::InvalidArgument(
                "batch_size must be positive".to_string(),
            ));
        }
        self.check(&queries, k)?;

        let num_queries = queries.len();
        let progress = if self.show_progress {
            let bar = ProgressBar::new(num_queries as u64);
            bar.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} queries ({eta})")
                    .unwrap_or_else(|_| ProgressStyle::default_bar())
                    .progress_chars("#>-"),
            );
            bar
        } else {
            ProgressBar::hidden()
        };

        let mut results = SearchResults::with_capacity(k, num_queries);
        let mut start = 0;

        while start < num_queries {
            let end = (start + batch_size).min(num_queries);
            results.append(self.search(queries.slice(start..end), k)?);
            progress.inc((end - start) as u64);
            start = end;
        }

        progress.finish_and_clear();
        Ok(results)
    }

    fn check(&self, queries: &VectorView<'_>, k: usize) -> Result<()> {
        if queries.dimensions() != self.shards.dimensions() {
            return Err(ShardError::DimensionMismatch {
                expected: self.shards.dimensions(),
                got: queries.dimensions(),
            });
        }
        if k == 0 {
            return Err(ShardError::InvalidArgument("k must be positive".to_string()));
        }
        if self.shards.is_empty() {
            return Err(ShardError::EmptyIndex);
        }
        Ok(())
    }

    pub fn shards(&self) -> &ShardManager {
        self.shards
    }
}
