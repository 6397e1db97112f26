//! Flat backend - exhaustive inner-product scan on the calling thread

use std::cmp::Ordering;

use crate::error::{Result, ShardError};
use crate::index::VectorView;

use super::traits::{LocalHits, LocalIndex};

/// Exact, row-major flat index
pub struct FlatIndex {
    dimensions: usize,
    data: Vec<f32>, // concatenated rows of length `dimensions`
}

impl FlatIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            data: Vec::new(),
        }
    }

    pub(crate) fn check_query(&self, queries: &VectorView<'_>, k: usize) -> Result<()> {
        if queries.dimensions() != self.dimensions {
            return Err(ShardError::DimensionMismatch {
                expected: self.dimensions,
                got: queries.dimensions(),
            });
        }
        if k > self.len() {
            return Err(ShardError::InvalidArgument(format!(
                "k={} exceeds the {} vectors held by this device",
                k,
                self.len()
            )));
        }
        Ok(())
    }

    /// Ranked top-k for a single query
    pub(crate) fn scan(&self, query: &[f32], k: usize) -> Vec<(f32, u64)> {
        top_k_scan(query, &self.data, self.dimensions, k)
    }
}

impl LocalIndex for FlatIndex {
    fn add(&mut self, vectors: VectorView<'_>) -> Result<()> {
        if vectors.dimensions() != self.dimensions {
            return Err(ShardError::DimensionMismatch {
                expected: self.dimensions,
                got: vectors.dimensions(),
            });
        }
        self.data.extend_from_slice(vectors.as_slice());
        Ok(())
    }

    fn search(&self, queries: VectorView<'_>, k: usize) -> Result<LocalHits> {
        self.check_query(&queries, k)?;

        let rows = queries.rows().map(|q| self.scan(q, k)).collect();
        Ok(LocalHits::from_rows(k, rows))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn len(&self) -> usize {
        self.data.len() / self.dimensions.max(1)
    }
}

/// Compute dot product (inner product) between two vectors
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Descending score, then ascending index.
///
/// A total order, so equal scores always rank the same way regardless of
/// how the candidates were gathered. NaN scores rank below every number and
/// `-0.0` ties with `0.0`.
pub fn rank_order<I: Ord>(a: &(f32, I), b: &(f32, I)) -> Ordering {
    a.0.is_nan()
        .cmp(&b.0.is_nan())
        .then_with(|| (b.0 + 0.0).total_cmp(&(a.0 + 0.0)))
        .then_with(|| a.1.cmp(&b.1))
}

/// Score every row against `query` and keep the best `k`, ranked
pub fn top_k_scan(query: &[f32], data: &[f32], dimensions: usize, k: usize) -> Vec<(f32, u64)> {
    if k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<(f32, u64)> = data
        .chunks_exact(dimensions)
        .enumerate()
        .map(|(i, row)| (dot_product(query, row), i as u64))
        .collect();

    if k < scored.len() {
        scored.select_nth_unstable_by(k - 1, rank_order);
        scored.truncate(k);
    }
    scored.sort_unstable_by(rank_order);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VectorBatch;

    fn make_index() -> FlatIndex {
        let mut idx = FlatIndex::new(3);
        let batch = VectorBatch::from_rows(&[
            vec![1.0, 0.0, 0.0],
            vec![0.0, 1.0, 0.0],
            vec![1.0, 0.1, 0.0],
            vec![0.0, 0.0, 1.0],
        ])
        .unwrap();
        idx.add(batch.view()).unwrap();
        idx
    }

    #[test]
    fn test_dot_product_known_value() {
        assert_eq!(dot_product(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]), 32.0);
    }

    #[test]
    fn test_rank_order_breaks_ties_by_index() {
        let mut pairs = vec![(0.5, 3u64), (0.9, 7), (0.5, 1)];
        pairs.sort_by(rank_order);
        assert_eq!(pairs, vec![(0.9, 7), (0.5, 1), (0.5, 3)]);
    }

    #[test]
    fn test_search_ranks_by_inner_product() {
        let idx = make_index();
        let q = VectorBatch::from_rows(&[vec![1.0, 0.0, 0.0]]).unwrap();
        let hits = idx.search(q.view(), 2).unwrap();

        assert_eq!(hits.num_queries(), 1);
        let row: Vec<_> = hits.row(0).collect();
        // rows 0 and 2 tie at 1.0, lower index first
        assert_eq!(row, vec![(1.0, 0), (1.0, 2)]);
    }

    #[test]
    fn test_search_rejects_k_above_len() {
        let idx = make_index();
        let q = VectorBatch::from_rows(&[vec![1.0, 0.0, 0.0]]).unwrap();
        assert!(matches!(
            idx.search(q.view(), 5),
            Err(ShardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut idx = FlatIndex::new(3);
        let wrong = VectorBatch::from_rows(&[vec![1.0, 0.0]]).unwrap();
        assert!(matches!(
            idx.add(wrong.view()),
            Err(ShardError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn test_rank_order_puts_nan_last() {
        let mut pairs = vec![(f32::NAN, 0u64), (1.0, 2), (f32::NEG_INFINITY, 3), (0.5, 1)];
        pairs.sort_by(rank_order);
        let order: Vec<u64> = pairs.iter().map(|p| p.1).collect();
        assert_eq!(order, vec![2, 1, 3, 0]);
    }

    #[test]
    fn test_rank_order_signed_zeros_tie() {
        let mut pairs = vec![(0.0f32, 1u64), (-0.0, 0)];
        pairs.sort_by(rank_order);
        assert_eq!(pairs[0].1, 0);

        // passages [-1] and [1] both score zero against [0]
        let ranked = top_k_scan(&[0.0], &[-1.0, 1.0], 1, 2);
        let order: Vec<u64> = ranked.iter().map(|p| p.1).collect();
        assert_eq!(order, vec![0, 1]);
    }

    #[test]
    fn test_top_k_scan_skips_nan_rows_when_possible() {
        let data = [f32::NAN, 0.0, 1.0, 0.0, 0.5, 0.5];
        let ranked = top_k_scan(&[1.0, 0.0], &data, 2, 2);
        let order: Vec<u64> = ranked.iter().map(|p| p.1).collect();
        assert_eq!(order, vec![1, 2]);
    }

    #[test]
    fn test_top_k_scan_full_sort() {
        let data = [3.0, 1.0, 2.0];
        let ranked = top_k_scan(&[1.0], &data, 1, 3);
        assert_eq!(ranked, vec![(3.0, 0), (2.0, 2), (1.0, 1)]);
    }
}
