//! Ranked search results in the global index space

/// Score carried by slots that have no matching vector
pub const SENTINEL_SCORE: f32 = f32::NEG_INFINITY;

/// Global index carried by slots that have no matching vector
pub const SENTINEL_INDEX: i64 = -1;

/// Top-k results for a batch of queries.
///
/// Always exactly `k` columns per query, row-major. When the collection
/// holds fewer than `k` vectors the trailing slots of every row are
/// `(SENTINEL_SCORE, SENTINEL_INDEX)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    k: usize,
    scores: Vec<f32>,
    indices: Vec<i64>,
}

impl SearchResults {
    pub(crate) fn with_capacity(k: usize, num_queries: usize) -> Self {
        Self {
            k,
            scores: Vec::with_capacity(k * num_queries),
            indices: Vec::with_capacity(k * num_queries),
        }
    }

    /// Push one ranked row, padding with sentinels up to `k`
    pub(crate) fn push_row(&mut self, ranked: &[(f32, i64)]) {
        debug_assert!(ranked.len() <= self.k);
        for &(score, idx) in ranked {
            self.scores.push(score);
            self.indices.push(idx);
        }
        for _ in ranked.len()..self.k {
            self.scores.push(SENTINEL_SCORE);
            self.indices.push(SENTINEL_INDEX);
        }
    }

    /// Append the rows of a later query batch
    pub(crate) fn append(&mut self, mut other: SearchResults) {
        debug_assert_eq!(self.k, other.k);
        self.scores.append(&mut other.scores);
        self.indices.append(&mut other.indices);
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn num_queries(&self) -> usize {
        if self.k == 0 {
            0
        } else {
            self.scores.len() / self.k
        }
    }

    /// All scores, row-major `(num_queries, k)`
    pub fn scores(&self) -> &[f32] {
        &self.scores
    }

    /// All global indices, row-major `(num_queries, k)`
    pub fn indices(&self) -> &[i64] {
        &self.indices
    }

    pub fn scores_row(&self, query: usize) -> &[f32] {
        &self.scores[query * self.k..(query + 1) * self.k]
    }

    pub fn indices_row(&self, query: usize) -> &[i64] {
        &self.indices[query * self.k..(query + 1) * self.k]
    }

    /// Real matches for one query, sentinels skipped
    pub fn hits(&self, query: usize) -> impl Iterator<Item = (f32, usize)> + '_ {
        self.scores_row(query)
            .iter()
            .zip(self.indices_row(query))
            .filter(|(_, idx)| **idx != SENTINEL_INDEX)
            .map(|(&score, &idx)| (score, idx as usize))
    }

    pub fn rows(&self) -> impl Iterator<Item = (&[f32], &[i64])> {
        self.scores
            .chunks_exact(self.k.max(1))
            .zip(self.indices.chunks_exact(self.k.max(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_row_pads_with_sentinel() {
        let mut results = SearchResults::with_capacity(3, 1);
        results.push_row(&[(0.9, 4)]);

        assert_eq!(results.num_queries(), 1);
        assert_eq!(results.indices_row(0), &[4, SENTINEL_INDEX, SENTINEL_INDEX]);
        assert_eq!(results.scores_row(0)[1], f32::NEG_INFINITY);
        assert_eq!(results.hits(0).collect::<Vec<_>>(), vec![(0.9, 4)]);
    }

    #[test]
    fn test_append_keeps_row_order() {
        let mut a = SearchResults::with_capacity(1, 2);
        a.push_row(&[(1.0, 0)]);
        let mut b = SearchResults::with_capacity(1, 1);
        b.push_row(&[(2.0, 1)]);
        a.append(b);

        assert_eq!(a.num_queries(), 2);
        assert_eq!(a.indices(), &[0, 1]);
        assert_eq!(a.rows().count(), 2);
    }
}
