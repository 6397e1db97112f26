//! Parallel flat backend - flat scan with queries spread over the rayon pool
//!
//! Produces exactly the same rankings as the flat backend; only the
//! scheduling of per-query scans differs.

use rayon::prelude::*;

use crate::error::Result;
use crate::index::VectorView;

use super::flat::FlatIndex;
use super::traits::{LocalHits, LocalIndex};

pub struct ParallelFlatIndex {
    inner: FlatIndex,
}

impl ParallelFlatIndex {
    pub fn new(dimensions: usize) -> Self {
        Self {
            inner: FlatIndex::new(dimensions),
        }
    }
}

impl LocalIndex for ParallelFlatIndex {
    fn add(&mut self, vectors: VectorView<'_>) -> Result<()> {
        self.inner.add(vectors)
    }

    fn search(&self, queries: VectorView<'_>, k: usize) -> Result<LocalHits> {
        self.inner.check_query(&queries, k)?;

        let rows = queries
            .as_slice()
            .par_chunks_exact(queries.dimensions())
            .map(|q| self.inner.scan(q, k))
            .collect();
        Ok(LocalHits::from_rows(k, rows))
    }

    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::VectorBatch;

    #[test]
    fn test_matches_flat_backend() {
        let rows: Vec<Vec<f32>> = (0..50)
            .map(|i| vec![(i as f32).sin(), (i as f32 * 0.3).cos(), (i % 7) as f32 * 0.1])
            .collect();
        let data = VectorBatch::from_rows(&rows).unwrap();
        let queries = VectorBatch::from_rows(&rows[..10]).unwrap();

        let mut flat = FlatIndex::new(3);
        let mut parallel = ParallelFlatIndex::new(3);
        flat.add(data.view()).unwrap();
        parallel.add(data.view()).unwrap();

        let a = flat.search(queries.view(), 5).unwrap();
        let b = parallel.search(queries.view(), 5).unwrap();
        assert_eq!(a, b);
    }
}
