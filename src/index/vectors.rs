//! Dense vector batches - row-major `(n, dimensions)` f32 matrices

use std::ops::Range;

use crate::error::{Result, ShardError};

/// Owned batch of fixed-width vectors stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct VectorBatch {
    data: Vec<f32>,
    dimensions: usize,
}

/// Borrowed view over a contiguous run of rows
#[derive(Debug, Clone, Copy)]
pub struct VectorView<'a> {
    data: &'a [f32],
    dimensions: usize,
}

impl VectorBatch {
    /// Wrap flat row-major data
    pub fn new(dimensions: usize, data: Vec<f32>) -> Result<Self> {
        if dimensions == 0 {
            return Err(ShardError::InvalidArgument(
                "vector dimension must be at least 1".to_string(),
            ));
        }
        if data.len() % dimensions != 0 {
            return Err(ShardError::InvalidArgument(format!(
                "{} values do not form whole rows of width {}",
                data.len(),
                dimensions
            )));
        }
        Ok(Self { data, dimensions })
    }

    /// Empty batch of the given width
    pub fn empty(dimensions: usize) -> Result<Self> {
        Self::new(dimensions, Vec::new())
    }

    /// Build from individual rows. The first row fixes the width.
    pub fn from_rows(rows: &[Vec<f32>]) -> Result<Self> {
        let dimensions = match rows.first() {
            Some(row) => row.len(),
            None => {
                return Err(ShardError::InvalidArgument(
                    "cannot infer dimension from an empty batch".to_string(),
                ))
            }
        };

        let mut batch = Self::new(dimensions, Vec::with_capacity(rows.len() * dimensions))?;
        for row in rows {
            batch.push(row)?;
        }
        Ok(batch)
    }

    /// Append a single row
    pub fn push(&mut self, row: &[f32]) -> Result<()> {
        if row.len() != self.dimensions {
            return Err(ShardError::DimensionMismatch {
                expected: self.dimensions,
                got: row.len(),
            });
        }
        self.data.extend_from_slice(row);
        Ok(())
    }

    /// Append every row of another batch
    pub fn extend(&mut self, other: VectorView<'_>) -> Result<()> {
        if other.dimensions != self.dimensions {
            return Err(ShardError::DimensionMismatch {
                expected: self.dimensions,
                got: other.dimensions,
            });
        }
        self.data.extend_from_slice(other.data);
        Ok(())
    }

    pub fn view(&self) -> VectorView<'_> {
        VectorView {
            data: &self.data,
            dimensions: self.dimensions,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dimensions.max(1)
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn row(&self, i: usize) -> &[f32] {
        self.view().row(i)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
        self.data.chunks_exact(self.dimensions.max(1))
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn into_inner(self) -> Vec<f32> {
        self.data
    }
}

impl<'a> VectorView<'a> {
    /// View over flat row-major data
    pub fn new(dimensions: usize, data: &'a [f32]) -> Result<Self> {
        if dimensions == 0 || data.len() % dimensions != 0 {
            return Err(ShardError::InvalidArgument(format!(
                "{} values do not form whole rows of width {}",
                data.len(),
                dimensions
            )));
        }
        Ok(Self { data, dimensions })
    }

    pub fn len(&self) -> usize {
        self.data.len() / self.dimensions
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn row(&self, i: usize) -> &'a [f32] {
        let start = i * self.dimensions;
        &self.data[start..start + self.dimensions]
    }

    pub fn rows(&self) -> std::slice::ChunksExact<'a, f32> {
        self.data.chunks_exact(self.dimensions)
    }

    /// Sub-view over a range of rows
    pub fn slice(&self, rows: Range<usize>) -> VectorView<'a> {
        VectorView {
            data: &self.data[rows.start * self.dimensions..rows.end * self.dimensions],
            dimensions: self.dimensions,
        }
    }

    pub fn as_slice(&self) -> &'a [f32] {
        self.data
    }

    pub fn to_batch(&self) -> VectorBatch {
        VectorBatch {
            data: self.data.to_vec(),
            dimensions: self.dimensions,
        }
    }
}

impl<'a> From<&'a VectorBatch> for VectorView<'a> {
    fn from(batch: &'a VectorBatch) -> Self {
        batch.view()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_infers_width() {
        let batch = VectorBatch::from_rows(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(batch.dimensions(), 2);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.row(1), &[3.0, 4.0]);
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        let result = VectorBatch::from_rows(&[vec![1.0, 2.0], vec![3.0]]);
        assert!(matches!(
            result,
            Err(ShardError::DimensionMismatch { expected: 2, got: 1 })
        ));
    }

    #[test]
    fn test_from_rows_rejects_empty() {
        let rows: Vec<Vec<f32>> = Vec::new();
        assert!(matches!(
            VectorBatch::from_rows(&rows),
            Err(ShardError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_new_rejects_partial_row() {
        assert!(VectorBatch::new(3, vec![0.0; 7]).is_err());
        assert!(VectorBatch::new(0, Vec::new()).is_err());
    }

    #[test]
    fn test_view_slice() {
        let batch = VectorBatch::new(2, (0..10).map(|i| i as f32).collect()).unwrap();
        let view = batch.view().slice(1..3);
        assert_eq!(view.len(), 2);
        assert_eq!(view.row(0), &[2.0, 3.0]);
        assert_eq!(view.row(1), &[4.0, 5.0]);
        assert_eq!(view.to_batch().as_slice(), &[2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn test_zero_width_is_rejected() {
        assert!(matches!(
            VectorBatch::empty(0),
            Err(ShardError::InvalidArgument(_))
        ));
        assert!(VectorBatch::empty(1).unwrap().view().is_empty());
    }

    #[test]
    fn test_extend_checks_width() {
        let mut batch = VectorBatch::empty(2).unwrap();
        let other = VectorBatch::new(3, vec![0.0; 3]).unwrap();
        assert!(batch.extend(other.view()).is_err());

        let same = VectorBatch::new(2, vec![1.0, 1.0]).unwrap();
        batch.extend(same.view()).unwrap();
        assert_eq!(batch.len(), 1);
    }
}
