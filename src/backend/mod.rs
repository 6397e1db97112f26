//! Backend module - device-local exact search backends (flat, parallel flat)

mod flat;
mod parallel;
mod traits;

pub use flat::{dot_product, rank_order, top_k_scan, FlatIndex};
pub use parallel::ParallelFlatIndex;
pub use traits::{LocalHits, LocalIndex};

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Supported backend types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendType {
    /// Sequential exact scan
    #[default]
    Flat,
    /// Exact scan with queries fanned out over rayon workers
    ParallelFlat,
}

impl BackendType {
    /// Create an empty device-local index for this backend type
    pub fn create(self, dimensions: usize) -> Box<dyn LocalIndex> {
        match self {
            BackendType::Flat => Box::new(FlatIndex::new(dimensions)),
            BackendType::ParallelFlat => Box::new(ParallelFlatIndex::new(dimensions)),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BackendType::Flat => "flat",
            BackendType::ParallelFlat => "parallel-flat",
        }
    }
}

impl FromStr for BackendType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s {
            "flat" => Ok(BackendType::Flat),
            "parallel-flat" => Ok(BackendType::ParallelFlat),
            _ => anyhow::bail!("Unknown backend: {}", s),
        }
    }
}

impl fmt::Display for BackendType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_backend() {
        assert_eq!("flat".parse::<BackendType>().unwrap(), BackendType::Flat);
        assert_eq!(
            "parallel-flat".parse::<BackendType>().unwrap(),
            BackendType::ParallelFlat
        );
        assert!("hnsw".parse::<BackendType>().is_err());
    }

    #[test]
    fn test_create_is_empty() {
        let idx = BackendType::ParallelFlat.create(8);
        assert!(idx.is_empty());
        assert_eq!(idx.dimensions(), 8);
    }
}
