//! Bundle metadata handling

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Current bundle format version
pub const FORMAT_VERSION: &str = "1.0";

/// Metadata stored alongside a bundle's vector and id files
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RepsMeta {
    /// Metadata format version
    pub version: String,

    /// Vector width
    pub dimensions: usize,

    /// Number of vectors (and ids)
    pub count: usize,

    /// Element type of the raw vector file
    #[serde(default = "default_dtype")]
    pub dtype: String,
}

fn default_dtype() -> String {
    "f32le".to_string()
}

impl RepsMeta {
    pub fn new(dimensions: usize, count: usize) -> Self {
        Self {
            version: FORMAT_VERSION.to_string(),
            dimensions,
            count,
            dtype: default_dtype(),
        }
    }

    /// Load metadata from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let meta: RepsMeta = serde_json::from_str(&content)?;
        if meta.dtype != "f32le" {
            anyhow::bail!("Unsupported vector dtype '{}' in {:?}", meta.dtype, path);
        }
        Ok(meta)
    }

    /// Save metadata to a JSON file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
