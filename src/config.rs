//! Configuration file support for shardex
//!
//! Config file location: ~/.config/shardex/config.toml
//!
//! Example config:
//! ```toml
//! [shards]
//! num_devices = 8
//! capacity_per_device = 1500000
//! backend = "flat"  # flat, parallel-flat
//!
//! [search]
//! depth = 1000
//! batch_size = 128
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::backend::BackendType;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub shards: ShardsConfig,

    #[serde(default)]
    pub search: SearchConfig,
}

/// Device layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShardsConfig {
    /// Number of devices the collection is spread over
    #[serde(default = "default_num_devices")]
    pub num_devices: usize,

    /// Maximum vectors held by one device
    #[serde(default = "default_capacity_per_device")]
    pub capacity_per_device: usize,

    /// Device-local search backend
    #[serde(default)]
    pub backend: BackendType,
}

impl Default for ShardsConfig {
    fn default() -> Self {
        Self {
            num_devices: default_num_devices(),
            capacity_per_device: default_capacity_per_device(),
            backend: BackendType::default(),
        }
    }
}

fn default_num_devices() -> usize {
    8
}

fn default_capacity_per_device() -> usize {
    1_500_000
}

/// Query configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// Results kept per query (top-k)
    #[serde(default = "default_depth")]
    pub depth: usize,

    /// Queries searched per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_depth() -> usize {
    1000
}

fn default_batch_size() -> usize {
    128
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shardex")
            .join("config.toml")
    }

    /// Load config from file, returning defaults if not found
    pub fn load() -> Self {
        let path = Self::config_path();
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(content) => match toml::from_str(&content) {
                    Ok(config) => {
                        tracing::debug!("Loaded config from {:?}", path);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file: {}", e);
                    }
                },
                Err(e) => {
                    tracing::warn!("Failed to read config file: {}", e);
                }
            }
        }
        Self::default()
    }

    /// Set a single `section.key` value from its string form
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "shards.num_devices" => self.shards.num_devices = value.parse()?,
            "shards.capacity_per_device" => self.shards.capacity_per_device = value.parse()?,
            "shards.backend" => self.shards.backend = value.parse()?,
            "search.depth" => self.search.depth = value.parse()?,
            "search.batch_size" => self.search.batch_size = value.parse()?,
            _ => anyhow::bail!("Unknown config key: {}", key),
        }
        Ok(())
    }

    /// Save config to file
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }

    /// Write the example config file, replacing any existing one when `force`
    pub fn write_example(force: bool) -> anyhow::Result<bool> {
        let path = Self::config_path();
        if path.exists() && !force {
            return Ok(false);
        }

        let example = r#"# shardex Configuration
# Location: ~/.config/shardex/config.toml

[shards]
# Number of devices the passage collection is spread over
num_devices = 8

# Maximum vectors held by one device; devices fill in order
capacity_per_device = 1500000

# Device-local backend: flat, parallel-flat
backend = "flat"

[search]
# Results kept per query (top-k)
depth = 1000

# Queries searched per batch (bounds peak memory)
batch_size = 128
"#;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, example)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.shards.num_devices, 8);
        assert_eq!(config.shards.capacity_per_device, 1_500_000);
        assert_eq!(config.shards.backend, BackendType::Flat);
        assert_eq!(config.search.depth, 1000);
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[shards]
num_devices = 2
backend = "parallel-flat"

[search]
batch_size = 16
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.shards.num_devices, 2);
        assert_eq!(config.shards.capacity_per_device, 1_500_000);
        assert_eq!(config.shards.backend, BackendType::ParallelFlat);
        assert_eq!(config.search.batch_size, 16);
        assert_eq!(config.search.depth, 1000);
    }

    #[test]
    fn test_set_known_and_unknown_keys() {
        let mut config = Config::default();
        config.set("shards.backend", "parallel-flat").unwrap();
        config.set("search.depth", "100").unwrap();
        assert_eq!(config.shards.backend, BackendType::ParallelFlat);
        assert_eq!(config.search.depth, 100);

        assert!(config.set("search.depth", "many").is_err());
        assert!(config.set("embedding.model", "x").is_err());
    }
}
