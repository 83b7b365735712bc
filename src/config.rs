//! Library configuration.
//!
//! Every field has a default so partial JSON documents are accepted.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ViewResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Payload memoization of caching loaders.
    pub cache: CacheConfig,
    /// Value-type inference for ad-hoc tables.
    pub inference: InferenceConfig,
    /// In-memory description store.
    pub store: StoreConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of dataset payloads kept per loader.
    pub max_capacity: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InferenceConfig {
    /// Number of leading cells inspected when guessing a value type.
    pub sample_size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Prefix of generated dataset ids.
    pub prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { max_capacity: 64 }
    }
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self { sample_size: 10 }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            prefix: "ds".to_string(),
        }
    }
}

impl Config {
    pub fn from_json_str(content: &str) -> ViewResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> ViewResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Save config to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> ViewResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
