//! Engine configuration, loadable from TOML.
//!
//! ```toml
//! [persistence]
//! max_string_len = 10000
//! max_nodes = 10000
//!
//! [logging]
//! level = "debug"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, Result};

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub persistence: PersistenceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }
}

/// Sane upper bounds applied to every length prefix in a save file.
///
/// Writers refuse to produce values above these limits and readers reject
/// declared sizes above them before allocating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// Longest string value or description, in bytes.
    #[serde(default = "default_max_string_len")]
    pub max_string_len: usize,
    /// Longest map key or name, in bytes.
    #[serde(default = "default_max_key_len")]
    pub max_key_len: usize,
    /// Largest collection (state entries, regions, ...).
    #[serde(default = "default_max_collection_len")]
    pub max_collection_len: usize,
    #[serde(default = "default_max_systems")]
    pub max_systems: usize,
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,
    /// Largest single node record or context blob, in bytes.
    #[serde(default = "default_max_record_bytes")]
    pub max_record_bytes: usize,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            max_string_len: default_max_string_len(),
            max_key_len: default_max_key_len(),
            max_collection_len: default_max_collection_len(),
            max_systems: default_max_systems(),
            max_nodes: default_max_nodes(),
            max_record_bytes: default_max_record_bytes(),
        }
    }
}

/// Logging settings used by [`crate::logging::init`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_max_string_len() -> usize {
    10_000
}
fn default_max_key_len() -> usize {
    1_000
}
fn default_max_collection_len() -> usize {
    1_000
}
fn default_max_systems() -> usize {
    100
}
fn default_max_nodes() -> usize {
    10_000
}
fn default_max_record_bytes() -> usize {
    1 << 20
}
fn default_log_level() -> String {
    "info".to_string()
}
