//! Storage configuration.

use serde::{Deserialize, Serialize};

/// Configuration for [`DbFileStorage`](super::DbFileStorage).
///
/// `read_alias` and `write_alias` name the connections callers should
/// route reads and writes through, so reads can be load-balanced to a
/// replica while writes always target the primary. The engine itself is
/// agnostic: it receives a ready transaction and never consults aliases.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL files are served under (default: none; `url` unavailable)
    #[serde(default)]
    pub base_url: Option<String>,

    /// Connection alias for read operations (default: "default")
    #[serde(default = "default_alias")]
    pub read_alias: String,

    /// Connection alias for write operations (default: "default")
    #[serde(default = "default_alias")]
    pub write_alias: String,
}

fn default_alias() -> String {
    "default".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            read_alias: default_alias(),
            write_alias: default_alias(),
        }
    }
}

impl StorageConfig {
    /// Create a config serving files under `base_url`
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: Some(base_url.into()),
            ..Default::default()
        }
    }

    /// Alias of the connection reads should use
    pub fn db_for_read(&self) -> &str {
        &self.read_alias
    }

    /// Alias of the connection writes should use
    pub fn db_for_write(&self) -> &str {
        &self.write_alias
    }
}
