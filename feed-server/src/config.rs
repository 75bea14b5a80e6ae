//! # Configuration
//!
//! JSON configuration for the feed server. Every section has defaults, so a
//! config file only needs the values it changes:
//!
//! ```json
//! {
//!   "server": { "default_port": 5050 },
//!   "limits": { "max_upload_size_mb": 20 }
//! }
//! ```
//!
//! ```rust,no_run
//! # use feed_server::config::Config;
//! let config = Config::load_or_default("feed.json")?;
//! # Ok::<(), feed_server::FeedError>(())
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeedResult;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host/IP address to bind to
    pub default_host: String,
    pub default_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            default_host: "0.0.0.0".to_string(),
            default_port: 5000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory; archives live under `<dir>/packages`
    pub default_data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            default_data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitsConfig {
    pub max_upload_size_mb: u64,
    /// Whole multipart body, including form overhead
    pub max_request_body_size_mb: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_size_mb: 100,
            max_request_body_size_mb: 150,
        }
    }
}

impl Config {
    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or is not valid configuration JSON.
    pub fn load<P: AsRef<Path>>(path: P) -> FeedResult<Self> {
        let config_str = fs::read_to_string(path.as_ref())?;
        let config = serde_json::from_str(&config_str)?;
        debug!(path = %path.as_ref().display(), "Loaded configuration");
        Ok(config)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> FeedResult<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            debug!(path = %path.as_ref().display(), "No configuration file, using defaults");
            Ok(Self::default())
        }
    }

    pub fn max_upload_size_bytes(&self) -> u64 {
        self.limits.max_upload_size_mb * 1024 * 1024
    }

    pub fn max_request_body_size_bytes(&self) -> usize {
        (self.limits.max_request_body_size_mb * 1024 * 1024) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.default_host, "0.0.0.0");
        assert_eq!(config.server.default_port, 5000);
        assert_eq!(config.storage.default_data_dir, PathBuf::from("./data"));
        assert_eq!(config.max_upload_size_bytes(), 100 * 1024 * 1024);
        assert_eq!(config.max_request_body_size_bytes(), 150 * 1024 * 1024);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("feed.json");
        fs::write(
            &path,
            r#"{ "server": { "default_port": 5050 }, "limits": { "max_upload_size_mb": 20 } }"#,
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.server.default_port, 5050);
        assert_eq!(config.server.default_host, "0.0.0.0");
        assert_eq!(config.limits.max_upload_size_mb, 20);
        assert_eq!(config.limits.max_request_body_size_mb, 150);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_load_or_default_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config::load_or_default(temp_dir.path().join("missing.json")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("feed.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(Config::load(&path).is_err());
        assert!(Config::load_or_default(&path).is_err());
    }
}
