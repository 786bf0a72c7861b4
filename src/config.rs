//! Application configuration stored as TOML.
//!
//! The file lives at `<config dir>/hashtag-feed/config.toml` unless the
//! `HASHTAG_FEED_CONFIG` environment variable points elsewhere. A missing file is
//! created from the defaults, a broken file is reported and ignored so the forms
//! still start.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use crate::feed::DEFAULT_FEED_LIMIT;
use crate::mqtt::MqttConfig;

pub const CONFIG_ENV: &str = "HASHTAG_FEED_CONFIG";
const CONFIG_DIR: &str = "hashtag-feed";
const CONFIG_FILE: &str = "config.toml";

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub mqtt: MqttConfig,
    /// Prefilled username of the publish form
    pub default_username: String,
    /// Lines kept in the log and feed areas
    pub feed_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            mqtt: MqttConfig::default(),
            default_username: String::new(),
            feed_limit: DEFAULT_FEED_LIMIT,
        }
    }
}

impl AppConfig {
    pub fn config_path() -> PathBuf {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return PathBuf::from(path);
        }
        let mut path = dirs::config_dir().unwrap_or_else(|| {
            warn!("Could not determine config directory, using current directory");
            PathBuf::from(".")
        });
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    /// Reads the file at `path`, writing the defaults there if it does not exist.
    pub async fn load_or_init(path: &Path) -> Result<Self, ConfigError> {
        if tokio::fs::try_exists(path).await? {
            let content = tokio::fs::read_to_string(path).await?;
            let config = toml::from_str(&content)?;
            debug!("Loaded config from {}", path.display());
            return Ok(config);
        }

        let config = Self::default();
        config.save(path).await?;
        info!("Wrote default config to {}", path.display());
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Loads the config from [`AppConfig::config_path`], falling back to defaults.
    pub async fn load() -> Self {
        let path = Self::config_path();
        match Self::load_or_init(&path).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Using default config, {}: {}", path.display(), e);
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let config = AppConfig::load_or_init(&path).await.unwrap();
        assert_eq!(config, AppConfig::default());
        assert!(path.exists());

        let reloaded = AppConfig::load_or_init(&path).await.unwrap();
        assert_eq!(reloaded, config);
    }

    #[tokio::test]
    async fn partial_file_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(
            &path,
            "default_username = \"alice\"\n\n[mqtt]\nhost = \"localhost\"\n",
        )
        .await
        .unwrap();

        let config = AppConfig::load_or_init(&path).await.unwrap();
        assert_eq!(config.default_username, "alice");
        assert_eq!(config.mqtt.host, "localhost");
        assert_eq!(config.mqtt.port, 1883);
        assert_eq!(config.feed_limit, DEFAULT_FEED_LIMIT);
    }

    #[tokio::test]
    async fn broken_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        tokio::fs::write(&path, "mqtt = 5").await.unwrap();

        let err = AppConfig::load_or_init(&path).await.unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }
}
