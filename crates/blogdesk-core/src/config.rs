//! Application configuration management.
//!
//! This module handles loading and saving the client configuration: the API
//! endpoint and timeout, the login path used for forced redirects, toast
//! defaults, which credential store to use, and the last used username.
//!
//! Configuration is stored at `~/.config/blogdesk/config.json`. The
//! `BLOGDESK_BASE_URL` and `BLOGDESK_TIMEOUT_MS` environment variables
//! override the file.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::navigation::LOGIN_PATH;
use crate::storage::{FileStore, KeychainStore, KeyValueStore, MemoryStore};

/// Application name used for config/cache directory paths
const APP_NAME: &str = "blogdesk";

/// Config file name
const CONFIG_FILE: &str = "config.json";

const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Request timeout. Calls that take longer fail with a timeout error.
const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// How long a toast stays visible unless dismissed
pub const DEFAULT_TOAST_DURATION_MS: u64 = 3000;

const ENV_BASE_URL: &str = "BLOGDESK_BASE_URL";
const ENV_TIMEOUT_MS: &str = "BLOGDESK_TIMEOUT_MS";

/// Where the session token is persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Keychain,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub base_url: String,
    pub timeout_ms: u64,
    pub login_path: String,
    pub toast_duration_ms: u64,
    pub storage: StorageBackend,
    pub last_username: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            login_path: LOGIN_PATH.to_string(),
            toast_duration_ms: DEFAULT_TOAST_DURATION_MS,
            storage: StorageBackend::default(),
            last_username: None,
        }
    }
}

impl Config {
    /// Load from the default location, then apply environment overrides
    pub fn load() -> Result<Self> {
        let mut config = Self::load_from(&Self::config_path()?)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load from an explicit path. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Record the last used username in the config file, leaving every
    /// other stored setting (and any environment override) as it was
    pub fn remember_username(username: &str) -> Result<()> {
        let path = Self::config_path()?;
        let mut stored = Self::load_from(&path)?;
        stored.last_username = Some(username.to_string());
        stored.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Apply overrides from a variable lookup (normally the process environment)
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(url) = lookup(ENV_BASE_URL).filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().to_string();
        }
        if let Some(ms) = lookup(ENV_TIMEOUT_MS) {
            self.timeout_ms = ms
                .trim()
                .parse()
                .with_context(|| format!("{} must be a number of milliseconds, got {:?}", ENV_TIMEOUT_MS, ms))?;
        }
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn toast_duration(&self) -> Duration {
        Duration::from_millis(self.toast_duration_ms)
    }

    /// Open the configured credential store
    pub fn open_storage(&self) -> Result<Arc<dyn KeyValueStore>> {
        let store: Arc<dyn KeyValueStore> = match self.storage {
            StorageBackend::File => Arc::new(FileStore::new(self.cache_dir()?)),
            StorageBackend::Keychain => Arc::new(KeychainStore::new()),
            StorageBackend::Memory => Arc::new(MemoryStore::new()),
        };
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.base_url, "http://localhost:8080/api/v1");
        assert_eq!(config.timeout(), Duration::from_millis(5000));
        assert_eq!(config.login_path, "/login");
        assert_eq!(config.toast_duration(), Duration::from_millis(3000));
        assert_eq!(config.storage, StorageBackend::File);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json")).unwrap();
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.last_username.is_none());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            base_url: "https://blog.example.com/api/v1".to_string(),
            storage: StorageBackend::Keychain,
            last_username: Some("alice".to_string()),
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.base_url, "https://blog.example.com/api/v1");
        assert_eq!(loaded.storage, StorageBackend::Keychain);
        assert_eq!(loaded.last_username.as_deref(), Some("alice"));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"storage":"memory"}"#).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage, StorageBackend::Memory);
        assert_eq!(loaded.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("BLOGDESK_BASE_URL", " http://10.0.0.2:8080/api/v1 "),
            ("BLOGDESK_TIMEOUT_MS", "1500"),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.base_url, "http://10.0.0.2:8080/api/v1");
        assert_eq!(config.timeout_ms, 1500);
    }

    #[test]
    fn test_bad_timeout_override_is_an_error() {
        let mut config = Config::default();
        let result = config.apply_overrides(|key| {
            (key == "BLOGDESK_TIMEOUT_MS").then(|| "soon".to_string())
        });
        assert!(result.is_err());
        assert_eq!(config.timeout_ms, 5000);
    }
}
