//! Application configuration management.
//!
//! The configuration carries the NEIS Open API base URL and key, plus an
//! optional override for the data directory.
//!
//! Configuration is stored at `~/.config/mealcache/config.json`. The
//! `NEIS_API_KEY` and `NEIS_API_BASE` environment variables take precedence
//! over the file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Application name used for config/cache directory paths
const APP_NAME: &str = "mealcache";

/// Config file name
const CONFIG_FILE: &str = "config.json";

/// Public NEIS Open API hub
pub const DEFAULT_API_BASE: &str = "https://open.neis.go.kr/hub";

pub const ENV_API_KEY: &str = "NEIS_API_KEY";
pub const ENV_API_BASE: &str = "NEIS_API_BASE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            api_key: None,
            data_dir: None,
        }
    }
}

impl Config {
    /// Load the config file (if any) and apply environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::read_file(&Self::config_path()?)?;
        config.apply_env();
        Ok(config)
    }

    /// Read a config file without environment overrides; missing means defaults.
    pub fn read_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Override fields from `NEIS_API_KEY` / `NEIS_API_BASE` when set and non-empty.
    pub fn apply_env(&mut self) {
        self.apply_overrides(
            std::env::var(ENV_API_KEY).ok(),
            std::env::var(ENV_API_BASE).ok(),
        );
    }

    fn apply_overrides(&mut self, key: Option<String>, base: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            debug!("API key taken from environment");
            self.api_key = Some(key.trim().to_string());
        }
        if let Some(base) = base.filter(|b| !b.trim().is_empty()) {
            debug!(base = %base, "API base taken from environment");
            self.api_base = base.trim().to_string();
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Persist `key` into the config file, leaving environment overrides out of it.
    pub fn store_api_key(key: &str) -> Result<PathBuf> {
        let path = Self::config_path()?;
        Self::store_api_key_at(&path, key)?;
        Ok(path)
    }

    fn store_api_key_at(path: &Path, key: &str) -> Result<()> {
        let mut config = Self::read_file(path)?;
        config.api_key = Some(key.trim().to_string());
        config.save_to(path)
    }

    /// The configured API key, or `None` when missing or blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key().is_some()
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find config directory"))?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }

    pub fn cache_dir(&self) -> Result<PathBuf> {
        if let Some(ref dir) = self.data_dir {
            return Ok(dir.clone());
        }
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find cache directory"))?;
        Ok(cache_dir.join(APP_NAME))
    }
}
