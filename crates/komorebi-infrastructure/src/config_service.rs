//! Configuration service implementation.
//!
//! Loads [`KomorebiConfig`] from `config.toml` (`~/.config/komorebi/` by
//! default), writing a default file on first run, then applies environment
//! overrides.

use crate::paths::KomorebiPaths;
use crate::storage::AtomicFile;
use komorebi_core::config::KomorebiConfig;
use komorebi_core::error::{KomorebiError, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

pub const ENV_CHAT_URL: &str = "KOMOREBI_CHAT_URL";
pub const ENV_INSIGHT_URL: &str = "KOMOREBI_INSIGHT_URL";
pub const ENV_API_KEY: &str = "KOMOREBI_API_KEY";

/// Loads and caches the configuration.
#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
    config: Arc<RwLock<Option<KomorebiConfig>>>,
}

impl ConfigService {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            config: Arc::new(RwLock::new(None)),
        }
    }

    /// Uses the platform config file location.
    pub fn from_default_path() -> Result<Self> {
        Ok(Self::new(KomorebiPaths::config_file()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the configuration, loading it on first access.
    pub fn get_config(&self) -> Result<KomorebiConfig> {
        {
            let cached = self.config.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(config) = cached.as_ref() {
                return Ok(config.clone());
            }
        }

        let loaded = self.load_config(|name| std::env::var(name).ok())?;
        let mut cached = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *cached = Some(loaded.clone());
        Ok(loaded)
    }

    /// Forces a reload on next access.
    pub fn invalidate_cache(&self) {
        let mut cached = self.config.write().unwrap_or_else(PoisonError::into_inner);
        *cached = None;
    }

    /// Reads the file (creating it with defaults when missing) and applies
    /// overrides from `env`.
    pub fn load_config<F>(&self, env: F) -> Result<KomorebiConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = AtomicFile::new(&self.path);
        let content = file.read().map_err(|e| {
            KomorebiError::config(format!(
                "Failed to read config file '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let config = match content {
            Some(content) => toml::from_str(&content).map_err(|e| {
                KomorebiError::config(format!(
                    "Failed to parse config file '{}': {}",
                    self.path.display(),
                    e
                ))
            })?,
            None => {
                let config = KomorebiConfig::default();
                let toml_string = toml::to_string_pretty(&config)?;
                file.write(&toml_string).map_err(|e| {
                    KomorebiError::config(format!(
                        "Failed to write default config '{}': {}",
                        self.path.display(),
                        e
                    ))
                })?;
                tracing::info!(path = %self.path.display(), "Created default config file");
                config
            }
        };

        Ok(apply_env_overrides(config, env))
    }
}

/// Replaces endpoint settings with non-empty environment values.
pub fn apply_env_overrides<F>(mut config: KomorebiConfig, env: F) -> KomorebiConfig
where
    F: Fn(&str) -> Option<String>,
{
    let value = |name: &str| env(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = value(ENV_CHAT_URL) {
        config.endpoints.chat_url = url;
    }
    if let Some(url) = value(ENV_INSIGHT_URL) {
        config.endpoints.insight_url = url;
    }
    if let Some(key) = value(ENV_API_KEY) {
        config.endpoints.api_key = Some(key);
    }
    config
}
