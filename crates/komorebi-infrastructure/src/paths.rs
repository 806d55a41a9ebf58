//! Path management for Komorebi configuration and data files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/komorebi/          # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/komorebi/     # Data directory
//! └── store/                   # Persistent key-value store, one file per key
//! ```

use komorebi_core::config::StorageConfig;
use std::path::PathBuf;

const APP_DIR: &str = "komorebi";

/// Errors that can occur during path resolution.
#[derive(Debug)]
pub enum PathError {
    /// The platform config or data directory could not be determined.
    HomeDirNotFound,
}

impl std::fmt::Display for PathError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PathError::HomeDirNotFound => write!(f, "Cannot find home directory"),
        }
    }
}

impl std::error::Error for PathError {}

impl From<PathError> for komorebi_core::error::KomorebiError {
    fn from(err: PathError) -> Self {
        komorebi_core::error::KomorebiError::config(err.to_string())
    }
}

pub struct KomorebiPaths;

impl KomorebiPaths {
    /// Returns the Komorebi configuration directory (e.g. `~/.config/komorebi/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the Komorebi data directory (e.g. `~/.local/share/komorebi/`).
    pub fn data_dir() -> Result<PathBuf, PathError> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::HomeDirNotFound)
    }

    /// Returns the path to `config.toml`.
    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the directory backing the persistent store.
    ///
    /// `storage.data_dir` from the config wins over the platform default.
    pub fn store_dir(storage: &StorageConfig) -> Result<PathBuf, PathError> {
        match &storage.data_dir {
            Some(dir) => Ok(PathBuf::from(dir).join("store")),
            None => Ok(Self::data_dir()?.join("store")),
        }
    }
}
