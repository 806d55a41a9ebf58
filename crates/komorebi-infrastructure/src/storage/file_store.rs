use super::atomic_file::AtomicFile;
use komorebi_core::error::{KomorebiError, Result};
use komorebi_core::storage::KeyValueStore;
use std::path::{Path, PathBuf};

/// Persistent store that keeps each key in `<dir>/<key>.json`.
///
/// Keys are restricted to ASCII letters, digits, `-` and `_` so they map
/// onto file names unchanged.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens (and creates, if needed) the store directory.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir).map_err(|e| {
            KomorebiError::storage(format!(
                "Failed to create store directory '{}': {}",
                dir.display(),
                e
            ))
        })?;
        tracing::debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_for(&self, key: &str) -> Result<AtomicFile> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(KomorebiError::storage(format!("Invalid storage key '{}'", key)));
        }
        Ok(AtomicFile::new(self.dir.join(format!("{}.json", key))))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let file = self.file_for(key)?;
        file.read().map_err(|e| {
            KomorebiError::storage(format!(
                "Failed to read '{}': {}",
                file.path().display(),
                e
            ))
        })
    }

    fn set(&self, key: &str, value: String) -> Result<()> {
        let file = self.file_for(key)?;
        file.write(&value).map_err(|e| {
            KomorebiError::storage(format!(
                "Failed to write '{}': {}",
                file.path().display(),
                e
            ))
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let file = self.file_for(key)?;
        file.delete().map_err(|e| {
            KomorebiError::storage(format!(
                "Failed to remove '{}': {}",
                file.path().display(),
                e
            ))
        })
    }
}
