//! Storage adapter.
//!
//! All session state is persisted as JSON strings in a flat key space. Two
//! backends sit behind the adapter: a persistent store for signed-in users
//! and an ephemeral, per-tab store for everyone else.
//!
//! # Module Structure
//!
//! - `memory`: In-process [`MemoryStore`] backend
//! - `keys`: The persisted key space

mod memory;

pub mod keys;

pub use memory::MemoryStore;

use crate::error::Result;
use crate::user::UserContext;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// A string key-value backend.
///
/// Implementations must be cheap to call from async code; writes are treated
/// as fire-and-forget by most callers.
pub trait KeyValueStore: Send + Sync {
    /// Returns the raw value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: String) -> Result<()>;

    /// Removes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Routes reads and writes to the backend that matches the user context.
///
/// Authenticated users get the persistent store; guests and anonymous users
/// get the ephemeral one.
#[derive(Clone)]
pub struct StorageAdapter {
    persistent: Arc<dyn KeyValueStore>,
    ephemeral: Arc<dyn KeyValueStore>,
}

impl StorageAdapter {
    pub fn new(persistent: Arc<dyn KeyValueStore>, ephemeral: Arc<dyn KeyValueStore>) -> Self {
        Self {
            persistent,
            ephemeral,
        }
    }

    /// Both backends in memory. Nothing outlives the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    /// Returns the backend used for `user`.
    pub fn store_for(&self, user: &UserContext) -> &dyn KeyValueStore {
        if user.is_authenticated() {
            self.persistent.as_ref()
        } else {
            self.ephemeral.as_ref()
        }
    }

    /// Reads and deserializes `key`, propagating storage and parse errors.
    pub fn try_get<T: DeserializeOwned>(&self, user: &UserContext, key: &str) -> Result<Option<T>> {
        match self.store_for(user).get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    /// Reads and deserializes `key`; read or parse failures are logged and
    /// treated as a missing value.
    pub fn get<T: DeserializeOwned>(&self, user: &UserContext, key: &str) -> Option<T> {
        match self.try_get(user, key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read stored value, using default");
                None
            }
        }
    }

    /// Serializes and writes `value` under `key`.
    pub fn try_set<T: Serialize + ?Sized>(&self, user: &UserContext, key: &str, value: &T) -> Result<()> {
        let raw = serde_json::to_string(value)?;
        self.store_for(user).set(key, raw)
    }

    /// Fire-and-forget write: failures are logged, never returned.
    pub fn set<T: Serialize + ?Sized>(&self, user: &UserContext, key: &str, value: &T) {
        if let Err(e) = self.try_set(user, key, value) {
            tracing::warn!(key, error = %e, "Failed to persist value");
        }
    }

    pub fn get_raw(&self, user: &UserContext, key: &str) -> Result<Option<String>> {
        self.store_for(user).get(key)
    }

    pub fn set_raw(&self, user: &UserContext, key: &str, value: String) -> Result<()> {
        self.store_for(user).set(key, value)
    }

    /// Removes `key`; failures are logged.
    pub fn remove(&self, user: &UserContext, key: &str) {
        if let Err(e) = self.store_for(user).remove(key) {
            tracing::warn!(key, error = %e, "Failed to remove stored value");
        }
    }
}
