//! Versioned persistence for session limits.

use crate::dto::{
    SESSION_LIMITS_ENTITY, SESSION_LIMITS_LATEST_VERSION, create_session_limits_migrator,
};
use komorebi_core::error::{KomorebiError, Result};
use komorebi_core::session::{SessionLimits, SessionLimitsStore};
use komorebi_core::storage::{StorageAdapter, keys};
use komorebi_core::UserContext;

/// Stores `session-limits` as a flat versioned JSON record and migrates
/// older records on load.
///
/// Records without a `version` field predate versioning and already have the
/// current shape; they are read as the latest version.
#[derive(Clone)]
pub struct VersionedLimitsStore {
    storage: StorageAdapter,
}

impl VersionedLimitsStore {
    pub fn new(storage: StorageAdapter) -> Self {
        Self { storage }
    }
}

impl SessionLimitsStore for VersionedLimitsStore {
    fn load(&self, user: &UserContext) -> Result<Option<SessionLimits>> {
        let Some(raw) = self.storage.get_raw(user, keys::SESSION_LIMITS)? else {
            return Ok(None);
        };

        let mut value: serde_json::Value = serde_json::from_str(&raw)?;
        let record = value.as_object_mut().ok_or_else(|| KomorebiError::Serialization {
            format: "json".to_string(),
            message: "session-limits is not a JSON object".to_string(),
        })?;
        if !record.contains_key("version") {
            tracing::debug!(
                "Reading unversioned session limits as {}",
                SESSION_LIMITS_LATEST_VERSION
            );
            record.insert(
                "version".to_string(),
                serde_json::Value::String(SESSION_LIMITS_LATEST_VERSION.to_string()),
            );
        }

        let migrator = create_session_limits_migrator()?;
        let limits: SessionLimits = migrator.load_flat_from(SESSION_LIMITS_ENTITY, value)?;
        Ok(Some(limits))
    }

    fn save(&self, user: &UserContext, limits: &SessionLimits) -> Result<()> {
        let migrator = create_session_limits_migrator()?;
        let json = migrator.save_domain_flat(SESSION_LIMITS_ENTITY, limits)?;
        self.storage.set_raw(user, keys::SESSION_LIMITS, json)
    }
}
