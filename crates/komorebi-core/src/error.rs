//! Error types for the Komorebi session core.

use thiserror::Error;

/// A shared error type for the entire Komorebi workspace.
///
/// Most failures in the session core degrade to a default instead of
/// surfacing; this type is what the storage and remote layers return before
/// that degradation happens.
#[derive(Error, Debug, Clone)]
pub enum KomorebiError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Key-value store failure (read, write, lock)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "JSON", "TOML", "migration"
        message: String,
    },

    /// Remote chat/insight service failure
    #[error("Remote service error ({service}): {message}")]
    Remote {
        service: &'static str,
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KomorebiError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Remote error for the named service
    pub fn remote(service: &'static str, message: impl Into<String>) -> Self {
        Self::Remote {
            service,
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    pub fn is_serialization(&self) -> bool {
        matches!(self, Self::Serialization { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for KomorebiError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(format!("{} (kind: {:?})", err, err.kind()))
    }
}

impl From<serde_json::Error> for KomorebiError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for KomorebiError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for KomorebiError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<version_migrate::MigrationError> for KomorebiError {
    fn from(err: version_migrate::MigrationError) -> Self {
        Self::Serialization {
            format: "migration".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (used at the binary boundary)
impl From<anyhow::Error> for KomorebiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, KomorebiError>`.
pub type Result<T> = std::result::Result<T, KomorebiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_error_is_serialization() {
        let err: KomorebiError = serde_json::from_str::<u32>("not a number")
            .unwrap_err()
            .into();
        assert!(err.is_serialization());
        assert!(err.to_string().starts_with("Serialization error: JSON"));
    }

    #[test]
    fn test_remote_error_display() {
        let err = KomorebiError::remote("chat", "HTTP 502");
        assert!(err.is_remote());
        assert_eq!(err.to_string(), "Remote service error (chat): HTTP 502");
    }
}
