//! SessionLimits DTOs and migrations

use chrono::{DateTime, Utc};
use komorebi_core::error::Result;
use komorebi_core::session::SessionLimits;
use serde::{Deserialize, Serialize};
use version_migrate::{FromDomain, IntoDomain, MigratesTo, Versioned};

/// Entity name used in the migrator and in persisted records.
pub const SESSION_LIMITS_ENTITY: &str = "session_limits";

/// Version written by [`SessionLimitsDTO`].
pub const SESSION_LIMITS_LATEST_VERSION: &str = "1.1.0";

/// Session limits V1.0.0 (counters and daily completion flags).
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.0.0")]
#[serde(rename_all = "camelCase")]
pub struct SessionLimitsV1_0_0 {
    #[serde(default)]
    pub morning_completed: bool,
    #[serde(default)]
    pub evening_completed: bool,
    pub messages_used: u32,
    pub max_messages: u32,
}

/// Session limits V1.1.0 (added per-period completion timestamps).
#[derive(Debug, Clone, Serialize, Deserialize, Versioned)]
#[versioned(version = "1.1.0")]
#[serde(rename_all = "camelCase")]
pub struct SessionLimitsV1_1_0 {
    #[serde(default)]
    pub morning_completed: bool,
    #[serde(default)]
    pub evening_completed: bool,
    pub messages_used: u32,
    pub max_messages: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_morning_session: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_evening_session: Option<DateTime<Utc>>,
}

/// Type alias for the latest SessionLimits version.
pub type SessionLimitsDTO = SessionLimitsV1_1_0;

// ============================================================================
// Migration implementations
// ============================================================================

/// Timestamps start out empty; the quota tracker recomputes the completion
/// flags from them on load.
impl MigratesTo<SessionLimitsV1_1_0> for SessionLimitsV1_0_0 {
    fn migrate(self) -> SessionLimitsV1_1_0 {
        SessionLimitsV1_1_0 {
            morning_completed: self.morning_completed,
            evening_completed: self.evening_completed,
            messages_used: self.messages_used,
            max_messages: self.max_messages,
            last_morning_session: None,
            last_evening_session: None,
        }
    }
}

// ============================================================================
// Domain model conversions
// ============================================================================

impl IntoDomain<SessionLimits> for SessionLimitsV1_1_0 {
    fn into_domain(self) -> SessionLimits {
        SessionLimits {
            morning_completed: self.morning_completed,
            evening_completed: self.evening_completed,
            messages_used: self.messages_used,
            max_messages: self.max_messages,
            last_morning_session: self.last_morning_session,
            last_evening_session: self.last_evening_session,
        }
    }
}

impl FromDomain<SessionLimits> for SessionLimitsV1_1_0 {
    fn from_domain(limits: SessionLimits) -> Self {
        SessionLimitsV1_1_0 {
            morning_completed: limits.morning_completed,
            evening_completed: limits.evening_completed,
            messages_used: limits.messages_used,
            max_messages: limits.max_messages,
            last_morning_session: limits.last_morning_session,
            last_evening_session: limits.last_evening_session,
        }
    }
}

// ============================================================================
// Migrator factory
// ============================================================================

/// Creates a Migrator for SessionLimits records.
///
/// # Migration Path
///
/// - V1.0.0 → V1.1.0: Adds `lastMorningSession` / `lastEveningSession`
/// - V1.1.0 → SessionLimits: Converts DTO to domain model
pub fn create_session_limits_migrator() -> Result<version_migrate::Migrator> {
    let mut migrator = version_migrate::Migrator::builder().build();
    let path = version_migrate::Migrator::define(SESSION_LIMITS_ENTITY)
        .from::<SessionLimitsV1_0_0>()
        .step::<SessionLimitsV1_1_0>()
        .into_with_save::<SessionLimits>();
    migrator.register(path)?;
    Ok(migrator)
}
