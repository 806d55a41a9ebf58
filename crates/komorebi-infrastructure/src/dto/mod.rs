//! Versioned DTOs for persisted records.

pub mod session_limits;

pub use session_limits::{
    SESSION_LIMITS_ENTITY, SESSION_LIMITS_LATEST_VERSION, SessionLimitsDTO, SessionLimitsV1_0_0, SessionLimitsV1_1_0,
    create_session_limits_migrator,
};
