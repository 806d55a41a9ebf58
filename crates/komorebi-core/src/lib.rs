//! Komorebi session core.
//!
//! Timed morning/evening reflection sessions: quota tracking, conversation
//! state, archiving and insight cards. Storage and the remote chat/insight
//! services are injected; see `komorebi-infrastructure` and
//! `komorebi-interaction` for the concrete implementations.

pub mod background;
pub mod clock;
pub mod config;
pub mod error;
pub mod insight;
pub mod remote;
pub mod session;
pub mod storage;
pub mod user;

// Re-export common error type
pub use error::KomorebiError;
pub use user::UserContext;
