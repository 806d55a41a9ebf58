//! Session domain module.
//!
//! # Module Structure
//!
//! - `message`: Conversation messages (`Message`, `MessageRole`)
//! - `model`: Session models (`SessionType`, `SessionLimits`, `ArchivedChatSession`)
//! - `window`: Wall-clock to session window resolution
//! - `quota`: Message quota and daily completion tracking
//! - `conversation`: The conversation in progress
//! - `archive`: Archived sessions
//! - `controller`: Orchestration over all of the above
//!
//! # Usage
//!
//! ```ignore
//! use komorebi_core::session::{SessionController, SessionServices, SendOutcome};
//! ```

mod archive;
mod controller;
mod conversation;
mod message;
mod model;
mod quota;

pub mod window;

pub use archive::{ArchiveRequest, SessionArchiver};
pub use controller::{SessionController, SessionServices, SessionSnapshot};
pub use conversation::{APOLOGY_MESSAGE, ConversationState, PendingSend, RejectReason, SendOutcome};
pub use message::{Message, MessageRole};
pub use model::{ArchivedChatSession, SceneType, SessionLimits, SessionType};
pub use quota::{PlainLimitsStore, SessionLimitsStore, SessionQuotaTracker};
pub use window::{SessionWindow, next_session_start, period_for_hour, resolve};
