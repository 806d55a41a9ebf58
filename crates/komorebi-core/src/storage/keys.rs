//! Persisted key space.

/// Array of insight cards.
pub const INSIGHT_CARDS: &str = "insight-cards";
/// Array of archived sessions, capped.
pub const CHAT_SESSIONS: &str = "komorebi-chat-sessions";
/// Quota record.
pub const SESSION_LIMITS: &str = "session-limits";
/// RFC 3339 timestamp of the first accepted message.
pub const SESSION_START_TIME: &str = "session-start-time";
/// Messages of the conversation in progress.
pub const CURRENT_SESSION_MESSAGES: &str = "current-session-messages";
/// Selected background scene.
pub const CURRENT_SCENE: &str = "current-scene";
/// Whether the video background is on.
pub const VIDEO_BACKGROUND_ENABLED: &str = "video-background-enabled";
