//! Remote service contracts.
//!
//! The chat and insight endpoints are opaque request/response services. The
//! interaction layer implements these traits over HTTP; the session core only
//! sees the traits.

use crate::error::Result;
use crate::session::{Message, MessageRole, SessionType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One prior turn as sent to the remote services.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for HistoryEntry {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Body of a chat request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    pub session_type: SessionType,
    pub conversation_history: Vec<HistoryEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
}

/// Body of a chat response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
}

/// Body of an insight request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub session_messages: Vec<HistoryEntry>,
    pub session_type: SessionType,
}

/// Body of an insight response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsightReply {
    pub quote: String,
}

/// The conversational AI endpoint.
#[async_trait]
pub trait ChatService: Send + Sync {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply>;
}

/// The insight (quote) generation endpoint.
#[async_trait]
pub trait InsightService: Send + Sync {
    async fn generate_quote(&self, request: &InsightRequest) -> Result<InsightReply>;
}

/// Grabs a still frame from the active video background.
///
/// Best-effort: implementations return `None` instead of failing.
#[async_trait]
pub trait FrameCapture: Send + Sync {
    /// Returns a URL (typically a `data:` URL) for the captured frame.
    async fn capture_still(&self) -> Option<String>;
}

/// Frame capture for environments without a video surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFrameCapture;

#[async_trait]
impl FrameCapture for NoFrameCapture {
    async fn capture_still(&self) -> Option<String> {
        None
    }
}
