use crate::session::{SceneType, SessionType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short quote distilled from a session.
///
/// Cards reference their session by id and outlive it; deleting an archived
/// session leaves its cards in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightCard {
    pub id: String,
    pub quote: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub scene_type: SceneType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_still_url: Option<String>,
    #[serde(default)]
    pub is_pinned: bool,
}

/// Identifiers handed back after a card is generated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRef {
    pub session_id: String,
    pub insight_id: String,
}
