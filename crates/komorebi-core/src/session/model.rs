//! Session domain models.

use super::message::Message;
use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// The two daily session windows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SessionType {
    Morning,
    Evening,
}

/// Background scene identifier (e.g. `forest`, `ocean`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneType(pub String);

impl SceneType {
    pub const DEFAULT: &'static str = "forest";

    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SceneType {
    fn default() -> Self {
        Self(Self::DEFAULT.to_string())
    }
}

impl std::fmt::Display for SceneType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Message quota and daily completion state for one user context.
///
/// `messages_used <= max_messages` is advisory: callers check it before
/// sending, nothing here enforces it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionLimits {
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

impl SessionLimits {
    pub fn new(max_messages: u32) -> Self {
        Self {
            morning_completed: false,
            evening_completed: false,
            messages_used: 0,
            max_messages,
            last_morning_session: None,
            last_evening_session: None,
        }
    }

    pub fn last_session(&self, period: SessionType) -> Option<DateTime<Utc>> {
        match period {
            SessionType::Morning => self.last_morning_session,
            SessionType::Evening => self.last_evening_session,
        }
    }

    /// Whether `period` was completed on the local calendar date `date`.
    pub fn completed_on(&self, period: SessionType, date: NaiveDate) -> bool {
        self.last_session(period)
            .map(|at| at.with_timezone(&Local).date_naive() == date)
            .unwrap_or(false)
    }

    pub fn is_exhausted(&self) -> bool {
        self.messages_used >= self.max_messages
    }

    pub fn remaining(&self) -> u32 {
        self.max_messages.saturating_sub(self.messages_used)
    }
}

/// A finished conversation, persisted read-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedChatSession {
    pub id: String,
    #[serde(rename = "type")]
    pub session_type: SessionType,
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub scene_type: SceneType,
    /// Number of user-authored messages.
    pub message_count: usize,
    /// Whole minutes from the first accepted message to archive time.
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insight_card_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::str::FromStr;

    #[test]
    fn test_session_type_strings() {
        assert_eq!(SessionType::Morning.to_string(), "morning");
        assert_eq!(SessionType::from_str("evening").unwrap(), SessionType::Evening);
        assert_eq!(serde_json::to_string(&SessionType::Evening).unwrap(), "\"evening\"");
    }

    #[test]
    fn test_completed_on_uses_local_date() {
        let now = Utc::now();
        let today = now.with_timezone(&Local).date_naive();
        let mut limits = SessionLimits::new(4);
        assert!(!limits.completed_on(SessionType::Morning, today));

        limits.last_morning_session = Some(now);
        assert!(limits.completed_on(SessionType::Morning, today));
        assert!(!limits.completed_on(SessionType::Evening, today));

        limits.last_evening_session = Some(now - Duration::days(2));
        assert!(!limits.completed_on(SessionType::Evening, today));
    }

    #[test]
    fn test_remaining_saturates() {
        let mut limits = SessionLimits::new(4);
        assert_eq!(limits.remaining(), 4);
        limits.messages_used = 3;
        assert_eq!(limits.remaining(), 1);
        assert!(!limits.is_exhausted());
        limits.messages_used = 6;
        assert_eq!(limits.remaining(), 0);
        assert!(limits.is_exhausted());
    }

    #[test]
    fn test_archived_session_wire_keys() {
        let archived = ArchivedChatSession {
            id: "s1".to_string(),
            session_type: SessionType::Morning,
            messages: Vec::new(),
            created_at: Utc::now(),
            scene_type: SceneType::default(),
            message_count: 0,
            duration: 3,
            insight_card_id: None,
        };
        let json = serde_json::to_value(&archived).unwrap();
        assert_eq!(json["type"], "morning");
        assert_eq!(json["sceneType"], "forest");
        assert_eq!(json["messageCount"], 0);
        assert!(json.get("insightCardId").is_none());
    }
}
