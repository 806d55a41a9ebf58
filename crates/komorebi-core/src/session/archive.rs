//! Session archive.
//!
//! Finished conversations are appended to `komorebi-chat-sessions`. The list
//! is capped; the oldest entries are evicted from the front.

use super::message::{Message, MessageRole};
use super::model::{ArchivedChatSession, SceneType, SessionType};
use crate::error::{KomorebiError, Result};
use crate::storage::{StorageAdapter, keys};
use crate::user::UserContext;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Everything needed to snapshot the conversation in progress.
#[derive(Debug, Clone, Copy)]
pub struct ArchiveRequest<'a> {
    pub session_type: SessionType,
    pub scene_type: &'a SceneType,
    pub messages: &'a [Message],
    pub session_start_time: Option<DateTime<Utc>>,
    pub now: DateTime<Utc>,
}

#[derive(Clone)]
pub struct SessionArchiver {
    storage: StorageAdapter,
    capacity: usize,
}

impl SessionArchiver {
    pub fn new(storage: StorageAdapter, capacity: usize) -> Self {
        Self { storage, capacity }
    }

    /// Snapshots the conversation into the archive.
    ///
    /// Returns `None` (and writes nothing) unless the user is authenticated
    /// and the conversation holds more than the seed greeting.
    pub fn archive_current_session(
        &self,
        user: &UserContext,
        request: ArchiveRequest<'_>,
    ) -> Option<ArchivedChatSession> {
        if !user.is_authenticated() || request.messages.len() <= 1 {
            tracing::debug!(
                authenticated = user.is_authenticated(),
                messages = request.messages.len(),
                "Nothing to archive"
            );
            return None;
        }

        let transcript = strip_greeting(request.messages);
        let duration = request
            .session_start_time
            .map(|start| (request.now - start).num_minutes().max(0))
            .unwrap_or(0);

        let archived = ArchivedChatSession {
            id: Uuid::new_v4().to_string(),
            session_type: request.session_type,
            message_count: transcript.iter().filter(|m| m.is_user()).count(),
            messages: transcript,
            created_at: request.now,
            scene_type: request.scene_type.clone(),
            duration,
            insight_card_id: None,
        };

        let mut sessions = self.list(user);
        sessions.push(archived.clone());
        if sessions.len() > self.capacity {
            let overflow = sessions.len() - self.capacity;
            sessions.drain(..overflow);
        }
        self.storage.set(user, keys::CHAT_SESSIONS, &sessions);

        tracing::info!(
            id = %archived.id,
            messages = archived.message_count,
            duration = archived.duration,
            "Archived session"
        );
        Some(archived)
    }

    /// All archived sessions, oldest first.
    pub fn list(&self, user: &UserContext) -> Vec<ArchivedChatSession> {
        self.storage.get(user, keys::CHAT_SESSIONS).unwrap_or_default()
    }

    pub fn find(&self, user: &UserContext, session_id: &str) -> Option<ArchivedChatSession> {
        self.list(user).into_iter().find(|s| s.id == session_id)
    }

    pub fn delete(&self, user: &UserContext, session_id: &str) -> Result<()> {
        let mut sessions = self.list(user);
        let before = sessions.len();
        sessions.retain(|s| s.id != session_id);
        if sessions.len() == before {
            return Err(KomorebiError::not_found("ArchivedChatSession", session_id));
        }
        self.storage.try_set(user, keys::CHAT_SESSIONS, &sessions)
    }

    /// Links an insight card to the archived session it came from.
    pub fn attach_insight(&self, user: &UserContext, session_id: &str, insight_id: &str) -> Result<()> {
        let mut sessions = self.list(user);
        let session = sessions
            .iter_mut()
            .find(|s| s.id == session_id)
            .ok_or_else(|| KomorebiError::not_found("ArchivedChatSession", session_id))?;
        session.insight_card_id = Some(insight_id.to_string());
        self.storage.try_set(user, keys::CHAT_SESSIONS, &sessions)
    }
}

/// Drops the seed greeting (a leading assistant message).
fn strip_greeting(messages: &[Message]) -> Vec<Message> {
    match messages.first() {
        Some(first) if first.role == MessageRole::Assistant => messages[1..].to_vec(),
        _ => messages.to_vec(),
    }
}
