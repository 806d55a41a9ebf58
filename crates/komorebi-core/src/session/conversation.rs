//! In-progress conversation state.
//!
//! A send is split in two halves so the remote call can run without holding
//! the state: [`ConversationState::begin_send`] validates and appends the
//! user message, [`ConversationState::complete_send`] appends the reply.
//! Each send carries the generation it started in; a reset bumps the
//! generation, so replies that land after a reset are dropped. The in-flight
//! marker records which generation owns the pending request, so only that
//! request's reply can clear it.

use super::message::Message;
use super::model::SessionType;
use super::quota::SessionQuotaTracker;
use super::window;
use crate::error::Result;
use crate::remote::{ChatReply, ChatRequest, HistoryEntry};
use crate::storage::{StorageAdapter, keys};
use crate::user::UserContext;
use chrono::{DateTime, Duration, Local, Timelike, Utc};

/// Shown in place of the assistant reply when the chat service fails.
pub const APOLOGY_MESSAGE: &str = "I'm sorry, I'm having trouble responding right now. Let's take a slow breath together and try again in a moment.";

/// Why a send was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// A previous send is still waiting on the chat service.
    Busy,
    /// Free-tier message quota used up.
    QuotaExhausted,
    /// The session ran past its time limit.
    TimeLimitReached,
    EmptyMessage,
}

/// Result of a send. Rejections are values, not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply (or the apology, when `fell_back` is set) was appended.
    Delivered { reply: Message, fell_back: bool },
    Rejected(RejectReason),
    /// The session was reset or reloaded while the request was in flight.
    Discarded,
}

/// A send that passed validation and is waiting on the chat service.
#[derive(Debug, Clone)]
pub struct PendingSend {
    generation: u64,
    pub request: ChatRequest,
}

pub struct ConversationState {
    storage: StorageAdapter,
    session_type: SessionType,
    messages: Vec<Message>,
    in_flight: Option<u64>,
    session_start_time: Option<DateTime<Utc>>,
    messages_since_insight: u32,
    generation: u64,
}

impl ConversationState {
    /// Restores a saved conversation or seeds one with `greeting`.
    pub fn restore_or_seed(
        storage: StorageAdapter,
        user: &UserContext,
        session_type: SessionType,
        greeting: &str,
        now: DateTime<Utc>,
    ) -> Self {
        let saved: Vec<Message> = storage
            .get(user, keys::CURRENT_SESSION_MESSAGES)
            .unwrap_or_default();
        let session_start_time: Option<DateTime<Utc>> = storage.get(user, keys::SESSION_START_TIME);

        let mut state = Self {
            storage,
            session_type,
            messages: saved,
            in_flight: None,
            session_start_time,
            messages_since_insight: 0,
            generation: 0,
        };

        if state.messages.is_empty() {
            state.messages.push(Message::assistant(greeting, now));
            state.persist_messages(user);
        } else {
            tracing::debug!(count = state.messages.len(), "Restored saved conversation");
            state.messages_since_insight =
                state.messages.iter().filter(|m| m.is_user()).count() as u32;
        }

        state
    }

    pub fn session_type(&self) -> SessionType {
        self.session_type
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether the conversation was started in `period` on the local date of
    /// `now`. The first message (the greeting) marks the start.
    pub fn started_in(&self, period: SessionType, now: DateTime<Utc>) -> bool {
        self.messages.first().is_none_or(|first| {
            let started = first.timestamp.with_timezone(&Local);
            started.date_naive() == now.with_timezone(&Local).date_naive()
                && window::period_for_hour(started.hour()) == period
        })
    }

    /// Takes over the generation and in-flight marker of the state this one
    /// replaces, so a request started before the swap stays the only one in
    /// flight and its reply is dropped.
    pub fn succeed(&mut self, previous: &ConversationState) {
        self.generation = self.generation.max(previous.generation) + 1;
        self.in_flight = previous.in_flight;
    }

    pub fn session_start_time(&self) -> Option<DateTime<Utc>> {
        self.session_start_time
    }

    pub fn messages_since_insight(&self) -> u32 {
        self.messages_since_insight
    }

    /// Time since the first accepted message, if the timer has started.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.session_start_time.map(|start| now - start)
    }

    pub fn is_expired(&self, limit: Duration, now: DateTime<Utc>) -> bool {
        self.elapsed(now).is_some_and(|elapsed| elapsed > limit)
    }

    /// Validates a send and appends the user message.
    ///
    /// On success the state is marked loading and the returned request should
    /// be passed to the chat service, then to [`Self::complete_send`].
    pub fn begin_send(
        &mut self,
        user: &UserContext,
        quota: &mut SessionQuotaTracker,
        time_limit: Duration,
        content: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<PendingSend, RejectReason> {
        let content = content.trim();
        if content.is_empty() {
            return Err(RejectReason::EmptyMessage);
        }
        if self.in_flight.is_some() {
            return Err(RejectReason::Busy);
        }
        if !quota.can_send(user) {
            return Err(RejectReason::QuotaExhausted);
        }
        if self.is_expired(time_limit, now) {
            return Err(RejectReason::TimeLimitReached);
        }

        if self.session_start_time.is_none() {
            self.session_start_time = Some(now);
            self.storage.set(user, keys::SESSION_START_TIME, &now);
        }

        let conversation_history = self.messages.iter().map(HistoryEntry::from).collect();
        self.messages.push(Message::user(content, now));
        quota.record_message(user);
        self.messages_since_insight += 1;
        self.in_flight = Some(self.generation);
        self.persist_messages(user);

        Ok(PendingSend {
            generation: self.generation,
            request: ChatRequest {
                message: content.to_string(),
                session_type: self.session_type,
                conversation_history,
                user_name: user.name().map(str::to_string),
            },
        })
    }

    /// Appends the chat reply, or the apology when the service failed.
    pub fn complete_send(
        &mut self,
        user: &UserContext,
        pending: PendingSend,
        reply: Result<ChatReply>,
        now: DateTime<Utc>,
    ) -> SendOutcome {
        if self.in_flight == Some(pending.generation) {
            self.in_flight = None;
        }
        if pending.generation != self.generation {
            tracing::debug!(
                started = pending.generation,
                current = self.generation,
                "Dropping chat reply from before reset"
            );
            return SendOutcome::Discarded;
        }

        let (reply, fell_back) = match reply {
            Ok(reply) if !reply.message.trim().is_empty() => (
                Message::assistant(reply.message, reply.timestamp.unwrap_or(now)),
                false,
            ),
            Ok(_) => {
                tracing::warn!("Chat service returned an empty reply");
                (Message::assistant(APOLOGY_MESSAGE, now), true)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat service failed, using apology message");
                (Message::assistant(APOLOGY_MESSAGE, now), true)
            }
        };

        self.messages.push(reply.clone());
        self.persist_messages(user);

        SendOutcome::Delivered { reply, fell_back }
    }

    /// Starts over with a fresh greeting.
    ///
    /// Clears the timer (it restarts on the next accepted message), zeroes the
    /// quota counter and invalidates any in-flight send.
    pub fn reset(
        &mut self,
        user: &UserContext,
        quota: &mut SessionQuotaTracker,
        session_type: SessionType,
        greeting: &str,
        now: DateTime<Utc>,
    ) {
        self.generation += 1;
        self.session_type = session_type;
        self.messages = vec![Message::assistant(greeting, now)];
        self.in_flight = None;
        self.messages_since_insight = 0;
        self.session_start_time = None;
        self.storage.remove(user, keys::SESSION_START_TIME);
        quota.reset_messages(user);
        self.persist_messages(user);
    }

    pub fn reset_insight_counter(&mut self) {
        self.messages_since_insight = 0;
    }

    fn persist_messages(&self, user: &UserContext) {
        self.storage
            .set(user, keys::CURRENT_SESSION_MESSAGES, &self.messages);
    }
}
