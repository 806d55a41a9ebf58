//! Session orchestration.
//!
//! `SessionController` owns the quota tracker and the conversation state for
//! the current user and drives them against the remote services. State sits
//! behind an async mutex that is released while the chat request is in
//! flight; the generation token in [`ConversationState`] keeps a late reply
//! from landing in a reset or reloaded conversation.

use super::archive::{ArchiveRequest, SessionArchiver};
use super::conversation::{ConversationState, SendOutcome};
use super::message::Message;
use super::model::{ArchivedChatSession, SessionLimits, SessionType};
use super::quota::{SessionLimitsStore, SessionQuotaTracker};
use super::window::{self, SessionWindow};
use crate::background::BackgroundSettings;
use crate::clock::Clock;
use crate::config::LimitsConfig;
use crate::insight::{GeneratedInsight, InsightGallery, InsightGenerator, InsightInput};
use crate::remote::{ChatService, FrameCapture, InsightService};
use crate::storage::StorageAdapter;
use crate::user::UserContext;
use chrono::{DateTime, Duration, Local, Utc};
use std::sync::Arc;
use tokio::sync::Mutex;

/// External collaborators the controller talks to.
#[derive(Clone)]
pub struct SessionServices {
    pub chat: Arc<dyn ChatService>,
    pub insight: Arc<dyn InsightService>,
    pub frame_capture: Arc<dyn FrameCapture>,
    pub limits_store: Arc<dyn SessionLimitsStore>,
    pub clock: Arc<dyn Clock>,
}

/// Point-in-time view of the session, for display.
#[derive(Debug, Clone)]
pub struct SessionSnapshot {
    pub user: UserContext,
    pub session_type: SessionType,
    pub messages: Vec<Message>,
    pub is_loading: bool,
    pub limits: SessionLimits,
    pub session_start_time: Option<DateTime<Utc>>,
    pub elapsed: Option<Duration>,
    pub time_limit: Duration,
    pub messages_since_insight: u32,
}

struct ActiveSession {
    user: UserContext,
    quota: SessionQuotaTracker,
    conversation: ConversationState,
}

pub struct SessionController {
    active: Mutex<ActiveSession>,
    storage: StorageAdapter,
    limits: LimitsConfig,
    chat: Arc<dyn ChatService>,
    limits_store: Arc<dyn SessionLimitsStore>,
    clock: Arc<dyn Clock>,
    archiver: SessionArchiver,
    insights: InsightGenerator,
    gallery: InsightGallery,
    background: BackgroundSettings,
}

impl SessionController {
    /// Loads quota and conversation state for `user`, seeding a greeting for
    /// the current window when nothing was saved.
    pub fn new(
        storage: StorageAdapter,
        limits: LimitsConfig,
        user: UserContext,
        services: SessionServices,
    ) -> Self {
        let gallery = InsightGallery::new(storage.clone());
        let active = Self::load_active(&storage, &limits, &services.limits_store, services.clock.as_ref(), user);

        Self {
            active: Mutex::new(active),
            archiver: SessionArchiver::new(storage.clone(), limits.archive_capacity),
            insights: InsightGenerator::new(services.insight, services.frame_capture, gallery.clone()),
            gallery,
            background: BackgroundSettings::new(storage.clone()),
            storage,
            limits,
            chat: services.chat,
            limits_store: services.limits_store,
            clock: services.clock,
        }
    }

    fn load_active(
        storage: &StorageAdapter,
        limits: &LimitsConfig,
        limits_store: &Arc<dyn SessionLimitsStore>,
        clock: &dyn Clock,
        user: UserContext,
    ) -> ActiveSession {
        let now = clock.now();
        let window = window::resolve_at(now.with_timezone(&Local), user.name());
        let mut quota = SessionQuotaTracker::load(limits_store.clone(), *limits, &user, now);
        let mut conversation = ConversationState::restore_or_seed(
            storage.clone(),
            &user,
            window.period,
            &window.greeting,
            now,
        );
        if !conversation.started_in(window.period, now) {
            tracing::info!(period = %window.period, "Saved conversation belongs to an earlier window, starting fresh");
            conversation.reset(&user, &mut quota, window.period, &window.greeting, now);
        }
        ActiveSession {
            user,
            quota,
            conversation,
        }
    }

    pub fn archiver(&self) -> &SessionArchiver {
        &self.archiver
    }

    pub fn gallery(&self) -> &InsightGallery {
        &self.gallery
    }

    pub fn background(&self) -> &BackgroundSettings {
        &self.background
    }

    pub async fn user(&self) -> UserContext {
        self.active.lock().await.user.clone()
    }

    /// Switches the user context.
    ///
    /// A change of storage backend (signing in or out) reloads everything
    /// from the new backend; a Pro change only re-applies the message limit.
    pub async fn set_user(&self, user: UserContext) {
        let mut active = self.active.lock().await;
        if active.user.is_authenticated() != user.is_authenticated() {
            tracing::info!(authenticated = user.is_authenticated(), "User context changed, reloading session");
            let mut next = Self::load_active(
                &self.storage,
                &self.limits,
                &self.limits_store,
                self.clock.as_ref(),
                user,
            );
            next.conversation.succeed(&active.conversation);
            *active = next;
            return;
        }

        let active = &mut *active;
        active.user = user;
        active.quota.apply_tier(&active.user);
    }

    /// The window for the current time and user.
    pub async fn window(&self) -> SessionWindow {
        let user = self.user().await;
        window::resolve_at(self.clock.now().with_timezone(&Local), user.name())
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        let now = self.clock.now();
        let active = self.active.lock().await;
        SessionSnapshot {
            user: active.user.clone(),
            session_type: active.conversation.session_type(),
            messages: active.conversation.messages().to_vec(),
            is_loading: active.conversation.is_loading(),
            limits: active.quota.limits().clone(),
            session_start_time: active.conversation.session_start_time(),
            elapsed: active.conversation.elapsed(now),
            time_limit: self.limits.session_time_limit(&active.user),
            messages_since_insight: active.conversation.messages_since_insight(),
        }
    }

    /// Sends a user message and waits for the reply.
    ///
    /// Rejections (busy, quota, time limit) and chat failures are reported in
    /// the outcome; this never errors.
    pub async fn send_message(&self, content: &str) -> SendOutcome {
        let pending = {
            let mut guard = self.active.lock().await;
            let active = &mut *guard;
            let time_limit = self.limits.session_time_limit(&active.user);
            match active.conversation.begin_send(
                &active.user,
                &mut active.quota,
                time_limit,
                content,
                self.clock.now(),
            ) {
                Ok(pending) => pending,
                Err(reason) => {
                    tracing::debug!(?reason, "Message rejected");
                    return SendOutcome::Rejected(reason);
                }
            }
        };

        let reply = self.chat.send_message(&pending.request).await;

        let mut guard = self.active.lock().await;
        let active = &mut *guard;
        active
            .conversation
            .complete_send(&active.user, pending, reply, self.clock.now())
    }

    /// Replaces the conversation with a fresh greeting for the current window.
    pub async fn reset_session(&self) {
        let now = self.clock.now();
        let mut guard = self.active.lock().await;
        let active = &mut *guard;
        let window = window::resolve_at(now.with_timezone(&Local), active.user.name());
        active.conversation.reset(
            &active.user,
            &mut active.quota,
            window.period,
            &window.greeting,
            now,
        );
        tracing::debug!(period = %window.period, "Session reset");
    }

    /// Ends the session: archives it, stamps the period as completed and
    /// starts a fresh conversation.
    ///
    /// The period is only stamped when the user actually said something.
    pub async fn end_session(&self) -> Option<ArchivedChatSession> {
        let now = self.clock.now();
        let mut guard = self.active.lock().await;
        let active = &mut *guard;

        let scene = self.background.scene(&active.user);
        let period = active.conversation.session_type();
        let archived = self.archiver.archive_current_session(
            &active.user,
            ArchiveRequest {
                session_type: period,
                scene_type: &scene,
                messages: active.conversation.messages(),
                session_start_time: active.conversation.session_start_time(),
                now,
            },
        );

        if active.conversation.messages().iter().any(Message::is_user) {
            active.quota.complete_session(&active.user, period, now);
        }

        let window = window::resolve_at(now.with_timezone(&Local), active.user.name());
        active.conversation.reset(
            &active.user,
            &mut active.quota,
            window.period,
            &window.greeting,
            now,
        );

        archived
    }

    /// Whether enough user messages accumulated since the last card.
    pub async fn should_offer_insight(&self) -> bool {
        let active = self.active.lock().await;
        active.conversation.messages_since_insight() >= self.limits.insight_threshold
    }

    /// Generates a card from the current conversation.
    ///
    /// Pass the archived session id to link the card to it.
    pub async fn generate_insight(&self, session_id: Option<String>) -> GeneratedInsight {
        self.generate_insight_from(None, session_id).await
    }

    /// Generates a card for an archived session's transcript.
    pub async fn generate_insight_for_archived(&self, archived: &ArchivedChatSession) -> GeneratedInsight {
        self.generate_insight_from(
            Some((archived.messages.clone(), archived.session_type)),
            Some(archived.id.clone()),
        )
        .await
    }

    async fn generate_insight_from(
        &self,
        transcript: Option<(Vec<Message>, SessionType)>,
        session_id: Option<String>,
    ) -> GeneratedInsight {
        let (user, messages, session_type) = {
            let mut active = self.active.lock().await;
            let (messages, session_type) = match transcript {
                Some(transcript) => transcript,
                None => {
                    active.conversation.reset_insight_counter();
                    (
                        active.conversation.messages().to_vec(),
                        active.conversation.session_type(),
                    )
                }
            };
            (active.user.clone(), messages, session_type)
        };

        let input = InsightInput {
            messages,
            session_type,
            scene_type: self.background.scene(&user),
            session_id: session_id.clone(),
            capture_still: self.background.video_enabled(&user),
            now: self.clock.now(),
        };
        let generated = self.insights.generate_insight_card(&user, input).await;

        if let Some(session_id) = session_id {
            if user.is_authenticated() {
                if let Err(e) = self
                    .archiver
                    .attach_insight(&user, &session_id, &generated.card.id)
                {
                    tracing::warn!(error = %e, "Failed to link insight card to archived session");
                }
            }
        }

        generated
    }

    pub async fn has_completed_today(&self, period: SessionType) -> bool {
        let active = self.active.lock().await;
        active.quota.has_completed_today(period, self.clock.now())
    }

    pub async fn has_completed_both_today(&self) -> bool {
        let active = self.active.lock().await;
        active
            .quota
            .has_completed_both_today(&active.user, self.clock.now())
    }

    pub async fn next_session_start(&self) -> DateTime<Local> {
        let active = self.active.lock().await;
        window::next_session_start(self.clock.now().with_timezone(&Local), active.quota.limits())
    }
}
