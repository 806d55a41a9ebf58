use async_trait::async_trait;
use chrono::{DateTime, Duration, Local, Utc};
use komorebi_core::clock::ManualClock;
use komorebi_core::config::LimitsConfig;
use komorebi_core::error::{KomorebiError, Result};
use komorebi_core::insight::QuoteSource;
use komorebi_core::remote::{
    ChatReply, ChatRequest, ChatService, InsightReply, InsightRequest, InsightService,
    NoFrameCapture,
};
use komorebi_core::session::{
    APOLOGY_MESSAGE, PlainLimitsStore, RejectReason, SendOutcome, SessionController,
    SessionServices, SessionType,
};
use komorebi_core::storage::StorageAdapter;
use komorebi_core::UserContext;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

/// Echoes the user message back.
struct EchoChat {
    calls: AtomicUsize,
}

#[async_trait]
impl ChatService for EchoChat {
    async fn send_message(&self, request: &ChatRequest) -> Result<ChatReply> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChatReply {
            message: format!("You said: {}", request.message),
            timestamp: None,
        })
    }
}

struct FailingChat;

#[async_trait]
impl ChatService for FailingChat {
    async fn send_message(&self, _request: &ChatRequest) -> Result<ChatReply> {
        Err(KomorebiError::remote("chat", "HTTP 503"))
    }
}

/// Holds every reply until released.
struct GatedChat {
    started: Notify,
    release: Notify,
}

#[async_trait]
impl ChatService for GatedChat {
    async fn send_message(&self, _request: &ChatRequest) -> Result<ChatReply> {
        self.started.notify_one();
        self.release.notified().await;
        Ok(ChatReply {
            message: "late reply".to_string(),
            timestamp: None,
        })
    }
}

struct FailingInsight;

#[async_trait]
impl InsightService for FailingInsight {
    async fn generate_quote(&self, _request: &InsightRequest) -> Result<InsightReply> {
        Err(KomorebiError::remote("insight", "timeout"))
    }
}

struct Harness {
    controller: Arc<SessionController>,
    clock: Arc<ManualClock>,
}

fn harness(user: UserContext, chat: Arc<dyn ChatService>) -> Harness {
    harness_at(StorageAdapter::in_memory(), user, chat, Utc::now())
}

fn harness_at(
    storage: StorageAdapter,
    user: UserContext,
    chat: Arc<dyn ChatService>,
    now: DateTime<Utc>,
) -> Harness {
    let clock = Arc::new(ManualClock::new(now));
    let services = SessionServices {
        chat,
        insight: Arc::new(FailingInsight),
        frame_capture: Arc::new(NoFrameCapture),
        limits_store: Arc::new(PlainLimitsStore::new(storage.clone())),
        clock: clock.clone(),
    };
    let controller = SessionController::new(storage, LimitsConfig::default(), user, services);
    Harness {
        controller: Arc::new(controller),
        clock,
    }
}

fn echo() -> Arc<dyn ChatService> {
    Arc::new(EchoChat {
        calls: AtomicUsize::new(0),
    })
}

#[tokio::test]
async fn free_user_is_limited_to_four_messages() {
    let chat = Arc::new(EchoChat {
        calls: AtomicUsize::new(0),
    });
    let h = harness(UserContext::authenticated(None, false), chat.clone());

    for i in 1..=4 {
        let outcome = h.controller.send_message(&format!("message {}", i)).await;
        assert!(matches!(outcome, SendOutcome::Delivered { fell_back: false, .. }));
        assert_eq!(h.controller.snapshot().await.limits.messages_used, i);
    }

    let outcome = h.controller.send_message("one more").await;
    assert_eq!(outcome, SendOutcome::Rejected(RejectReason::QuotaExhausted));
    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.limits.messages_used, 4);
    assert_eq!(snapshot.messages.len(), 9);
    assert_eq!(chat.calls.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn pro_user_is_not_limited_by_count() {
    let h = harness(UserContext::authenticated(None, true), echo());
    for i in 0..6 {
        let outcome = h.controller.send_message(&format!("message {}", i)).await;
        assert!(matches!(outcome, SendOutcome::Delivered { .. }));
    }
    assert_eq!(h.controller.snapshot().await.limits.max_messages, 999);
}

#[tokio::test]
async fn time_limit_rejects_sends() {
    let h = harness(UserContext::Guest, echo());
    h.controller.send_message("hello").await;

    h.clock.advance(Duration::minutes(16));
    let outcome = h.controller.send_message("still there?").await;
    assert_eq!(outcome, SendOutcome::Rejected(RejectReason::TimeLimitReached));
}

#[tokio::test]
async fn pro_time_limit_is_an_hour() {
    let h = harness(UserContext::authenticated(None, true), echo());
    h.controller.send_message("hello").await;

    h.clock.advance(Duration::minutes(30));
    assert!(matches!(
        h.controller.send_message("still here").await,
        SendOutcome::Delivered { .. }
    ));

    h.clock.advance(Duration::minutes(31));
    assert_eq!(
        h.controller.send_message("and now?").await,
        SendOutcome::Rejected(RejectReason::TimeLimitReached)
    );
}

#[tokio::test]
async fn chat_failure_appends_apology() {
    let h = harness(UserContext::Guest, Arc::new(FailingChat));
    let outcome = h.controller.send_message("hello").await;
    match outcome {
        SendOutcome::Delivered { reply, fell_back } => {
            assert!(fell_back);
            assert_eq!(reply.content, APOLOGY_MESSAGE);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn reset_leaves_only_greeting() {
    let h = harness(UserContext::authenticated(None, false), echo());
    h.controller.send_message("one").await;
    h.controller.send_message("two").await;

    h.controller.reset_session().await;

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.limits.messages_used, 0);
    assert!(snapshot.session_start_time.is_none());
}

#[tokio::test]
async fn reply_after_reset_is_discarded() {
    let chat = Arc::new(GatedChat {
        started: Notify::new(),
        release: Notify::new(),
    });
    let h = harness(UserContext::Guest, chat.clone());

    let controller = h.controller.clone();
    let send = tokio::spawn(async move { controller.send_message("hello").await });

    chat.started.notified().await;
    assert_eq!(
        h.controller.send_message("second").await,
        SendOutcome::Rejected(RejectReason::Busy)
    );
    h.controller.reset_session().await;
    chat.release.notify_one();

    assert_eq!(send.await.unwrap(), SendOutcome::Discarded);
    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert!(!snapshot.is_loading);
}

#[tokio::test]
async fn end_session_archives_and_completes_period() {
    let h = harness(UserContext::authenticated(None, false), echo());
    let period = h.controller.snapshot().await.session_type;
    h.controller.send_message("I feel calm").await;

    let archived = h.controller.end_session().await.expect("session archived");
    assert_eq!(archived.message_count, 1);
    assert_eq!(archived.messages.len(), 2);
    assert_eq!(h.controller.archiver().list(&UserContext::authenticated(None, false)).len(), 1);
    assert!(h.controller.has_completed_today(period).await);

    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.limits.messages_used, 0);
}

#[tokio::test]
async fn end_session_with_only_greeting_is_noop() {
    let h = harness(UserContext::authenticated(None, false), echo());
    let period = h.controller.snapshot().await.session_type;
    assert!(h.controller.end_session().await.is_none());
    assert!(!h.controller.has_completed_today(period).await);
}

fn local_today_at(hour: u32) -> DateTime<Utc> {
    Local::now()
        .date_naive()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
        .and_local_timezone(Local)
        .earliest()
        .unwrap()
        .with_timezone(&Utc)
}

#[tokio::test]
async fn completing_both_periods_today() {
    let user = UserContext::authenticated(None, false);
    let h = harness(user.clone(), echo());

    h.clock.set(local_today_at(8));
    h.controller.reset_session().await;
    assert_eq!(h.controller.snapshot().await.session_type, SessionType::Morning);
    h.controller.send_message("slow start today").await;
    h.controller.end_session().await.expect("morning archived");
    assert!(h.controller.has_completed_today(SessionType::Morning).await);
    assert!(!h.controller.has_completed_both_today().await);

    h.clock.set(local_today_at(18));
    h.controller.reset_session().await;
    assert_eq!(h.controller.snapshot().await.session_type, SessionType::Evening);
    h.controller.send_message("long day").await;
    h.controller.end_session().await.expect("evening archived");

    assert!(h.controller.has_completed_both_today().await);
    assert_eq!(h.controller.archiver().list(&user).len(), 2);

    h.controller.set_user(user.with_pro(true)).await;
    assert!(!h.controller.has_completed_both_today().await);
}

#[tokio::test]
async fn insight_offered_after_threshold_and_always_has_quote() {
    let h = harness(UserContext::authenticated(None, false), echo());
    assert!(!h.controller.should_offer_insight().await);
    for text in ["work was stressful", "a long meeting", "but I'm okay"] {
        h.controller.send_message(text).await;
    }
    assert!(h.controller.should_offer_insight().await);

    let generated = h.controller.generate_insight(None).await;
    assert_eq!(generated.source, QuoteSource::Fallback);
    assert!(!generated.card.quote.is_empty());
    assert!(generated.stored);
    assert!(!h.controller.should_offer_insight().await);
}

#[tokio::test]
async fn insight_links_to_archived_session() {
    let user = UserContext::authenticated(None, false);
    let h = harness(user.clone(), echo());
    h.controller.send_message("grateful for tea").await;
    let archived = h.controller.end_session().await.unwrap();

    let generated = h.controller.generate_insight_for_archived(&archived).await;
    assert_eq!(generated.reference.session_id, archived.id);

    let linked = h.controller.archiver().find(&user, &archived.id).unwrap();
    assert_eq!(linked.insight_card_id, Some(generated.card.id.clone()));
    assert_eq!(h.controller.gallery().list(&user).len(), 1);
}

#[tokio::test]
async fn upgrading_to_pro_lifts_quota() {
    let free = UserContext::authenticated(Some("Aiko".to_string()), false);
    let h = harness(free.clone(), echo());
    for i in 0..4 {
        h.controller.send_message(&format!("m{}", i)).await;
    }
    assert_eq!(
        h.controller.send_message("blocked").await,
        SendOutcome::Rejected(RejectReason::QuotaExhausted)
    );

    h.controller.set_user(free.with_pro(true)).await;
    assert!(matches!(
        h.controller.send_message("unblocked").await,
        SendOutcome::Delivered { .. }
    ));
    assert_eq!(h.controller.snapshot().await.limits.max_messages, 999);
}

#[tokio::test]
async fn signing_in_switches_storage_backend() {
    let h = harness(UserContext::Guest, echo());
    h.controller.send_message("guest words").await;
    assert_eq!(h.controller.snapshot().await.messages.len(), 3);

    h.controller
        .set_user(UserContext::authenticated(None, false))
        .await;
    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(snapshot.limits.messages_used, 0);
}

#[tokio::test]
async fn reopening_in_same_window_restores_conversation() {
    let storage = StorageAdapter::in_memory();
    let user = UserContext::authenticated(None, false);

    let first = harness_at(storage.clone(), user.clone(), echo(), local_today_at(9));
    first.controller.send_message("morning thoughts").await;
    drop(first);

    let reopened = harness_at(storage, user, echo(), local_today_at(10));
    let snapshot = reopened.controller.snapshot().await;
    assert_eq!(snapshot.session_type, SessionType::Morning);
    assert_eq!(snapshot.messages.len(), 3);
    assert_eq!(snapshot.limits.messages_used, 1);
}

#[tokio::test]
async fn reopening_in_later_window_starts_fresh() {
    let storage = StorageAdapter::in_memory();
    let user = UserContext::authenticated(None, false);

    let morning = harness_at(storage.clone(), user.clone(), echo(), local_today_at(10));
    morning.controller.send_message("morning thoughts").await;
    drop(morning);

    let h = harness_at(storage, user.clone(), echo(), local_today_at(15));
    let snapshot = h.controller.snapshot().await;
    assert_eq!(snapshot.session_type, SessionType::Evening);
    assert_eq!(snapshot.messages.len(), 1);
    assert!(snapshot.session_start_time.is_none());
    assert_eq!(snapshot.limits.messages_used, 0);

    assert!(matches!(
        h.controller.send_message("afternoon now").await,
        SendOutcome::Delivered { .. }
    ));
    let archived = h.controller.end_session().await.expect("evening archived");
    assert_eq!(archived.session_type, SessionType::Evening);
    assert!(archived.messages.iter().all(|m| m.content != "morning thoughts"));
    assert!(!h.controller.has_completed_today(SessionType::Morning).await);
    assert!(h.controller.has_completed_today(SessionType::Evening).await);
}

#[tokio::test]
async fn auth_round_trip_keeps_single_send_in_flight() {
    let chat = Arc::new(GatedChat {
        started: Notify::new(),
        release: Notify::new(),
    });
    let user = UserContext::authenticated(None, false);
    let h = harness(user.clone(), chat.clone());

    let controller = h.controller.clone();
    let first = tokio::spawn(async move { controller.send_message("first").await });
    chat.started.notified().await;

    h.controller.set_user(UserContext::Guest).await;
    assert_eq!(
        h.controller.send_message("as guest").await,
        SendOutcome::Rejected(RejectReason::Busy)
    );
    h.controller.set_user(user).await;
    assert_eq!(
        h.controller.send_message("second").await,
        SendOutcome::Rejected(RejectReason::Busy)
    );

    chat.release.notify_one();
    assert_eq!(first.await.unwrap(), SendOutcome::Discarded);
    assert!(!h.controller.snapshot().await.is_loading);

    chat.release.notify_one();
    assert!(matches!(
        h.controller.send_message("second").await,
        SendOutcome::Delivered { .. }
    ));
    let contents: Vec<String> = h
        .controller
        .snapshot()
        .await
        .messages
        .into_iter()
        .skip(1)
        .map(|m| m.content)
        .collect();
    assert_eq!(contents, ["first", "second", "late reply"]);
}

#[tokio::test]
async fn archived_insight_keeps_live_insight_counter() {
    let user = UserContext::authenticated(None, false);
    let h = harness(user, echo());
    h.controller.send_message("a quiet walk").await;
    let archived = h.controller.end_session().await.expect("session archived");

    for text in ["tea", "rain", "music"] {
        h.controller.send_message(text).await;
    }
    assert!(h.controller.should_offer_insight().await);

    h.controller.generate_insight_for_archived(&archived).await;
    assert!(h.controller.should_offer_insight().await);

    h.controller.generate_insight(None).await;
    assert!(!h.controller.should_offer_insight().await);
}
