use chrono::{TimeZone, Utc};
use komorebi_core::UserContext;
use komorebi_core::config::LimitsConfig;
use komorebi_core::session::{SessionLimits, SessionLimitsStore, SessionQuotaTracker, SessionType};
use komorebi_core::storage::{StorageAdapter, keys};
use komorebi_infrastructure::VersionedLimitsStore;
use std::sync::Arc;

fn user() -> UserContext {
    UserContext::authenticated(None, false)
}

fn store_with(raw: &str) -> (VersionedLimitsStore, StorageAdapter) {
    let storage = StorageAdapter::in_memory();
    storage
        .set_raw(&user(), keys::SESSION_LIMITS, raw.to_string())
        .unwrap();
    (VersionedLimitsStore::new(storage.clone()), storage)
}

#[test]
fn test_missing_record_is_none() {
    let store = VersionedLimitsStore::new(StorageAdapter::in_memory());
    assert_eq!(store.load(&user()).unwrap(), None);
}

#[test]
fn test_v1_0_0_record_migrates() {
    let (store, _) = store_with(
        r#"{"version":"1.0.0","morningCompleted":true,"eveningCompleted":false,"messagesUsed":3,"maxMessages":4}"#,
    );

    let limits = store.load(&user()).unwrap().unwrap();
    assert_eq!(limits.messages_used, 3);
    assert_eq!(limits.max_messages, 4);
    assert!(limits.morning_completed);
    assert_eq!(limits.last_morning_session, None);
    assert_eq!(limits.last_evening_session, None);
}

#[test]
fn test_unversioned_record_reads_as_latest() {
    let (store, _) = store_with(
        r#"{"morningCompleted":false,"eveningCompleted":true,"messagesUsed":1,"maxMessages":4,"lastEveningSession":"2025-03-01T20:15:00Z"}"#,
    );

    let limits = store.load(&user()).unwrap().unwrap();
    assert_eq!(limits.messages_used, 1);
    assert_eq!(
        limits.last_evening_session,
        Some(Utc.with_ymd_and_hms(2025, 3, 1, 20, 15, 0).unwrap())
    );
}

#[test]
fn test_save_writes_latest_version() {
    let storage = StorageAdapter::in_memory();
    let store = VersionedLimitsStore::new(storage.clone());
    let mut limits = SessionLimits::new(4);
    limits.messages_used = 2;
    limits.last_morning_session = Some(Utc.with_ymd_and_hms(2025, 3, 2, 7, 0, 0).unwrap());

    store.save(&user(), &limits).unwrap();

    let raw = storage.get_raw(&user(), keys::SESSION_LIMITS).unwrap().unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["version"], "1.1.0");
    assert_eq!(value["messagesUsed"], 2);
    assert!(value.get("lastMorningSession").is_some());

    assert_eq!(store.load(&user()).unwrap(), Some(limits));
}

#[test]
fn test_non_object_record_is_error() {
    let (store, _) = store_with("[1, 2, 3]");
    assert!(store.load(&user()).unwrap_err().is_serialization());
}

#[test]
fn test_tracker_over_versioned_store() {
    let (store, _) = store_with(
        r#"{"version":"1.0.0","morningCompleted":true,"eveningCompleted":true,"messagesUsed":4,"maxMessages":4}"#,
    );
    let store = Arc::new(store);
    let now = Utc::now();

    let mut tracker = SessionQuotaTracker::load(store.clone(), LimitsConfig::default(), &user(), now);
    // Flags from a V1.0.0 record have no date attached and are cleared.
    assert!(!tracker.limits().morning_completed);
    assert!(!tracker.can_send(&user()));

    tracker.complete_session(&user(), SessionType::Morning, now);
    let reloaded = SessionQuotaTracker::load(store, LimitsConfig::default(), &user(), now);
    assert!(reloaded.has_completed_today(SessionType::Morning, now));
    assert_eq!(reloaded.limits().messages_used, 0);
}
