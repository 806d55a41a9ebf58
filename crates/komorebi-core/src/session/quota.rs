//! Session quota tracking.
//!
//! Tracks how many messages the current session has used and which periods
//! were completed today. Free-tier users are limited; Pro users are not.

use super::model::{SessionLimits, SessionType};
use crate::config::LimitsConfig;
use crate::error::Result;
use crate::storage::{StorageAdapter, keys};
use crate::user::UserContext;
use chrono::{DateTime, Local, Utc};
use std::sync::Arc;

/// Persistence for [`SessionLimits`].
///
/// The infrastructure layer provides a versioned implementation; the plain
/// JSON one below is enough when no legacy records exist.
pub trait SessionLimitsStore: Send + Sync {
    fn load(&self, user: &UserContext) -> Result<Option<SessionLimits>>;

    fn save(&self, user: &UserContext, limits: &SessionLimits) -> Result<()>;
}

/// Stores limits as plain JSON under `session-limits`.
#[derive(Clone)]
pub struct PlainLimitsStore {
    storage: StorageAdapter,
}

impl PlainLimitsStore {
    pub fn new(storage: StorageAdapter) -> Self {
        Self { storage }
    }
}

impl SessionLimitsStore for PlainLimitsStore {
    fn load(&self, user: &UserContext) -> Result<Option<SessionLimits>> {
        self.storage.try_get(user, keys::SESSION_LIMITS)
    }

    fn save(&self, user: &UserContext, limits: &SessionLimits) -> Result<()> {
        self.storage.try_set(user, keys::SESSION_LIMITS, limits)
    }
}

/// Owns the quota state for one user context.
pub struct SessionQuotaTracker {
    store: Arc<dyn SessionLimitsStore>,
    config: LimitsConfig,
    limits: SessionLimits,
}

impl SessionQuotaTracker {
    /// Loads persisted limits, falling back to a fresh record.
    ///
    /// `max_messages` is always recomputed from the user's tier, and the
    /// daily completion flags are refreshed against `now`.
    pub fn load(
        store: Arc<dyn SessionLimitsStore>,
        config: LimitsConfig,
        user: &UserContext,
        now: DateTime<Utc>,
    ) -> Self {
        let max_messages = config.max_messages_for(user);
        let mut limits = match store.load(user) {
            Ok(Some(limits)) => limits,
            Ok(None) => SessionLimits::new(max_messages),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load session limits, using defaults");
                SessionLimits::new(max_messages)
            }
        };
        limits.max_messages = max_messages;

        let mut tracker = Self {
            store,
            config,
            limits,
        };
        tracker.refresh_completion(now);
        tracker
    }

    pub fn limits(&self) -> &SessionLimits {
        &self.limits
    }

    /// Replaces the limits and persists them. Write failures are logged.
    pub fn save_limits(&mut self, user: &UserContext, next: SessionLimits) {
        self.limits = next;
        if let Err(e) = self.store.save(user, &self.limits) {
            tracing::warn!(error = %e, "Failed to persist session limits");
        }
    }

    /// Re-applies the tier limit after the user's Pro status changed.
    pub fn apply_tier(&mut self, user: &UserContext) {
        let max_messages = self.config.max_messages_for(user);
        if self.limits.max_messages != max_messages {
            tracing::debug!(max_messages, "Message limit changed with tier");
            let mut next = self.limits.clone();
            next.max_messages = max_messages;
            self.save_limits(user, next);
        }
    }

    /// Whether another message may be sent. Pro users are never limited.
    pub fn can_send(&self, user: &UserContext) -> bool {
        user.is_pro() || !self.limits.is_exhausted()
    }

    pub fn record_message(&mut self, user: &UserContext) {
        let mut next = self.limits.clone();
        next.messages_used = next.messages_used.saturating_add(1);
        self.save_limits(user, next);
    }

    pub fn reset_messages(&mut self, user: &UserContext) {
        let mut next = self.limits.clone();
        next.messages_used = 0;
        self.save_limits(user, next);
    }

    /// Marks `period` completed at `now` and resets the message count.
    pub fn complete_session(&mut self, user: &UserContext, period: SessionType, now: DateTime<Utc>) {
        let mut next = self.limits.clone();
        match period {
            SessionType::Morning => {
                next.last_morning_session = Some(now);
                next.morning_completed = true;
            }
            SessionType::Evening => {
                next.last_evening_session = Some(now);
                next.evening_completed = true;
            }
        }
        next.messages_used = 0;
        tracing::info!(%period, "Session completed");
        self.save_limits(user, next);
    }

    pub fn has_completed_today(&self, period: SessionType, now: DateTime<Utc>) -> bool {
        self.limits
            .completed_on(period, now.with_timezone(&Local).date_naive())
    }

    /// Both periods done today. Always false for Pro users, who may keep going.
    pub fn has_completed_both_today(&self, user: &UserContext, now: DateTime<Utc>) -> bool {
        !user.is_pro()
            && self.has_completed_today(SessionType::Morning, now)
            && self.has_completed_today(SessionType::Evening, now)
    }

    fn refresh_completion(&mut self, now: DateTime<Utc>) {
        self.limits.morning_completed = self.has_completed_today(SessionType::Morning, now);
        self.limits.evening_completed = self.has_completed_today(SessionType::Evening, now);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn tracker_for(user: &UserContext) -> (SessionQuotaTracker, StorageAdapter) {
        let storage = StorageAdapter::in_memory();
        let store = Arc::new(PlainLimitsStore::new(storage.clone()));
        let tracker = SessionQuotaTracker::load(store, LimitsConfig::default(), user, Utc::now());
        (tracker, storage)
    }

    #[test]
    fn test_defaults_by_tier() {
        let (free, _) = tracker_for(&UserContext::authenticated(None, false));
        assert_eq!(free.limits().max_messages, 4);
        assert_eq!(free.limits().messages_used, 0);

        let (pro, _) = tracker_for(&UserContext::authenticated(None, true));
        assert_eq!(pro.limits().max_messages, 999);
    }

    #[test]
    fn test_free_user_exhausts_quota() {
        let user = UserContext::authenticated(None, false);
        let (mut tracker, _) = tracker_for(&user);
        for _ in 0..4 {
            assert!(tracker.can_send(&user));
            tracker.record_message(&user);
        }
        assert_eq!(tracker.limits().messages_used, 4);
        assert!(!tracker.can_send(&user));
    }

    #[test]
    fn test_pro_never_blocked() {
        let user = UserContext::authenticated(None, true);
        let (mut tracker, _) = tracker_for(&user);
        let mut limits = tracker.limits().clone();
        limits.messages_used = limits.max_messages;
        tracker.save_limits(&user, limits);
        assert!(tracker.can_send(&user));
    }

    #[test]
    fn test_apply_tier_recomputes_max() {
        let free = UserContext::authenticated(None, false);
        let (mut tracker, storage) = tracker_for(&free);
        let pro = free.with_pro(true);
        tracker.apply_tier(&pro);
        assert_eq!(tracker.limits().max_messages, 999);

        let stored: SessionLimits = storage.get(&pro, keys::SESSION_LIMITS).unwrap();
        assert_eq!(stored.max_messages, 999);
    }

    #[test]
    fn test_complete_session_stamps_and_resets() {
        let user = UserContext::authenticated(None, false);
        let (mut tracker, _) = tracker_for(&user);
        tracker.record_message(&user);
        tracker.record_message(&user);

        let now = Utc::now();
        tracker.complete_session(&user, SessionType::Morning, now);

        assert_eq!(tracker.limits().messages_used, 0);
        assert_eq!(tracker.limits().last_morning_session, Some(now));
        assert!(tracker.limits().morning_completed);
        assert!(tracker.has_completed_today(SessionType::Morning, now));
        assert!(!tracker.has_completed_today(SessionType::Evening, now));
    }

    #[test]
    fn test_completed_both_today() {
        let user = UserContext::authenticated(None, false);
        let (mut tracker, _) = tracker_for(&user);
        let now = Utc::now();
        tracker.complete_session(&user, SessionType::Morning, now);
        assert!(!tracker.has_completed_both_today(&user, now));
        tracker.complete_session(&user, SessionType::Evening, now);
        assert!(tracker.has_completed_both_today(&user, now));
        assert!(!tracker.has_completed_both_today(&user.with_pro(true), now));
    }

    #[test]
    fn test_stale_completion_flags_refreshed_on_load() {
        let user = UserContext::authenticated(None, false);
        let storage = StorageAdapter::in_memory();
        let mut limits = SessionLimits::new(4);
        limits.morning_completed = true;
        limits.last_morning_session = Some(Utc::now() - Duration::days(3));
        storage.set(&user, keys::SESSION_LIMITS, &limits);

        let store = Arc::new(PlainLimitsStore::new(storage));
        let tracker = SessionQuotaTracker::load(store, LimitsConfig::default(), &user, Utc::now());
        assert!(!tracker.limits().morning_completed);
    }

    #[test]
    fn test_corrupt_limits_fall_back_to_default() {
        let user = UserContext::authenticated(None, false);
        let storage = StorageAdapter::in_memory();
        storage
            .set_raw(&user, keys::SESSION_LIMITS, "[]".to_string())
            .unwrap();
        let store = Arc::new(PlainLimitsStore::new(storage));
        let tracker = SessionQuotaTracker::load(store, LimitsConfig::default(), &user, Utc::now());
        assert_eq!(tracker.limits(), &SessionLimits::new(4));
    }
}
