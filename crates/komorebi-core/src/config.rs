//! Configuration models.
//!
//! Loaded from `config.toml` by the infrastructure layer; every field has a
//! default so a partial (or empty) file is valid.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::user::UserContext;

#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct KomorebiConfig {
    #[serde(default)]
    pub endpoints: EndpointConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Remote chat and insight services.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct EndpointConfig {
    #[serde(default = "default_chat_url")]
    pub chat_url: String,
    #[serde(default = "default_insight_url")]
    pub insight_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_chat_url() -> String {
    "http://localhost:54321/functions/v1/chat".to_string()
}

fn default_insight_url() -> String {
    "http://localhost:54321/functions/v1/generate-insight".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            chat_url: default_chat_url(),
            insight_url: default_insight_url(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Free-tier and Pro limits.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct LimitsConfig {
    pub free_max_messages: u32,
    pub pro_max_messages: u32,
    pub free_session_minutes: i64,
    pub pro_session_minutes: i64,
    pub archive_capacity: usize,
    /// User messages since the last card before a new insight is offered.
    pub insight_threshold: u32,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            free_max_messages: 4,
            pro_max_messages: 999,
            free_session_minutes: 15,
            pro_session_minutes: 60,
            archive_capacity: 50,
            insight_threshold: 3,
        }
    }
}

impl LimitsConfig {
    pub fn max_messages_for(&self, user: &UserContext) -> u32 {
        if user.is_pro() {
            self.pro_max_messages
        } else {
            self.free_max_messages
        }
    }

    pub fn session_time_limit(&self, user: &UserContext) -> Duration {
        if user.is_pro() {
            Duration::minutes(self.pro_session_minutes)
        } else {
            Duration::minutes(self.free_session_minutes)
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    /// Overrides the platform data directory for the persistent store.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
    /// Write coalescing window for the persistent store (0 disables it).
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    250
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            debounce_ms: default_debounce_ms(),
        }
    }
}
