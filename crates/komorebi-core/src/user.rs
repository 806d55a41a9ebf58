//! User context.
//!
//! Every session operation is evaluated against a [`UserContext`]: it picks
//! the storage backend, decides whether quotas apply and whether archives and
//! insight cards are persisted.

use serde::{Deserialize, Serialize};

/// Who is using the app right now.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum UserContext {
    /// Nobody signed in and guest mode not chosen.
    #[default]
    Anonymous,
    /// Explicit guest mode; data lives only as long as the tab.
    Guest,
    /// A signed-in account.
    Authenticated {
        #[serde(default)]
        is_pro: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
}

impl UserContext {
    pub fn authenticated(name: Option<String>, is_pro: bool) -> Self {
        Self::Authenticated { is_pro, name }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated { .. })
    }

    pub fn is_guest(&self) -> bool {
        matches!(self, Self::Guest)
    }

    pub fn is_pro(&self) -> bool {
        matches!(self, Self::Authenticated { is_pro: true, .. })
    }

    /// Display name used to personalize greetings and chat requests.
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Authenticated { name, .. } => name.as_deref(),
            _ => None,
        }
    }

    /// Returns a copy with the Pro flag changed. No-op for non-authenticated users.
    pub fn with_pro(&self, is_pro: bool) -> Self {
        match self {
            Self::Authenticated { name, .. } => Self::Authenticated {
                is_pro,
                name: name.clone(),
            },
            other => other.clone(),
        }
    }
}
