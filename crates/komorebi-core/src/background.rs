//! Background scene settings.

use crate::session::SceneType;
use crate::storage::{StorageAdapter, keys};
use crate::user::UserContext;
use serde::Deserialize;

/// Persisted scene choice and video-background toggle.
#[derive(Clone)]
pub struct BackgroundSettings {
    storage: StorageAdapter,
}

/// `video-background-enabled` was written both as a JSON boolean and as the
/// strings `"true"`/`"false"`.
#[derive(Deserialize)]
#[serde(untagged)]
enum StoredFlag {
    Bool(bool),
    Text(String),
}

impl BackgroundSettings {
    pub fn new(storage: StorageAdapter) -> Self {
        Self { storage }
    }

    pub fn scene(&self, user: &UserContext) -> SceneType {
        self.storage
            .get::<SceneType>(user, keys::CURRENT_SCENE)
            .filter(|scene| !scene.as_str().trim().is_empty())
            .unwrap_or_default()
    }

    pub fn set_scene(&self, user: &UserContext, scene: &SceneType) {
        self.storage.set(user, keys::CURRENT_SCENE, scene);
    }

    /// Defaults to enabled.
    pub fn video_enabled(&self, user: &UserContext) -> bool {
        match self.storage.get::<StoredFlag>(user, keys::VIDEO_BACKGROUND_ENABLED) {
            Some(StoredFlag::Bool(enabled)) => enabled,
            Some(StoredFlag::Text(text)) => !text.trim().eq_ignore_ascii_case("false"),
            None => true,
        }
    }

    pub fn set_video_enabled(&self, user: &UserContext, enabled: bool) {
        self.storage.set(user, keys::VIDEO_BACKGROUND_ENABLED, &enabled);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = BackgroundSettings::new(StorageAdapter::in_memory());
        let user = UserContext::Guest;
        assert_eq!(settings.scene(&user), SceneType::default());
        assert!(settings.video_enabled(&user));
    }

    #[test]
    fn test_round_trip_and_legacy_strings() {
        let storage = StorageAdapter::in_memory();
        let settings = BackgroundSettings::new(storage.clone());
        let user = UserContext::authenticated(None, false);

        settings.set_scene(&user, &SceneType::new("ocean"));
        settings.set_video_enabled(&user, false);
        assert_eq!(settings.scene(&user).as_str(), "ocean");
        assert!(!settings.video_enabled(&user));

        storage
            .set_raw(&user, keys::VIDEO_BACKGROUND_ENABLED, "\"false\"".to_string())
            .unwrap();
        assert!(!settings.video_enabled(&user));
        storage
            .set_raw(&user, keys::VIDEO_BACKGROUND_ENABLED, "\"true\"".to_string())
            .unwrap();
        assert!(settings.video_enabled(&user));
    }
}
