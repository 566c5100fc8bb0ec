use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use crate::config::defaults::RECENT_CHANNELS_LIMIT;
use crate::models::{UserSettings, UserSettingsPatch};

/// Point-in-time copy of the user's preferences
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct PreferencesSnapshot {
    pub favorites: Vec<String>,
    /// Most recent first
    pub recent_channels: Vec<String>,
    pub settings: UserSettings,
}

/// In-memory favorites, recently viewed channels and settings.
/// Hydrated from configuration at startup; never written back.
#[derive(Clone, Default)]
pub struct PreferenceStore {
    inner: Arc<RwLock<PreferencesSnapshot>>,
}

impl PreferenceStore {
    pub fn new(settings: UserSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(PreferencesSnapshot {
                settings,
                ..Default::default()
            })),
        }
    }

    pub async fn snapshot(&self) -> PreferencesSnapshot {
        self.inner.read().await.clone()
    }

    pub async fn settings(&self) -> UserSettings {
        self.inner.read().await.settings.clone()
    }

    /// Add or remove a favorite. Returns whether the channel is now a favorite.
    pub async fn toggle_favorite(&self, channel_id: &str) -> bool {
        let mut prefs = self.inner.write().await;
        if let Some(pos) = prefs.favorites.iter().position(|id| id == channel_id) {
            prefs.favorites.remove(pos);
            debug!("Removed favorite {}", channel_id);
            false
        } else {
            prefs.favorites.push(channel_id.to_string());
            debug!("Added favorite {}", channel_id);
            true
        }
    }

    /// Move a channel to the front of the recent list
    pub async fn add_recent(&self, channel_id: &str) -> Vec<String> {
        let mut prefs = self.inner.write().await;
        prefs.recent_channels.retain(|id| id != channel_id);
        prefs.recent_channels.insert(0, channel_id.to_string());
        prefs.recent_channels.truncate(RECENT_CHANNELS_LIMIT);
        prefs.recent_channels.clone()
    }

    pub async fn update_settings(&self, patch: UserSettingsPatch) -> UserSettings {
        let mut prefs = self.inner.write().await;
        prefs.settings.apply(patch);
        prefs.settings.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QualitySelection;

    #[tokio::test]
    async fn test_toggle_favorite() {
        let store = PreferenceStore::default();
        assert!(store.toggle_favorite("iptv-1").await);
        assert!(store.toggle_favorite("iptv-2").await);
        assert!(!store.toggle_favorite("iptv-1").await);
        assert_eq!(store.snapshot().await.favorites, vec!["iptv-2".to_string()]);
    }

    #[tokio::test]
    async fn test_recent_is_deduplicated_and_capped() {
        let store = PreferenceStore::default();
        for i in 0..12 {
            store.add_recent(&format!("iptv-{i}")).await;
        }
        let recent = store.add_recent("iptv-5").await;

        assert_eq!(recent.len(), RECENT_CHANNELS_LIMIT);
        assert_eq!(recent[0], "iptv-5");
        assert_eq!(recent[1], "iptv-11");
        assert_eq!(recent.iter().filter(|id| *id == "iptv-5").count(), 1);
        assert!(!recent.contains(&"iptv-0".to_string()));
    }

    #[tokio::test]
    async fn test_update_settings_merges() {
        let store = PreferenceStore::new(UserSettings {
            is_muted: true,
            ..Default::default()
        });
        let updated = store
            .update_settings(UserSettingsPatch {
                quality: Some(QualitySelection::Height(720)),
                ..Default::default()
            })
            .await;

        assert!(updated.is_muted);
        assert_eq!(updated.quality, QualitySelection::Height(720));
        assert_eq!(store.settings().await, updated);
    }
}
