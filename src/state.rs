use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::store::KvStore;

/// Settings always live in the sync area, whichever backend holds markers.
pub const SETTINGS_KEY: &str = "lrf:settings";

/// User-facing switches, edited from the options surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Keep markers in the sync area instead of the local one.
    pub use_sync: bool,
    /// Capture an auto marker after scrolling settles.
    pub auto_save: bool,
    /// Scroll to the best marker when a page loads.
    pub auto_scroll_on_load: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            use_sync: true,
            auto_save: true,
            auto_scroll_on_load: true,
        }
    }
}

impl Settings {
    /// Reads settings, falling back to defaults when they are missing or
    /// unreadable.
    pub async fn load(sync: &dyn KvStore) -> Settings {
        let bytes = match sync.get(SETTINGS_KEY).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Settings::default(),
            Err(e) => {
                warn!("Failed to read settings, using defaults: {:#}", e);
                return Settings::default();
            }
        };
        match serde_json::from_slice(&bytes) {
            Ok(settings) => settings,
            Err(e) => {
                warn!("Stored settings are corrupt, using defaults: {}", e);
                Settings::default()
            }
        }
    }

    pub async fn save(&self, sync: &dyn KvStore) -> Result<()> {
        let bytes = serde_json::to_vec(self).context("serialize settings")?;
        sync.set(SETTINGS_KEY, bytes).await
    }
}

/// Timing and retention knobs for a page session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Quiet period after the last scroll before an auto marker is captured.
    pub autosave_debounce: Duration,
    /// Delay before the single re-resolution attempt after a load miss.
    pub load_retry_delay: Duration,
    /// Manual markers kept per page; the oldest are evicted first.
    pub max_manual_markers: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            autosave_debounce: Duration::from_millis(600),
            load_retry_delay: Duration::from_millis(50),
            max_manual_markers: 100,
        }
    }
}
