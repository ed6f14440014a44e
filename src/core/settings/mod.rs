//! Overlay Settings
//!
//! User-facing settings consumed by the lifecycle coordinator. Storage and
//! injection between execution contexts belong to the embedding host; this
//! crate only defines the schema and the read-side trait.

use serde::{Deserialize, Serialize};

/// Settings read once per navigation cycle when selecting the overlay track
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlaySettings {
    /// Language of the secondary captions shown on pause
    #[serde(default = "default_overlay_language")]
    pub overlay_language: String,
    /// Prefer closed-caption tracks over plain subtitle tracks
    #[serde(default)]
    pub prefer_closed_captions: bool,
}

fn default_overlay_language() -> String {
    "en".to_string()
}

impl Default for OverlaySettings {
    fn default() -> Self {
        Self {
            overlay_language: default_overlay_language(),
            prefer_closed_captions: false,
        }
    }
}

/// Source of overlay settings, supplied by the embedding host
pub trait SettingsSource: Send + Sync {
    /// Returns the current settings snapshot
    fn overlay_settings(&self) -> OverlaySettings;
}

/// Fixed in-memory settings, for embedding defaults and tests
#[derive(Clone, Debug, Default)]
pub struct FixedSettings(pub OverlaySettings);

impl SettingsSource for FixedSettings {
    fn overlay_settings(&self) -> OverlaySettings {
        self.0.clone()
    }
}
