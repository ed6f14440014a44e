//! Caption Data Models
//!
//! Defines the cue data structures shared by the parser, the locator and
//! the subtitle cache.

use serde::{Deserialize, Serialize};

use crate::core::{ContentId, TimeMs};

// =============================================================================
// Cue
// =============================================================================

/// A single timed caption entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cue {
    /// Start time in milliseconds
    pub start_ms: TimeMs,
    /// End time in milliseconds (exclusive, always > start_ms)
    pub end_ms: TimeMs,
    /// Caption text (may contain embedded line breaks)
    pub text: String,
}

impl Cue {
    /// Creates a new cue with the given timing and text
    pub fn new(start_ms: TimeMs, end_ms: TimeMs, text: &str) -> Self {
        Self {
            start_ms,
            end_ms,
            text: text.to_string(),
        }
    }

    /// Returns the duration of this cue in milliseconds
    pub fn duration_ms(&self) -> TimeMs {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Returns true if the cue is active at the given time (half-open interval)
    pub fn is_active_at(&self, time_ms: TimeMs) -> bool {
        time_ms >= self.start_ms && time_ms < self.end_ms
    }
}

// =============================================================================
// Cue List
// =============================================================================

/// An ordered sequence of cues for one caption document, paired with the
/// language detected from the document (None when undetectable)
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CueList {
    /// Detected language tag
    pub language: Option<String>,
    /// Cues, sorted ascending by start time
    pub cues: Vec<Cue>,
}

impl CueList {
    /// Creates an empty cue list with no detected language
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a cue list and sorts the cues by start time
    pub fn new(language: Option<String>, mut cues: Vec<Cue>) -> Self {
        // Stable sort: ties keep document order, which lookup relies on.
        cues.sort_by_key(|c| c.start_ms);
        Self { language, cues }
    }

    /// Returns the number of cues
    pub fn len(&self) -> usize {
        self.cues.len()
    }

    /// Returns true if the list has no cues
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }
}

// =============================================================================
// Cache Key
// =============================================================================

/// Key under which a parsed cue list is cached: the playing title plus the
/// caption language
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheKey {
    /// Content identifier from the host session
    pub content_id: ContentId,
    /// Caption language tag
    pub language: Option<String>,
}

impl CacheKey {
    /// Creates a new cache key
    pub fn new(content_id: &str, language: Option<String>) -> Self {
        Self {
            content_id: content_id.to_string(),
            language,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
