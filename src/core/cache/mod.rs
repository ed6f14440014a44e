//! Subtitle Cache + Network Feed
//!
//! Keyed store of parsed cue lists per (content id, language), populated as
//! caption documents are spotted on the network. The observer collaborator
//! reports completed-request metadata only, so documents are re-fetched
//! through [`CaptionFetcher`] before parsing.
//!
//! The cache is strictly per-armed-session state: `arm` and `disarm` both
//! clear the cue store and the processed-URL set, so nothing leaks across
//! navigations.

use std::collections::{HashMap, HashSet};
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use crate::core::captions::{CacheKey, Cue, CueList};
use crate::core::session::{PlayerSession, TimedTextTrack};
use crate::core::CoreResult;

/// Delay before reverting a proactive track switch, long enough for the
/// host platform to issue the caption-document request
pub const DEFAULT_REVERT_DELAY_MS: u64 = 500;

// =============================================================================
// Caption Endpoint Detection
// =============================================================================

/// Returns true for URLs that look like caption-document requests: the
/// platform CDN host with its opaque query-parameter shape.
pub fn is_caption_url(url: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let pattern = PATTERN
        .get_or_init(|| Regex::new(r"^https?://[^/]*\.?nflxvideo\.net/\?o=").unwrap());
    pattern.is_match(url)
}

// =============================================================================
// Caption Fetcher
// =============================================================================

/// Re-fetches a caption document's body by URL.
///
/// Implemented by the embedding host (the network observer only exposes
/// completed-request metadata, never bodies).
#[async_trait]
pub trait CaptionFetcher: Send + Sync {
    /// Fetches the document at `url` as text
    async fn fetch_text(&self, url: &str) -> CoreResult<String>;
}

// =============================================================================
// Subtitle Cache
// =============================================================================

/// Mutable keyed store of parsed cue lists for one armed session
#[derive(Debug, Default)]
pub struct SubtitleCache {
    entries: HashMap<CacheKey, CueList>,
    seen_urls: HashSet<String>,
}

impl SubtitleCache {
    /// Creates an empty, unarmed cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepares the cache for a new armed session.
    ///
    /// Clears the processed-URL set (a resource fetched in a prior session
    /// must be reprocessable under the new session's keys) and the cue
    /// store (a previous content id's cues must never be returned).
    pub fn arm(&mut self) {
        self.entries.clear();
        self.seen_urls.clear();
    }

    /// Tears the cache down at the end of a session
    pub fn disarm(&mut self) {
        self.entries.clear();
        self.seen_urls.clear();
    }

    /// Records a URL as processed; returns false if it already was in the
    /// current armed session
    pub fn mark_seen(&mut self, url: &str) -> bool {
        self.seen_urls.insert(url.to_string())
    }

    /// Stores a parsed cue list under its key
    pub fn insert(&mut self, key: CacheKey, cues: CueList) {
        debug!(content_id = %key.content_id, language = ?key.language, cues = cues.len(),
            "Caching parsed cue list");
        self.entries.insert(key, cues);
    }

    /// Returns the cues cached under `key`, or an empty slice
    pub fn lookup(&self, key: &CacheKey) -> &[Cue] {
        self.entries
            .get(key)
            .map(|list| list.cues.as_slice())
            .unwrap_or(&[])
    }

    /// Number of cached cue lists
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no cue list is cached
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Proactive Track Nudge
// =============================================================================

/// Switches the session's active timed-text track to the overlay track so
/// the host platform fetches its caption document, then reverts to
/// `current_track` after `revert_delay` to avoid visibly disrupting the
/// user's chosen track.
///
/// Deliberately side-effecting; failures are logged, never propagated.
pub async fn request_fetch(
    session: &dyn PlayerSession,
    overlay_track: &TimedTextTrack,
    current_track: Option<&TimedTextTrack>,
    revert_delay: Duration,
) {
    debug!(track_id = %overlay_track.track_id, "Switching timed-text track to trigger caption fetch");
    if let Err(error) = session.set_active_track(&overlay_track.track_id) {
        warn!(%error, "Failed to switch timed-text track");
        return;
    }

    tokio::time::sleep(revert_delay).await;

    let Some(original) = current_track else {
        return;
    };
    if let Err(error) = session.set_active_track(&original.track_id) {
        warn!(%error, "Failed to restore original timed-text track");
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::core::session::TrackKind;
    use crate::core::{ContentId, TrackId};

    // -------------------------------------------------------------------------
    // URL Predicate Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_is_caption_url() {
        assert!(is_caption_url("https://ipv4-c001.1.nflxvideo.net/?o=1&v=2"));
        assert!(is_caption_url("http://nflxvideo.net/?o=abc"));
        assert!(!is_caption_url("https://ipv4-c001.1.nflxvideo.net/range/0-1"));
        assert!(!is_caption_url("https://example.com/?o=1"));
        assert!(!is_caption_url("https://nflxvideo.net.evil.com/?o=1"));
        assert!(!is_caption_url(""));
    }

    // -------------------------------------------------------------------------
    // Cache Tests
    // -------------------------------------------------------------------------

    fn sample_list(text: &str) -> CueList {
        CueList::new(Some("en-US".to_string()), vec![Cue::new(0, 1000, text)])
    }

    #[test]
    fn test_lookup_missing_key_is_empty() {
        let cache = SubtitleCache::new();
        let key = CacheKey::new("80001234", Some("en-US".to_string()));
        assert!(cache.lookup(&key).is_empty());
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut cache = SubtitleCache::new();
        cache.arm();

        let key = CacheKey::new("80001234", Some("en-US".to_string()));
        cache.insert(key.clone(), sample_list("Hello"));

        assert_eq!(cache.lookup(&key).len(), 1);
        assert_eq!(cache.lookup(&key)[0].text, "Hello");

        let other = CacheKey::new("80001234", Some("de".to_string()));
        assert!(cache.lookup(&other).is_empty());
    }

    #[test]
    fn test_mark_seen_deduplicates_within_session() {
        let mut cache = SubtitleCache::new();
        cache.arm();

        assert!(cache.mark_seen("https://nflxvideo.net/?o=1"));
        assert!(!cache.mark_seen("https://nflxvideo.net/?o=1"));
        assert!(cache.mark_seen("https://nflxvideo.net/?o=2"));
    }

    #[test]
    fn test_rearm_clears_seen_urls_and_entries() {
        let mut cache = SubtitleCache::new();
        cache.arm();

        let old_key = CacheKey::new("old-content", Some("en-US".to_string()));
        cache.insert(old_key.clone(), sample_list("stale"));
        assert!(cache.mark_seen("https://nflxvideo.net/?o=1"));

        cache.arm();

        // The same resource can be reprocessed under the new session...
        assert!(cache.mark_seen("https://nflxvideo.net/?o=1"));
        // ...and no cue list from the previous content id survives.
        assert!(cache.lookup(&old_key).is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_disarm_clears_everything() {
        let mut cache = SubtitleCache::new();
        cache.arm();
        cache.insert(
            CacheKey::new("80001234", None),
            sample_list("x"),
        );
        cache.mark_seen("https://nflxvideo.net/?o=1");

        cache.disarm();

        assert!(cache.is_empty());
        assert!(cache.mark_seen("https://nflxvideo.net/?o=1"));
    }

    // -------------------------------------------------------------------------
    // Track Nudge Tests
    // -------------------------------------------------------------------------

    struct RecordingSession {
        switches: Mutex<Vec<TrackId>>,
        fail_switch: bool,
    }

    impl RecordingSession {
        fn new(fail_switch: bool) -> Self {
            Self {
                switches: Mutex::new(Vec::new()),
                fail_switch,
            }
        }
    }

    impl PlayerSession for RecordingSession {
        fn session_id(&self) -> &str {
            "watch-1"
        }
        fn content_id(&self) -> Option<ContentId> {
            Some("80001234".to_string())
        }
        fn track_list(&self) -> Vec<TimedTextTrack> {
            Vec::new()
        }
        fn active_track(&self) -> Option<TimedTextTrack> {
            None
        }
        fn set_active_track(&self, track_id: &TrackId) -> CoreResult<()> {
            if self.fail_switch {
                return Err(crate::core::CoreError::TrackSwitchFailed(
                    track_id.clone(),
                ));
            }
            self.switches.lock().unwrap().push(track_id.clone());
            Ok(())
        }
    }

    fn track(id: &str) -> TimedTextTrack {
        TimedTextTrack {
            track_id: id.to_string(),
            language: Some("en-US".to_string()),
            kind: TrackKind::Subtitles,
            is_none_track: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_fetch_switches_then_reverts() {
        let session = RecordingSession::new(false);
        let overlay = track("overlay");
        let current = track("current");

        request_fetch(
            &session,
            &overlay,
            Some(&current),
            Duration::from_millis(DEFAULT_REVERT_DELAY_MS),
        )
        .await;

        let switches = session.switches.lock().unwrap();
        assert_eq!(switches.as_slice(), ["overlay", "current"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_fetch_without_original_track_does_not_revert() {
        let session = RecordingSession::new(false);
        let overlay = track("overlay");

        request_fetch(&session, &overlay, None, Duration::from_millis(500)).await;

        let switches = session.switches.lock().unwrap();
        assert_eq!(switches.as_slice(), ["overlay"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_request_fetch_switch_failure_is_swallowed() {
        let session = RecordingSession::new(true);
        let overlay = track("overlay");
        let current = track("current");

        // Must not panic or propagate.
        request_fetch(&session, &overlay, Some(&current), Duration::from_millis(500)).await;
        assert!(session.switches.lock().unwrap().is_empty());
    }
}
