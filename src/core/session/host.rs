//! Host Player Adapter
//!
//! Capability traits over the external player application's object graph.
//! The host exposes a read-only, asynchronously-populated structure that
//! must be polled rather than subscribed to; these traits keep session
//! discovery ignorant of its internal shape.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::core::captions::normalize_language;
use crate::core::settings::OverlaySettings;
use crate::core::{ContentId, CoreResult, SessionId, TrackId};

// =============================================================================
// Timed-Text Tracks
// =============================================================================

/// Kind of a timed-text track
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackKind {
    Subtitles,
    ClosedCaptions,
}

/// A timed-text track advertised by the host session
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimedTextTrack {
    /// Host-side track identifier
    pub track_id: TrackId,
    /// Language tag (None for tracks without one)
    pub language: Option<String>,
    /// Subtitle or closed-caption track
    pub kind: TrackKind,
    /// The "no captions" sentinel the host always lists
    pub is_none_track: bool,
}

/// Selects the track to nudge the host into fetching for the overlay.
///
/// Policy: among tracks whose language matches the requested overlay
/// language and that are not the "no captions" sentinel, prefer the caption
/// kind matching the user's closed-caption preference, falling back to the
/// other kind.
pub fn select_overlay_track<'a>(
    tracks: &'a [TimedTextTrack],
    settings: &OverlaySettings,
) -> Option<&'a TimedTextTrack> {
    let wanted = normalize_language(&settings.overlay_language);
    let candidates: Vec<&TimedTextTrack> = tracks
        .iter()
        .filter(|t| !t.is_none_track)
        .filter(|t| {
            t.language
                .as_deref()
                .is_some_and(|lang| normalize_language(lang).eq_ignore_ascii_case(&wanted))
        })
        .collect();

    let preferred = if settings.prefer_closed_captions {
        TrackKind::ClosedCaptions
    } else {
        TrackKind::Subtitles
    };

    candidates
        .iter()
        .find(|t| t.kind == preferred)
        .or_else(|| candidates.iter().find(|t| t.kind != preferred))
        .copied()
}

// =============================================================================
// Host Traits
// =============================================================================

/// A resolved player session within the host application
pub trait PlayerSession: Send + Sync {
    /// The host-side session identifier
    fn session_id(&self) -> &str;

    /// Identifier of the currently playing title, when known
    fn content_id(&self) -> Option<ContentId>;

    /// Timed-text tracks the session advertises
    fn track_list(&self) -> Vec<TimedTextTrack>;

    /// The currently selected timed-text track
    fn active_track(&self) -> Option<TimedTextTrack>;

    /// Switches the session's active timed-text track
    fn set_active_track(&self, track_id: &TrackId) -> CoreResult<()>;
}

/// The host application's player surface, polled during discovery.
///
/// `session_ids` returning None means the application handle itself has not
/// appeared yet; an empty list means the handle exists but no session does.
/// Both are transient states.
pub trait PlayerHost: Send + Sync {
    /// Enumerates active session identifiers, if the handle is present
    fn session_ids(&self) -> Option<Vec<SessionId>>;

    /// Resolves the concrete session object for an identifier
    fn resolve_session(&self, session_id: &str) -> Option<Arc<dyn PlayerSession>>;
}

// =============================================================================
// Session Handle
// =============================================================================

/// Bundle returned by successful discovery: the application reference, the
/// resolved session object, and its identifier. Lives for one armed cycle.
#[derive(Clone)]
pub struct SessionHandle {
    pub host: Arc<dyn PlayerHost>,
    pub session: Arc<dyn PlayerSession>,
    pub session_id: SessionId,
}

impl SessionHandle {
    pub fn new(host: Arc<dyn PlayerHost>, session: Arc<dyn PlayerSession>) -> Self {
        let session_id = session.session_id().to_string();
        Self {
            host,
            session,
            session_id,
        }
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("session_id", &self.session_id)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Tests
// =============================================================================
