//! Host Session Module
//!
//! Adapter traits over the external player application plus the bounded
//! backoff protocol that discovers a usable session handle.

mod discovery;
mod host;

pub use discovery::{discover, is_watch_session, DiscoveryConfig};
pub use host::{
    select_overlay_track, PlayerHost, PlayerSession, SessionHandle, TimedTextTrack, TrackKind,
};
