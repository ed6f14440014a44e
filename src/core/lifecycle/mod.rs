//! Lifecycle Module
//!
//! The per-navigation state machine that arms and tears down the transient
//! observers of one watch session, plus the event and provider seams the
//! embedding host implements.
//!
//! All notification flows through one mpsc channel into a single consumer
//! loop, so at most one event is processed at a time regardless of how many
//! providers feed it.

mod coordinator;

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::core::session::SessionHandle;
use crate::core::TimeMs;

pub use coordinator::{Collaborators, CoordinatorConfig, LifecycleCoordinator};

// =============================================================================
// Lifecycle State
// =============================================================================

/// State of one navigation cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LifecycleState {
    /// No watch context; nothing armed
    Idle,
    /// Waiting for the video surface and a valid session
    Detecting,
    /// All transient observers armed; overlay live
    Armed,
}

// =============================================================================
// Events
// =============================================================================

/// Events consumed by the coordinator's single event loop.
///
/// Providers and the coordinator's own background tasks feed these through
/// the shared channel. `epoch` fields carry the arm-generation the work was
/// spawned under; results from a torn-down cycle are discarded.
pub enum LifecycleEvent {
    /// The page navigated (push, replace, or history traversal)
    RouteChanged(String),
    /// One-shot surface detection found a video surface
    SurfaceReady(Arc<dyn VideoSurface>),
    /// The discovery task finished (None: retries exhausted)
    SessionResolved {
        epoch: u64,
        handle: Option<SessionHandle>,
    },
    /// The network observer saw a completed request
    RequestCompleted(String),
    /// A caption document body arrived from the fetcher
    CaptionDocument {
        epoch: u64,
        url: String,
        body: String,
    },
    /// Playback paused
    Paused,
    /// Playback resumed
    Resumed,
}

impl fmt::Debug for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RouteChanged(location) => f.debug_tuple("RouteChanged").field(location).finish(),
            Self::SurfaceReady(_) => f.write_str("SurfaceReady"),
            Self::SessionResolved { epoch, handle } => f
                .debug_struct("SessionResolved")
                .field("epoch", epoch)
                .field("resolved", &handle.is_some())
                .finish(),
            Self::RequestCompleted(url) => f.debug_tuple("RequestCompleted").field(url).finish(),
            Self::CaptionDocument { epoch, url, .. } => f
                .debug_struct("CaptionDocument")
                .field("epoch", epoch)
                .field("url", url)
                .finish(),
            Self::Paused => f.write_str("Paused"),
            Self::Resumed => f.write_str("Resumed"),
        }
    }
}

// =============================================================================
// Provider Seams
// =============================================================================

/// A video-capable surface found in the page
pub trait VideoSurface: Send + Sync {
    /// Current playback position, when readable
    fn current_time_ms(&self) -> Option<TimeMs>;
}

/// One-shot detection of a video surface appearing in the page.
///
/// Each `arm` must start from a fresh, forward-looking state: a stale
/// surface left over from the previous page must not satisfy detection.
pub trait VideoSurfaceProvider: Send {
    /// Starts detection; sends [`LifecycleEvent::SurfaceReady`] once
    fn arm(&mut self, events: UnboundedSender<LifecycleEvent>);
    /// Stops detection
    fn disarm(&mut self);
}

/// Playback-state detection bound to a specific surface
pub trait PlaybackProvider: Send {
    /// Starts watching `surface`; sends `Paused`/`Resumed` on transitions
    fn attach(&mut self, surface: Arc<dyn VideoSurface>, events: UnboundedSender<LifecycleEvent>);
    /// Stops watching
    fn detach(&mut self);
}

/// Route-change detection. Process-scoped: attached once, never torn down
/// by a navigation cycle.
pub trait NavigationWatcher: Send {
    /// Starts watching; sends [`LifecycleEvent::RouteChanged`] per change
    fn attach(&mut self, events: UnboundedSender<LifecycleEvent>);
    /// Stops watching
    fn detach(&mut self);
}

/// Passive observation of completed network requests (metadata only)
pub trait NetworkObserver: Send {
    /// Starts observing; sends [`LifecycleEvent::RequestCompleted`] per request
    fn arm(&mut self, events: UnboundedSender<LifecycleEvent>);
    /// Stops observing
    fn disarm(&mut self);
}

/// The overlay rendering collaborator
pub trait OverlayDisplay: Send {
    /// Shows the given caption text
    fn show(&mut self, text: &str);
    /// Clears the overlay
    fn clear(&mut self);
}
