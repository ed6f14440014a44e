//! Lifecycle Coordinator
//!
//! Orchestrates one watch session per navigation: detect the video surface,
//! discover the host session, arm the network feed and playback detection,
//! serve pause lookups, and tear everything down on the next navigation.
//!
//! The coordinator is a single event loop over one mpsc channel. Background
//! work (session discovery, caption fetches, the track nudge) runs in
//! abortable tasks that report back through the same channel, tagged with
//! the arm-generation (epoch) they were spawned under; teardown bumps the
//! epoch so stale completions are discarded.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::{
    LifecycleEvent, LifecycleState, NavigationWatcher, NetworkObserver, OverlayDisplay,
    PlaybackProvider, VideoSurface, VideoSurfaceProvider,
};
use crate::core::cache::{is_caption_url, request_fetch, CaptionFetcher, SubtitleCache};
use crate::core::captions::{active_cue, normalize_language, parse_timed_text, CacheKey};
use crate::core::session::{
    discover, is_watch_session, select_overlay_track, DiscoveryConfig, PlayerHost, SessionHandle,
};
use crate::core::settings::{OverlaySettings, SettingsSource};

// =============================================================================
// Configuration
// =============================================================================

/// Coordinator configuration
#[derive(Clone, Debug)]
pub struct CoordinatorConfig {
    /// Session discovery backoff
    pub discovery: DiscoveryConfig,
    /// Delay before re-running discovery after a stale session, in milliseconds
    pub stale_session_delay_ms: u64,
    /// Delay before reverting the proactive track switch, in milliseconds
    pub revert_delay_ms: u64,
    /// Location fragment identifying the watch context
    pub watch_route_fragment: String,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            stale_session_delay_ms: 1000,
            revert_delay_ms: crate::core::cache::DEFAULT_REVERT_DELAY_MS,
            watch_route_fragment: "/watch".to_string(),
        }
    }
}

// =============================================================================
// Collaborators
// =============================================================================

/// External collaborators wired into the coordinator
pub struct Collaborators {
    pub host: Arc<dyn PlayerHost>,
    pub fetcher: Arc<dyn CaptionFetcher>,
    pub settings: Arc<dyn SettingsSource>,
    pub surface_provider: Box<dyn VideoSurfaceProvider>,
    pub playback: Box<dyn PlaybackProvider>,
    pub network: Box<dyn NetworkObserver>,
    pub navigation: Box<dyn NavigationWatcher>,
    pub display: Box<dyn OverlayDisplay>,
}

// =============================================================================
// Coordinator
// =============================================================================

/// Per-navigation lifecycle state machine
pub struct LifecycleCoordinator {
    config: CoordinatorConfig,
    deps: Collaborators,
    cache: SubtitleCache,
    state: LifecycleState,
    /// Arm-generation counter; bumped on every teardown
    epoch: u64,
    session: Option<SessionHandle>,
    surface: Option<Arc<dyn VideoSurface>>,
    overlay: OverlaySettings,
    tasks: Vec<JoinHandle<()>>,
    events_tx: UnboundedSender<LifecycleEvent>,
    events_rx: Option<UnboundedReceiver<LifecycleEvent>>,
}

impl LifecycleCoordinator {
    /// Creates an idle coordinator
    pub fn new(config: CoordinatorConfig, deps: Collaborators) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            config,
            deps,
            cache: SubtitleCache::new(),
            state: LifecycleState::Idle,
            epoch: 0,
            session: None,
            surface: None,
            overlay: OverlaySettings::default(),
            tasks: Vec::new(),
            events_tx,
            events_rx: Some(events_rx),
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// A sender into the coordinator's event channel, for host adapters
    /// that deliver events directly
    pub fn event_sender(&self) -> UnboundedSender<LifecycleEvent> {
        self.events_tx.clone()
    }

    /// Attaches the navigation watcher and consumes events until every
    /// sender (including the coordinator's own) is dropped.
    pub async fn run(mut self) {
        self.deps.navigation.attach(self.events_tx.clone());

        let Some(mut events_rx) = self.events_rx.take() else {
            return;
        };
        while let Some(event) = events_rx.recv().await {
            self.handle_event(event);
        }
        self.teardown();
        self.deps.navigation.detach();
    }

    // -------------------------------------------------------------------------
    // Event Handling
    // -------------------------------------------------------------------------

    fn handle_event(&mut self, event: LifecycleEvent) {
        match event {
            LifecycleEvent::RouteChanged(location) => self.on_route_changed(&location),
            LifecycleEvent::SurfaceReady(surface) => self.on_surface_ready(surface),
            LifecycleEvent::SessionResolved { epoch, handle } => {
                self.on_session_resolved(epoch, handle)
            }
            LifecycleEvent::RequestCompleted(url) => self.on_request_completed(url),
            LifecycleEvent::CaptionDocument { epoch, url, body } => {
                self.on_caption_document(epoch, &url, &body)
            }
            LifecycleEvent::Paused => self.on_paused(),
            LifecycleEvent::Resumed => self.on_resumed(),
        }
    }

    fn on_route_changed(&mut self, location: &str) {
        // Idempotent: tearing down an idle cycle is a no-op.
        self.teardown();

        if !location.contains(&self.config.watch_route_fragment) {
            debug!(location, "Route is not a watch context, staying idle");
            return;
        }

        info!(location, "Entering watch context");
        self.overlay = self.deps.settings.overlay_settings();
        self.state = LifecycleState::Detecting;
        self.deps.surface_provider.arm(self.events_tx.clone());
    }

    fn on_surface_ready(&mut self, surface: Arc<dyn VideoSurface>) {
        if self.state != LifecycleState::Detecting || self.surface.is_some() {
            debug!("Ignoring surface detection outside an active detection phase");
            return;
        }
        debug!("Video surface detected, starting session discovery");
        self.surface = Some(surface);

        let host = self.deps.host.clone();
        let discovery = self.config.discovery.clone();
        let stale_delay = Duration::from_millis(self.config.stale_session_delay_ms);
        let events = self.events_tx.clone();
        let epoch = self.epoch;
        self.tasks.push(tokio::spawn(async move {
            loop {
                match discover(host.clone(), &discovery).await {
                    Some(handle) if !is_watch_session(&handle.session_id) => {
                        debug!(session_id = %handle.session_id,
                            "Discovered session is not a watch session, retrying");
                        tokio::time::sleep(stale_delay).await;
                    }
                    outcome => {
                        let _ = events.send(LifecycleEvent::SessionResolved {
                            epoch,
                            handle: outcome,
                        });
                        return;
                    }
                }
            }
        }));
    }

    fn on_session_resolved(&mut self, epoch: u64, handle: Option<SessionHandle>) {
        if epoch != self.epoch || self.state != LifecycleState::Detecting {
            debug!("Ignoring session resolution from a torn-down cycle");
            return;
        }

        let Some(handle) = handle else {
            warn!("No player session became available, abandoning this navigation");
            self.teardown();
            return;
        };

        info!(session_id = %handle.session_id, "Arming watch session");
        self.cache.arm();
        self.deps.network.arm(self.events_tx.clone());

        let session = handle.session.clone();
        match select_overlay_track(&session.track_list(), &self.overlay) {
            Some(track) => {
                let overlay_track = track.clone();
                let current_track = session.active_track();
                let revert_delay = Duration::from_millis(self.config.revert_delay_ms);
                let nudge_session = session.clone();
                self.tasks.push(tokio::spawn(async move {
                    request_fetch(
                        nudge_session.as_ref(),
                        &overlay_track,
                        current_track.as_ref(),
                        revert_delay,
                    )
                    .await;
                }));
            }
            None => {
                debug!(language = %self.overlay.overlay_language,
                    "No timed-text track matches the overlay language");
            }
        }

        if let Some(surface) = &self.surface {
            self.deps.playback.attach(surface.clone(), self.events_tx.clone());
        }
        self.session = Some(handle);
        self.state = LifecycleState::Armed;
    }

    fn on_request_completed(&mut self, url: String) {
        if self.state != LifecycleState::Armed || !is_caption_url(&url) {
            return;
        }
        if !self.cache.mark_seen(&url) {
            debug!(url, "Caption document already processed this session");
            return;
        }

        let fetcher = self.deps.fetcher.clone();
        let events = self.events_tx.clone();
        let epoch = self.epoch;
        self.tasks.push(tokio::spawn(async move {
            match fetcher.fetch_text(&url).await {
                Ok(body) => {
                    let _ = events.send(LifecycleEvent::CaptionDocument { epoch, url, body });
                }
                Err(error) => warn!(%error, url, "Failed to fetch caption document"),
            }
        }));
    }

    fn on_caption_document(&mut self, epoch: u64, url: &str, body: &str) {
        if epoch != self.epoch || self.state != LifecycleState::Armed {
            debug!(url, "Discarding caption document from a torn-down cycle");
            return;
        }

        let list = parse_timed_text(body);
        if list.is_empty() {
            debug!(url, "Caption document yielded no cues");
            return;
        }
        let Some(content_id) = self.session.as_ref().and_then(|h| h.session.content_id()) else {
            warn!(url, "Session has no content id, dropping parsed cues");
            return;
        };

        let key = CacheKey::new(&content_id, list.language.clone());
        self.cache.insert(key, list);
    }

    fn on_paused(&mut self) {
        if self.state != LifecycleState::Armed {
            return;
        }
        let position = self.surface.as_ref().and_then(|s| s.current_time_ms());
        let content_id = self.session.as_ref().and_then(|h| h.session.content_id());
        let (Some(position), Some(content_id)) = (position, content_id) else {
            self.deps.display.clear();
            return;
        };

        let key = CacheKey::new(
            &content_id,
            Some(normalize_language(&self.overlay.overlay_language)),
        );
        match active_cue(position, self.cache.lookup(&key)) {
            Some(cue) => {
                debug!(position, "Showing overlay cue");
                self.deps.display.show(&cue.text);
            }
            None => {
                debug!(position, "No cue active at paused position");
                self.deps.display.clear();
            }
        }
    }

    fn on_resumed(&mut self) {
        if self.state != LifecycleState::Armed {
            return;
        }
        self.deps.display.clear();
    }

    // -------------------------------------------------------------------------
    // Teardown
    // -------------------------------------------------------------------------

    /// Disarms every transient observer and aborts in-flight work.
    /// Idempotent; never touches the navigation watcher.
    fn teardown(&mut self) {
        self.epoch += 1;
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.deps.playback.detach();
        self.deps.network.disarm();
        self.deps.surface_provider.disarm();
        self.cache.disarm();
        self.session = None;
        self.surface = None;
        self.deps.display.clear();
        self.state = LifecycleState::Idle;
    }
}

// =============================================================================
// Tests
// =============================================================================
