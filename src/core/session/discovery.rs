//! Session Discovery
//!
//! Polls the host application's asynchronously-initializing player surface
//! with bounded exponential backoff until a session resolves or attempts
//! are exhausted.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::host::{PlayerHost, SessionHandle};

// =============================================================================
// Configuration
// =============================================================================

/// Backoff configuration for session discovery
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    /// Maximum polling attempts before giving up
    pub max_attempts: u32,
    /// Delay before the second attempt, in milliseconds
    pub initial_delay_ms: u64,
    /// Multiplier applied to the delay after each attempt
    pub backoff_factor: f64,
    /// Upper bound on the inter-attempt delay, in milliseconds
    pub max_delay_ms: u64,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            initial_delay_ms: 250,
            backoff_factor: 1.5,
            max_delay_ms: 2000,
        }
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Polls the host until a session resolves, suspending between attempts.
///
/// Each attempt enumerates the host's active session identifiers and
/// resolves the first one. An absent application handle and a session id
/// that fails to resolve are both transient states, retried identically.
/// Delays grow geometrically (250 → 375 → 562 → 843 → ... capped at
/// `max_delay_ms`). Returns None once `max_attempts` attempts have failed;
/// that outcome is terminal for the navigation cycle.
pub async fn discover(host: Arc<dyn PlayerHost>, config: &DiscoveryConfig) -> Option<SessionHandle> {
    let mut delay_ms = config.initial_delay_ms;

    for attempt in 1..=config.max_attempts {
        if let Some(handle) = try_resolve(&host) {
            info!(attempt, session_id = %handle.session_id, "Player session discovered");
            return Some(handle);
        }

        debug!(attempt, "Player session not ready");
        if attempt < config.max_attempts {
            tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            delay_ms = ((delay_ms as f64 * config.backoff_factor) as u64).min(config.max_delay_ms);
        }
    }

    info!(
        attempts = config.max_attempts,
        "Session discovery exhausted, abandoning"
    );
    None
}

fn try_resolve(host: &Arc<dyn PlayerHost>) -> Option<SessionHandle> {
    let session_ids = host.session_ids()?;
    let session_id = session_ids.into_iter().next()?;
    let session = host.resolve_session(&session_id)?;
    Some(SessionHandle::new(host.clone(), session))
}

/// Heuristic check that a discovered session belongs to an active watch
/// page rather than a stale or transitional one.
///
/// The host encodes the page kind in its session identifiers; substring
/// matching is best-effort and deliberately isolated here so the policy can
/// be revised without touching the retry loop.
pub fn is_watch_session(session_id: &str) -> bool {
    session_id.contains("watch")
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::core::session::host::{PlayerSession, TimedTextTrack};
    use crate::core::{ContentId, CoreResult, SessionId, TrackId};

    struct FakeSession {
        id: String,
    }

    impl PlayerSession for FakeSession {
        fn session_id(&self) -> &str {
            &self.id
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
        fn set_active_track(&self, _track_id: &TrackId) -> CoreResult<()> {
            Ok(())
        }
    }

    /// Host whose application handle appears only after `ready_after` polls
    struct FlakyHost {
        polls: AtomicU32,
        ready_after: u32,
    }

    impl FlakyHost {
        fn new(ready_after: u32) -> Self {
            Self {
                polls: AtomicU32::new(0),
                ready_after,
            }
        }
    }

    impl PlayerHost for FlakyHost {
        fn session_ids(&self) -> Option<Vec<SessionId>> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            if poll >= self.ready_after {
                Some(vec!["watch-session-1".to_string()])
            } else {
                None
            }
        }

        fn resolve_session(&self, session_id: &str) -> Option<Arc<dyn PlayerSession>> {
            Some(Arc::new(FakeSession {
                id: session_id.to_string(),
            }))
        }
    }

    /// Host that exposes session ids but never resolves a session object
    struct UnresolvableHost;

    impl PlayerHost for UnresolvableHost {
        fn session_ids(&self) -> Option<Vec<SessionId>> {
            Some(vec!["watch-session-1".to_string()])
        }
        fn resolve_session(&self, _session_id: &str) -> Option<Arc<dyn PlayerSession>> {
            None
        }
    }

    fn three_attempts() -> DiscoveryConfig {
        DiscoveryConfig {
            max_attempts: 3,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = DiscoveryConfig::default();
        assert_eq!(config.max_attempts, 20);
        assert_eq!(config.initial_delay_ms, 250);
        assert_eq!(config.backoff_factor, 1.5);
        assert_eq!(config.max_delay_ms, 2000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_host_makes_exactly_max_attempts() {
        let host = Arc::new(FlakyHost::new(u32::MAX));
        let started = tokio::time::Instant::now();

        let result = discover(host.clone(), &three_attempts()).await;

        assert!(result.is_none());
        assert_eq!(host.polls.load(Ordering::SeqCst), 3);
        // Two inter-attempt delays: 250ms then 375ms.
        assert_eq!(started.elapsed(), Duration::from_millis(625));
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_once_host_becomes_ready() {
        let host = Arc::new(FlakyHost::new(3));

        let handle = discover(host.clone(), &three_attempts()).await.unwrap();

        assert_eq!(handle.session_id, "watch-session-1");
        assert_eq!(host.polls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unresolvable_session_retries_like_absent_handle() {
        let result = discover(Arc::new(UnresolvableHost), &three_attempts()).await;
        assert!(result.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_backoff_is_capped() {
        let config = DiscoveryConfig {
            max_attempts: 8,
            ..Default::default()
        };
        let started = tokio::time::Instant::now();

        discover(Arc::new(FlakyHost::new(u32::MAX)), &config).await;

        // 250 + 375 + 562 + 843 + 1264 + 1896 + 2000 (capped)
        assert_eq!(started.elapsed(), Duration::from_millis(7190));
    }

    #[test]
    fn test_watch_session_predicate() {
        assert!(is_watch_session("watch-5349e543"));
        assert!(is_watch_session("motion-billboard-watch-1"));
        assert!(!is_watch_session("browse-a1b2c3"));
        assert!(!is_watch_session(""));
    }
}
