//! Point-in-Time Cue Lookup
//!
//! Resolves "what text is active at this timestamp" against a cue list
//! sorted ascending by start time (the parser guarantees sortedness for
//! every cached list).

use super::models::Cue;
use crate::core::TimeMs;

/// Returns the first cue active at `timestamp_ms` (`start <= t < end`),
/// or None if no cue covers the timestamp.
///
/// Scans from the front and stops as soon as a cue starts after the
/// timestamp; that early exit is only valid because the input is sorted.
/// Pure and side-effect-free.
pub fn active_cue(timestamp_ms: TimeMs, cues: &[Cue]) -> Option<&Cue> {
    for cue in cues {
        if cue.start_ms > timestamp_ms {
            return None;
        }
        if cue.is_active_at(timestamp_ms) {
            return Some(cue);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hello_world() -> Vec<Cue> {
        vec![Cue::new(0, 3000, "Hello"), Cue::new(3000, 6000, "World")]
    }

    #[test]
    fn test_boundary_lookups() {
        let cues = hello_world();

        assert_eq!(active_cue(2999, &cues).map(|c| c.text.as_str()), Some("Hello"));
        assert_eq!(active_cue(3000, &cues).map(|c| c.text.as_str()), Some("World"));
        assert_eq!(active_cue(6000, &cues), None);
    }

    #[test]
    fn test_before_first_and_after_last() {
        let cues = vec![Cue::new(1000, 2000, "only")];

        assert_eq!(active_cue(0, &cues), None);
        assert_eq!(active_cue(999, &cues), None);
        assert_eq!(active_cue(2000, &cues), None);
        assert_eq!(active_cue(50_000, &cues), None);
    }

    #[test]
    fn test_gap_between_cues() {
        let cues = vec![Cue::new(0, 1000, "a"), Cue::new(5000, 6000, "b")];
        assert_eq!(active_cue(3000, &cues), None);
    }

    #[test]
    fn test_empty_input_yields_none() {
        assert_eq!(active_cue(1234, &[]), None);
    }

    #[test]
    fn test_overlapping_cues_return_first_match() {
        let cues = vec![Cue::new(0, 5000, "under"), Cue::new(1000, 3000, "over")];
        assert_eq!(active_cue(2000, &cues).map(|c| c.text.as_str()), Some("under"));
    }

    #[test]
    fn test_repeated_calls_are_equal() {
        let cues = hello_world();
        let first = active_cue(1500, &cues);
        let second = active_cue(1500, &cues);
        assert_eq!(first, second);
    }
}
