//! Caption System Module
//!
//! Subtitle handling for the pause overlay:
//! - Cue data models (Cue, CueList, CacheKey)
//! - Timed-text document parsing into normalized, time-ordered cue lists
//! - Point-in-time lookup of the active cue

mod locate;
mod models;
mod timedtext;
mod xml;

pub use locate::active_cue;
pub use models::{CacheKey, Cue, CueList};
pub use timedtext::{normalize_language, parse_timed_text, DEFAULT_TICK_RATE};
