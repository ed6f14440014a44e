//! Subpause Core Type Definitions
//!
//! Defines fundamental types used throughout the crate.

// =============================================================================
// ID Types
// =============================================================================

/// Opaque identifier of the currently playing title, obtained from the host session
pub type ContentId = String;

/// Identifier of a timed-text track within the host player
pub type TrackId = String;

/// Host player session identifier
pub type SessionId = String;

// =============================================================================
// Time Types
// =============================================================================

/// Playback time in milliseconds
pub type TimeMs = u64;
