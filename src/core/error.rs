//! Subpause Error Definitions
//!
//! Defines error types used throughout the crate.

use thiserror::Error;

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    // =========================================================================
    // Session Errors
    // =========================================================================
    #[error("Session discovery exhausted after {0} attempts")]
    SessionUnavailable(u32),

    #[error("Track switch failed: {0}")]
    TrackSwitchFailed(String),

    // =========================================================================
    // Caption Errors
    // =========================================================================
    #[error("Caption fetch failed for {url}: {reason}")]
    CaptionFetchFailed { url: String, reason: String },

    #[error("Invalid caption document: {0}")]
    InvalidCaptionDocument(String),

    // =========================================================================
    // General Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Core result type
pub type CoreResult<T> = Result<T, CoreError>;
