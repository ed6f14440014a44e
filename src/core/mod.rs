//! Subpause Core Engine
//!
//! Core overlay engine module.
//! Handles all core functionality including caption parsing, cue lookup,
//! session discovery, the subtitle cache, and the lifecycle coordinator.

pub mod cache;
pub mod captions;
pub mod lifecycle;
pub mod session;
pub mod settings;

// Re-export common types
mod types;
pub use types::*;

mod error;
pub use error::*;
