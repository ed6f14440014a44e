//! Subpause
//!
//! A secondary-language caption overlay engine for a streaming watch page:
//! while playback is paused, the caption cue active at the paused timestamp
//! is shown in the viewer's overlay language, and cleared again on resume.
//!
//! The crate is host-agnostic. Everything that touches the embedding
//! environment (the player application, the network feed, the rendered
//! overlay) sits behind traits in [`core::session`], [`core::cache`], and
//! [`core::lifecycle`]; the [`core::lifecycle::LifecycleCoordinator`] wires
//! them into one per-navigation state machine.

pub mod core;
