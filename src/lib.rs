//! Workspace placeholder crate.
//!
//! This crate exists to expose shared feature flags that map to the individual
//! workspace crates (e.g., `core-service`, `core-lipsync`, `core-playback`).
//! Host applications can depend on `avatar-workspace` and enable the documented
//! features without needing to wire each crate individually.

#[cfg(feature = "session")]
pub use core_service as service;

#[cfg(any(feature = "session", feature = "lipsync-only"))]
pub use core_lipsync as lipsync;

#[cfg(feature = "decoder")]
pub use core_playback as playback;
