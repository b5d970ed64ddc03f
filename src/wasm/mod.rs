//! WASM browser host for PhantomTrack
//!
//! This module wires DOM signals, browser timers and network primitives into
//! the engine and exposes the page-facing JavaScript surface.

#[cfg(feature = "wasm")]
pub mod utils;

#[cfg(feature = "wasm")]
pub mod bindings;

#[cfg(feature = "wasm")]
pub mod host;

// Re-export main types
#[cfg(feature = "wasm")]
pub use bindings::{event, get_session_id, init, track, version};

#[cfg(feature = "wasm")]
pub use host::{BrowserScheduler, BrowserTransport};
