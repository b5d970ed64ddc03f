//! PhantomTrack Core - session activity and delivery engine
//!
//! This is the Rust core of the PhantomTrack page analytics script, compiled
//! to both native and WASM. It implements:
//! - Presence tracking with accumulated active time
//! - Inactivity timer and heartbeat scheduling over one scheduler abstraction
//! - Visibility and teardown coordination
//! - Event delivery with beacon/request transports and linear-backoff retry
//!
//! # Examples
//!
//! ```rust
//! use phantom_track::{TrackerConfig, TrackId};
//!
//! let config = TrackerConfig::new("track_abcdefghij0123456789", "https://collector.example/track").unwrap();
//! assert_eq!(config.timing.inactivity_threshold_ms, 30_000);
//! assert!(TrackId::parse("track_nope").is_err());
//! ```

pub mod activity;
pub mod config;
pub mod delivery;
pub mod engine;
pub mod error;
pub mod heartbeat;
pub mod page;
pub mod scheduler;
pub mod session;

#[cfg(feature = "wasm")]
pub mod wasm;

// Re-exports for convenience
pub use activity::{PresenceChange, PresenceState, Visibility};
pub use config::{ScriptParams, Timing, TrackId, TrackerConfig};
pub use delivery::{
    CustomEvent, DropReason, EventFields, EventType, OutboundEvent, PostRequest, RequestId,
    ResponseDisposition, ResponseOutcome, SendOutcome, Transport,
};
pub use engine::{Finalization, TimerOutcome, Tracker};
pub use error::{Result, TrackError};
pub use page::{DeviceType, PageContext};
pub use scheduler::{ManualScheduler, Scheduler, TimerId, TimerTask};
pub use session::Session;

/// Milliseconds, either a wall-clock timestamp or a duration
pub type Millis = u64;

/// Version reported to the host page
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
