//! Activity tracking - presence and accumulated active time
//!
//! Presence is a two-state machine:
//! - `Active -> Inactive` when the inactivity timer expires or the page is hidden
//! - `Inactive -> Active` on an interaction or the page becoming visible
//!
//! Active time only grows while active and visible, by gaps shorter than the
//! inactivity threshold.
mod clock;
mod inactivity;

pub use clock::{PresenceChange, PresenceState};
pub use inactivity::InactivityTimer;

use serde::{Deserialize, Serialize};

/// DOM events counted as user interaction
pub const ACTIVITY_EVENTS: &[&str] = &[
    "mousedown",
    "mousemove",
    "keypress",
    "scroll",
    "touchstart",
    "click",
];

/// Page visibility as reported by `document.visibilityState`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Visible,
    Hidden,
}

impl Visibility {
    pub fn is_visible(&self) -> bool {
        matches!(self, Visibility::Visible)
    }
}
