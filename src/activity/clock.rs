//! Activity clock: presence flag plus accumulated active time
//!
//! Interaction signals are high frequency (every mouse move), so
//! `record_activity` is a couple of comparisons and an add. Only gaps
//! strictly inside `(0, threshold)` are counted, which keeps suspended tabs
//! and wall-clock jumps out of the total.

use super::Visibility;
use crate::Millis;
use serde::{Deserialize, Serialize};

/// Presence edge produced by a state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceChange {
    BecameActive,
    BecameInactive,
    Unchanged,
}

/// Mutable presence state owned by the engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceState {
    is_active: bool,
    /// Baseline for the next delta. `None` until the first interaction; the
    /// page load itself is not an interaction.
    last_activity: Option<Millis>,
    active_ms: u64,
    threshold: Millis,
}

impl PresenceState {
    /// Fresh presence: active, nothing accumulated, no baseline yet
    pub fn new(threshold: Millis) -> Self {
        Self {
            is_active: true,
            last_activity: None,
            active_ms: 0,
            threshold,
        }
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn last_activity(&self) -> Option<Millis> {
        self.last_activity
    }

    /// Accumulated active time in milliseconds
    pub fn active_ms(&self) -> u64 {
        self.active_ms
    }

    /// Accumulated active time rounded to whole seconds (half up)
    pub fn active_seconds(&self) -> u64 {
        (self.active_ms + 500) / 1000
    }

    pub fn threshold(&self) -> Millis {
        self.threshold
    }

    /// Handle one interaction signal. Re-arming the inactivity timer is the
    /// caller's job. While hidden the tick only moves the baseline; only the
    /// page becoming visible reactivates a hidden page.
    pub fn record_activity(&mut self, now: Millis, visibility: Visibility) -> PresenceChange {
        if !visibility.is_visible() {
            self.last_activity = Some(now);
            return PresenceChange::Unchanged;
        }

        if !self.is_active {
            // The inactive gap never counts
            self.is_active = true;
            self.last_activity = Some(now);
            return PresenceChange::BecameActive;
        }

        self.accumulate_since_last(now);
        self.last_activity = Some(now);
        PresenceChange::Unchanged
    }

    /// Fold time since the last interaction into the total. Only while active
    /// and visible; presence is left as is.
    pub fn flush(&mut self, now: Millis, visibility: Visibility) {
        if self.is_active && visibility.is_visible() {
            self.accumulate_since_last(now);
            self.last_activity = Some(now);
        }
    }

    /// Flush then flip to inactive. No-op while already inactive.
    pub fn deactivate(&mut self, now: Millis, visibility: Visibility) -> PresenceChange {
        if !self.is_active {
            return PresenceChange::Unchanged;
        }

        self.flush(now, visibility);
        self.is_active = false;
        PresenceChange::BecameInactive
    }

    fn accumulate_since_last(&mut self, now: Millis) {
        let delta = self
            .last_activity
            .and_then(|last| now.checked_sub(last))
            .unwrap_or(0);

        if delta > 0 && delta < self.threshold {
            self.active_ms += delta;
        }
    }
}
