//! Single-shot inactivity timer
//!
//! Re-armed (cancel + restart) on every interaction. It is the only source of
//! the `Active -> Inactive` edge apart from the page being hidden, which
//! invokes the same expiry directly.

use super::{PresenceChange, PresenceState, Visibility};
use crate::scheduler::{Scheduler, TimerId, TimerTask};
use crate::Millis;

#[derive(Debug)]
pub struct InactivityTimer {
    threshold: Millis,
    pending: Option<TimerId>,
}

impl InactivityTimer {
    pub fn new(threshold: Millis) -> Self {
        Self {
            threshold,
            pending: None,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Cancel any pending expiry and start a fresh one
    pub fn rearm<S: Scheduler>(&mut self, scheduler: &mut S) {
        self.cancel(scheduler);
        self.pending = Some(scheduler.schedule_after(self.threshold, TimerTask::Inactivity));
    }

    pub fn cancel<S: Scheduler>(&mut self, scheduler: &mut S) {
        if let Some(id) = self.pending.take() {
            scheduler.cancel(id);
        }
    }

    /// The scheduled expiry fired
    pub fn on_fired(
        &mut self,
        presence: &mut PresenceState,
        now: Millis,
        visibility: Visibility,
    ) -> PresenceChange {
        self.pending = None;
        Self::expire(presence, now, visibility)
    }

    /// Flush active time and flip to inactive; idempotent while inactive
    pub fn expire(presence: &mut PresenceState, now: Millis, visibility: Visibility) -> PresenceChange {
        presence.deactivate(now, visibility)
    }
}
