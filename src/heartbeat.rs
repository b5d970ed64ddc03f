//! Heartbeat scheduler
//!
//! A recurring timer reporting presence while the page is visible, plus a
//! one-off heartbeat shortly after load so early engagement shows up without
//! waiting a full interval.

use crate::config::Timing;
use crate::scheduler::{Scheduler, TimerId, TimerTask};
use crate::Millis;
use tracing::trace;

#[derive(Debug)]
pub struct HeartbeatScheduler {
    interval: Millis,
    initial_delay: Millis,
    recurring: Option<TimerId>,
}

impl HeartbeatScheduler {
    pub fn new(timing: &Timing) -> Self {
        Self {
            interval: timing.heartbeat_interval_ms,
            initial_delay: timing.initial_heartbeat_delay_ms,
            recurring: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.recurring.is_some()
    }

    /// Start the recurring heartbeat. No-op when already running.
    pub fn start<S: Scheduler>(&mut self, scheduler: &mut S) -> bool {
        if self.recurring.is_some() {
            return false;
        }
        self.recurring = Some(scheduler.schedule_repeating(self.interval, TimerTask::Heartbeat));
        trace!(interval_ms = self.interval, "heartbeat started");
        true
    }

    pub fn stop<S: Scheduler>(&mut self, scheduler: &mut S) -> bool {
        match self.recurring.take() {
            Some(id) => {
                scheduler.cancel(id);
                trace!("heartbeat stopped");
                true
            }
            None => false,
        }
    }

    /// Schedule the one-off heartbeat after load
    pub fn schedule_initial<S: Scheduler>(&self, scheduler: &mut S) -> TimerId {
        scheduler.schedule_after(self.initial_delay, TimerTask::InitialHeartbeat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::ManualScheduler;

    #[test]
    fn test_start_is_idempotent() {
        let mut scheduler = ManualScheduler::new(0);
        let mut heartbeat = HeartbeatScheduler::new(&Timing::default());

        assert!(heartbeat.start(&mut scheduler));
        assert!(!heartbeat.start(&mut scheduler));
        assert_eq!(scheduler.pending(), 1);
        assert!(heartbeat.is_running());
    }

    #[test]
    fn test_stop_cancels() {
        let mut scheduler = ManualScheduler::new(0);
        let mut heartbeat = HeartbeatScheduler::new(&Timing::default());

        heartbeat.start(&mut scheduler);
        assert!(heartbeat.stop(&mut scheduler));
        assert!(!heartbeat.stop(&mut scheduler));
        assert_eq!(scheduler.pending(), 0);

        // Restart after stop schedules a fresh timer
        assert!(heartbeat.start(&mut scheduler));
        assert_eq!(scheduler.next_due(), Some(30_000));
    }

    #[test]
    fn test_initial_heartbeat_delay() {
        let mut scheduler = ManualScheduler::new(0);
        let heartbeat = HeartbeatScheduler::new(&Timing::default());
        heartbeat.schedule_initial(&mut scheduler);

        let fired = scheduler.pop_due(1_000).unwrap();
        assert_eq!(fired.task, TimerTask::InitialHeartbeat);
        assert_eq!(fired.at, 1_000);
    }
}
