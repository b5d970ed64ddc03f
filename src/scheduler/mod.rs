//! Timer abstraction shared by the inactivity timer, the heartbeat and retries
//!
//! The engine never touches ambient timer primitives. It asks a [`Scheduler`]
//! to run a [`TimerTask`] later and the host hands the task back to
//! `Tracker::on_timer` when it fires. In the browser this is
//! `setTimeout`/`setInterval`; natively and in tests it is the virtual-time
//! [`ManualScheduler`].
mod manual;

pub use manual::{FiredTimer, ManualScheduler};

use crate::delivery::RetryAttempt;
use crate::Millis;

/// Handle returned by a scheduler, used to cancel the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Work the engine wants done when a timer fires
#[derive(Debug, Clone, PartialEq)]
pub enum TimerTask {
    /// No activity for the whole threshold
    Inactivity,
    /// Recurring heartbeat tick
    Heartbeat,
    /// One-off heartbeat shortly after load
    InitialHeartbeat,
    /// Re-send of a failed event
    Retry(RetryAttempt),
}

/// Cooperative single-threaded timer service
pub trait Scheduler {
    /// Run `task` once after `delay_ms`
    fn schedule_after(&mut self, delay_ms: Millis, task: TimerTask) -> TimerId;

    /// Run `task` every `interval_ms` until cancelled
    fn schedule_repeating(&mut self, interval_ms: Millis, task: TimerTask) -> TimerId;

    /// Cancel a pending timer. Unknown or already fired ids are ignored.
    fn cancel(&mut self, id: TimerId);
}
