//! Virtual-time scheduler
//!
//! Time only moves when the owner pops due timers, which makes the
//! activity state machine fully deterministic in tests and lets native hosts
//! replay recorded signal streams.
use super::{Scheduler, TimerId, TimerTask};
use crate::Millis;

#[derive(Debug, Clone)]
struct PendingTimer {
    id: TimerId,
    due: Millis,
    interval: Option<Millis>,
    task: TimerTask,
}

/// A timer that came due
#[derive(Debug, Clone, PartialEq)]
pub struct FiredTimer {
    pub id: TimerId,
    pub at: Millis,
    pub task: TimerTask,
}

/// Deterministic scheduler driven by an explicit clock
#[derive(Debug, Default)]
pub struct ManualScheduler {
    now: Millis,
    next_id: u64,
    timers: Vec<PendingTimer>,
}

impl ManualScheduler {
    /// Create a scheduler whose clock starts at `now`
    pub fn new(now: Millis) -> Self {
        Self {
            now,
            next_id: 0,
            timers: Vec::new(),
        }
    }

    /// Current virtual time
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Move the clock forward without firing anything. Never moves backwards.
    pub fn set_now(&mut self, now: Millis) {
        self.now = self.now.max(now);
    }

    /// Number of pending timers
    pub fn pending(&self) -> usize {
        self.timers.len()
    }

    pub fn is_scheduled(&self, id: TimerId) -> bool {
        self.timers.iter().any(|t| t.id == id)
    }

    /// Due time of the earliest pending timer
    pub fn next_due(&self) -> Option<Millis> {
        self.timers.iter().map(|t| t.due).min()
    }

    /// Pending tasks ordered by due time
    pub fn pending_tasks(&self) -> Vec<(Millis, TimerTask)> {
        let mut tasks: Vec<_> = self.timers.iter().map(|t| (t.due, t.id, t.task.clone())).collect();
        tasks.sort_by_key(|(due, id, _)| (*due, *id));
        tasks.into_iter().map(|(due, _, task)| (due, task)).collect()
    }

    /// Pop the earliest timer due at or before `until`, advancing the clock to
    /// its due time. Ties fire in scheduling order. Repeating timers are
    /// re-armed one interval later.
    pub fn pop_due(&mut self, until: Millis) -> Option<FiredTimer> {
        let idx = self
            .timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= until)
            .min_by_key(|(_, t)| (t.due, t.id))
            .map(|(idx, _)| idx)?;

        let interval = self.timers[idx].interval;
        let fired = match interval {
            Some(interval) => {
                let timer = &mut self.timers[idx];
                let fired = FiredTimer {
                    id: timer.id,
                    at: timer.due,
                    task: timer.task.clone(),
                };
                timer.due += interval;
                fired
            }
            None => {
                let timer = self.timers.swap_remove(idx);
                FiredTimer {
                    id: timer.id,
                    at: timer.due,
                    task: timer.task,
                }
            }
        };

        self.set_now(fired.at);
        Some(fired)
    }

    fn insert(&mut self, delay: Millis, interval: Option<Millis>, task: TimerTask) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.timers.push(PendingTimer {
            id,
            due: self.now + delay,
            interval,
            task,
        });
        id
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_after(&mut self, delay_ms: Millis, task: TimerTask) -> TimerId {
        self.insert(delay_ms, None, task)
    }

    fn schedule_repeating(&mut self, interval_ms: Millis, task: TimerTask) -> TimerId {
        // A zero interval would spin forever inside pop_due loops
        let interval = interval_ms.max(1);
        self.insert(interval, Some(interval), task)
    }

    fn cancel(&mut self, id: TimerId) {
        self.timers.retain(|t| t.id != id);
    }
}
