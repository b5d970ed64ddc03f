//! Bounded linear backoff
//!
//! Retry volume per page load is tiny, so the delay grows linearly:
//! `delay * 1`, `delay * 2`, `delay * 3` with the defaults.

use super::{EventFields, EventType};
use crate::config::Timing;
use crate::Millis;

/// Pending re-send of an event. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryAttempt {
    pub event_type: EventType,
    pub fields: EventFields,
    pub retry_count: u32,
}

impl RetryAttempt {
    /// First attempt of a send
    pub fn first(event_type: EventType, fields: EventFields) -> Self {
        Self {
            event_type,
            fields,
            retry_count: 0,
        }
    }

    pub fn next(self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay_ms: Millis,
}

impl RetryPolicy {
    pub fn from_timing(timing: &Timing) -> Self {
        Self {
            max_retries: timing.max_retries,
            delay_ms: timing.retry_delay_ms,
        }
    }

    /// Delay before retrying an attempt that failed with `retry_count`, or
    /// `None` once the budget is spent
    pub fn delay_for(&self, retry_count: u32) -> Option<Millis> {
        (retry_count < self.max_retries).then(|| self.delay_ms * (Millis::from(retry_count) + 1))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_timing(&Timing::default())
    }
}
