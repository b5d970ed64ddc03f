//! Delivery pipeline
//!
//! `send` builds the payload, walks the ordered transport strategies for the
//! event type and either finishes (beacon accepted), parks the attempt until
//! its response arrives (request issued) or drops it. Responses come back
//! through `on_response`, which schedules linear-backoff retries on the
//! shared scheduler.
//!
//! Nothing here ever fails loudly: every path ends in a [`SendOutcome`] or a
//! [`ResponseDisposition`], and a dropped event is only logged.

pub mod custom;
pub mod event;
pub mod retry;
pub mod transport;

pub use custom::{CustomEvent, MAX_EVENT_NAME_LEN, MAX_PROPERTIES_LEN};
pub use event::{EventFields, EventType, OutboundEvent};
pub use retry::{RetryAttempt, RetryPolicy};
pub use transport::{
    strategies_for, PostRequest, RequestId, ResponseClass, ResponseOutcome, Transport,
    TransportStrategy, CONTENT_TYPE,
};

use crate::page::PageContext;
use crate::scheduler::{Scheduler, TimerTask};
use crate::session::Session;
use crate::Millis;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Why an event was given up on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    Serialization(String),
    Transport(String),
    RetriesExhausted,
    Rejected(u16),
}

/// Result of handing an event to the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Accepted by the beacon primitive; nothing more will be heard
    Beaconed,
    /// Request issued, response pending
    InFlight(RequestId),
    Dropped(DropReason),
}

/// Result of processing a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseDisposition {
    Delivered,
    RetryScheduled { retry_count: u32, delay_ms: Millis },
    Dropped(DropReason),
    /// Response for a request the pipeline is not tracking
    Unknown,
}

#[derive(Debug)]
pub struct DeliveryPipeline {
    policy: RetryPolicy,
    in_flight: HashMap<RequestId, RetryAttempt>,
}

impl DeliveryPipeline {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            in_flight: HashMap::new(),
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Requests whose response has not arrived yet
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }

    /// Send one attempt of an event
    pub fn send<T: Transport>(
        &mut self,
        session: &Session,
        page: &PageContext,
        attempt: RetryAttempt,
        transport: &mut T,
    ) -> SendOutcome {
        let event = OutboundEvent::build(session, page, attempt.event_type, &attempt.fields);
        let body = match event.to_body() {
            Ok(body) => body,
            Err(e) => {
                debug!(event_type = %attempt.event_type, error = %e, "dropping unserializable event");
                return SendOutcome::Dropped(DropReason::Serialization(e.to_string()));
            }
        };

        for strategy in strategies_for(attempt.event_type) {
            match strategy {
                TransportStrategy::Beacon => match transport.send_beacon(session.endpoint(), &body) {
                    Ok(true) => {
                        trace!(event_type = %attempt.event_type, "beacon queued");
                        return SendOutcome::Beaconed;
                    }
                    Ok(false) => debug!(event_type = %attempt.event_type, "beacon refused, falling back"),
                    Err(e) => debug!(event_type = %attempt.event_type, error = %e, "beacon unavailable"),
                },
                TransportStrategy::Request => {
                    let request = PostRequest::new(session.endpoint(), body);
                    return match transport.post(request) {
                        Ok(id) => {
                            trace!(
                                event_type = %attempt.event_type,
                                retry_count = attempt.retry_count,
                                request = id.0,
                                "request issued"
                            );
                            self.in_flight.insert(id, attempt);
                            SendOutcome::InFlight(id)
                        }
                        Err(e) => {
                            debug!(event_type = %attempt.event_type, error = %e, "request could not be issued");
                            SendOutcome::Dropped(DropReason::Transport(e.to_string()))
                        }
                    };
                }
            }
        }

        // Every strategy list ends with Request
        SendOutcome::Dropped(DropReason::Transport("no transport strategy".to_string()))
    }

    /// Handle the outcome of an in-flight request
    pub fn on_response<S: Scheduler>(
        &mut self,
        id: RequestId,
        outcome: ResponseOutcome,
        scheduler: &mut S,
    ) -> ResponseDisposition {
        let Some(attempt) = self.in_flight.remove(&id) else {
            return ResponseDisposition::Unknown;
        };

        match outcome.classify() {
            ResponseClass::Success => ResponseDisposition::Delivered,
            ResponseClass::Rejected(status) => {
                debug!(event_type = %attempt.event_type, status, "collector rejected event");
                ResponseDisposition::Dropped(DropReason::Rejected(status))
            }
            ResponseClass::RateLimited | ResponseClass::NetworkFailure => {
                self.schedule_retry(attempt, scheduler)
            }
        }
    }

    fn schedule_retry<S: Scheduler>(
        &mut self,
        attempt: RetryAttempt,
        scheduler: &mut S,
    ) -> ResponseDisposition {
        match self.policy.delay_for(attempt.retry_count) {
            Some(delay_ms) => {
                let next = attempt.next();
                let retry_count = next.retry_count;
                debug!(event_type = %next.event_type, retry_count, delay_ms, "retry scheduled");
                scheduler.schedule_after(delay_ms, TimerTask::Retry(next));
                ResponseDisposition::RetryScheduled {
                    retry_count,
                    delay_ms,
                }
            }
            None => {
                debug!(event_type = %attempt.event_type, "retries exhausted, dropping event");
                ResponseDisposition::Dropped(DropReason::RetriesExhausted)
            }
        }
    }
}
