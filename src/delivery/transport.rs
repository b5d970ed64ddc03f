//! Transport seam between the pipeline and the network
//!
//! Two primitives exist in the browser: a fire-and-forget beacon that
//! survives page teardown but reports nothing back, and a `fetch` POST whose
//! response arrives later through `Tracker::on_response`.

use super::EventType;
use crate::error::Result;

/// Content type that keeps cross-origin POSTs "simple" (no preflight)
pub const CONTENT_TYPE: &str = "text/plain";

/// HTTP status the collector uses for rate limiting
pub const STATUS_TOO_MANY_REQUESTS: u16 = 429;

/// Handle for a request whose response is still pending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

/// One way of getting a payload to the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportStrategy {
    /// Best effort, no response visibility
    Beacon,
    /// Network request with response handling and retry
    Request,
}

const TEARDOWN_STRATEGIES: &[TransportStrategy] = &[TransportStrategy::Beacon, TransportStrategy::Request];
const DEFAULT_STRATEGIES: &[TransportStrategy] = &[TransportStrategy::Request];

/// Ordered strategies to try for an event type
pub fn strategies_for(event_type: EventType) -> &'static [TransportStrategy] {
    if event_type.is_teardown() {
        TEARDOWN_STRATEGIES
    } else {
        DEFAULT_STRATEGIES
    }
}

/// POST issued to the collector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostRequest {
    pub endpoint: String,
    pub body: String,
    pub content_type: &'static str,
    /// Ask the browser to finish the request even if the page unloads
    pub keepalive: bool,
}

impl PostRequest {
    pub fn new(endpoint: &str, body: String) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            body,
            content_type: CONTENT_TYPE,
            keepalive: true,
        }
    }
}

/// What eventually happened to a POST
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// The collector answered with this status
    Status(u16),
    /// The request never completed
    NetworkError(String),
}

/// Delivery-relevant reading of a response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    Success,
    RateLimited,
    NetworkFailure,
    Rejected(u16),
}

impl ResponseOutcome {
    pub fn classify(&self) -> ResponseClass {
        match self {
            ResponseOutcome::Status(status) if (200..300).contains(status) => ResponseClass::Success,
            ResponseOutcome::Status(STATUS_TOO_MANY_REQUESTS) => ResponseClass::RateLimited,
            ResponseOutcome::Status(status) => ResponseClass::Rejected(*status),
            ResponseOutcome::NetworkError(_) => ResponseClass::NetworkFailure,
        }
    }
}

/// Network primitives supplied by the host
pub trait Transport {
    /// Queue a beacon. `Ok(false)` means the browser refused it; `Err` means
    /// the primitive is missing or threw.
    fn send_beacon(&mut self, endpoint: &str, body: &str) -> Result<bool>;

    /// Start a POST. The outcome is reported later with the returned id.
    fn post(&mut self, request: PostRequest) -> Result<RequestId>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_order() {
        assert_eq!(
            strategies_for(EventType::Leave),
            &[TransportStrategy::Beacon, TransportStrategy::Request]
        );
        assert_eq!(strategies_for(EventType::PageviewEnd)[0], TransportStrategy::Beacon);
        assert_eq!(strategies_for(EventType::Heartbeat), &[TransportStrategy::Request]);
        assert_eq!(strategies_for(EventType::CustomEvent), &[TransportStrategy::Request]);
    }

    #[test]
    fn test_classify() {
        assert_eq!(ResponseOutcome::Status(200).classify(), ResponseClass::Success);
        assert_eq!(ResponseOutcome::Status(204).classify(), ResponseClass::Success);
        assert_eq!(ResponseOutcome::Status(429).classify(), ResponseClass::RateLimited);
        assert_eq!(ResponseOutcome::Status(500).classify(), ResponseClass::Rejected(500));
        assert_eq!(
            ResponseOutcome::NetworkError("offline".into()).classify(),
            ResponseClass::NetworkFailure
        );
    }

    #[test]
    fn test_post_request_defaults() {
        let request = PostRequest::new("https://c.example/track", "{}".to_string());
        assert_eq!(request.content_type, "text/plain");
        assert!(request.keepalive);
    }
}
