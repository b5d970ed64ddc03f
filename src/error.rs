//! Error types for the tracking engine
//!
//! Errors never reach the host page. The WASM boundary converts every
//! `Err` into a silent no-op; inside the crate they tell callers (and tests)
//! exactly why an operation did nothing.

use thiserror::Error;

/// Result type for tracker operations
pub type Result<T> = std::result::Result<T, TrackError>;

/// Errors that can occur while configuring the tracker or building events
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TrackError {
    /// No track identifier was found on the script reference
    #[error("Missing track identifier")]
    MissingTrackId,

    /// Track identifier does not match `track_` + 20..=30 alphanumerics
    #[error("Invalid track identifier: {0}")]
    InvalidTrackId(String),

    /// Endpoint was empty
    #[error("Missing collector endpoint")]
    MissingEndpoint,

    /// Custom event name was empty
    #[error("Event name must not be empty")]
    EmptyEventName,

    /// Property bag or payload could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Serialized property bag is over the size limit
    #[error("Payload too large: {size} characters (max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// Transport primitive failed before a request was issued
    #[error("Transport error: {0}")]
    Transport(String),

    /// Browser primitive missing or misbehaving
    #[error("Environment error: {0}")]
    Environment(String),
}

impl TrackError {
    /// Configuration errors disable the whole engine
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            TrackError::MissingTrackId | TrackError::InvalidTrackId(_) | TrackError::MissingEndpoint
        )
    }

    /// Payload errors drop a single event without retry
    pub fn is_payload_error(&self) -> bool {
        matches!(
            self,
            TrackError::EmptyEventName
                | TrackError::Serialization(_)
                | TrackError::PayloadTooLarge { .. }
        )
    }
}

impl From<serde_json::Error> for TrackError {
    fn from(err: serde_json::Error) -> Self {
        TrackError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classes() {
        assert!(TrackError::MissingEndpoint.is_config_error());
        assert!(TrackError::InvalidTrackId("x".into()).is_config_error());
        assert!(!TrackError::MissingEndpoint.is_payload_error());

        let too_large = TrackError::PayloadTooLarge { size: 10_001, max: 10_000 };
        assert!(too_large.is_payload_error());
        assert!(!too_large.is_config_error());
        assert!(!TrackError::Transport("offline".into()).is_payload_error());
    }

    #[test]
    fn test_display() {
        let err = TrackError::PayloadTooLarge { size: 12, max: 10 };
        assert_eq!(err.to_string(), "Payload too large: 12 characters (max 10)");
    }
}
