//! Per-page-load session identity

use crate::config::{TrackId, TrackerConfig};
use crate::Millis;
use uuid::Uuid;

const RANDOM_PART_LEN: usize = 12;

/// Identity shared by every event of one page load. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    session_id: String,
    track_id: TrackId,
    endpoint: String,
}

impl Session {
    pub fn new(config: &TrackerConfig, now: Millis) -> Self {
        Self {
            session_id: generate_session_id(now),
            track_id: config.track_id.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// `sess_{load time}_{12 random alphanumerics}`
pub fn generate_session_id(now: Millis) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("sess_{}_{}", now, &random[..RANDOM_PART_LEN])
}
