//! Shared fixtures for integration tests
#![allow(dead_code)]

use phantom_track::{
    ManualScheduler, PageContext, PostRequest, RequestId, Result, TrackError, Tracker,
    TrackerConfig, Transport, Visibility,
};
use serde_json::Value;

pub const TRACK_ID: &str = "track_abcdefghij0123456789";
pub const ENDPOINT: &str = "https://collector.example/track";

/// How the fake browser answers `sendBeacon`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeaconMode {
    Accept,
    Refuse,
    Missing,
}

/// Records every beacon and POST body for inspection
#[derive(Debug)]
pub struct RecordingTransport {
    pub beacon_mode: BeaconMode,
    pub beacons: Vec<Value>,
    pub posts: Vec<(RequestId, Value)>,
    next_id: u64,
}

impl Default for RecordingTransport {
    fn default() -> Self {
        Self {
            beacon_mode: BeaconMode::Accept,
            beacons: Vec::new(),
            posts: Vec::new(),
            next_id: 0,
        }
    }
}

impl RecordingTransport {
    pub fn with_beacon_mode(beacon_mode: BeaconMode) -> Self {
        Self {
            beacon_mode,
            ..Default::default()
        }
    }

    /// Event types of all POSTs, in issue order
    pub fn posted_types(&self) -> Vec<String> {
        self.posts
            .iter()
            .map(|(_, body)| body["event_type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn beaconed_types(&self) -> Vec<String> {
        self.beacons
            .iter()
            .map(|body| body["event_type"].as_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn last_post_id(&self) -> RequestId {
        self.posts.last().expect("no posts").0
    }
}

impl Transport for RecordingTransport {
    fn send_beacon(&mut self, _endpoint: &str, body: &str) -> Result<bool> {
        match self.beacon_mode {
            BeaconMode::Missing => Err(TrackError::Environment("sendBeacon missing".into())),
            mode => {
                self.beacons.push(serde_json::from_str(body).expect("beacon body is JSON"));
                Ok(mode == BeaconMode::Accept)
            }
        }
    }

    fn post(&mut self, request: PostRequest) -> Result<RequestId> {
        assert_eq!(request.endpoint, ENDPOINT);
        assert_eq!(request.content_type, "text/plain");
        self.next_id += 1;
        let id = RequestId(self.next_id);
        self.posts
            .push((id, serde_json::from_str(&request.body).expect("post body is JSON")));
        Ok(id)
    }
}

pub type TestTracker = Tracker<ManualScheduler, RecordingTransport>;

pub fn page() -> PageContext {
    PageContext::new(
        "https://shop.example/cart",
        "https://search.example/",
        Some("Mozilla/5.0 (X11; Linux x86_64) Gecko/20100101 Firefox/121.0"),
        Some((1920, 1080)),
    )
}

/// Tracker created at t=0 on a visible page
pub fn tracker() -> TestTracker {
    tracker_with(RecordingTransport::default())
}

pub fn tracker_with(transport: RecordingTransport) -> TestTracker {
    let config = TrackerConfig::new(TRACK_ID, ENDPOINT).expect("valid config");
    Tracker::new(
        config,
        page(),
        Visibility::Visible,
        0,
        ManualScheduler::new(0),
        transport,
    )
}
