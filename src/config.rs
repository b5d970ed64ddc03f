//! Tracker configuration
//!
//! The track identifier and endpoint come from the `<script>` reference that
//! loaded the tracker:
//!
//! ```text
//! <script src="https://cdn.example/phantom.js?trackid=track_abc...&endpoint=https://collector/track"></script>
//! ```
//!
//! Timing knobs default to the values the collector expects and only change
//! in tests or native embeddings.

use crate::error::{Result, TrackError};
use serde::{Deserialize, Serialize};
use url::Url;

/// Collector used when the script reference carries no `endpoint`
pub const DEFAULT_ENDPOINT: &str = "https://phantomtrack.42web.io/track";

/// Relative collector path used during local development
pub const LOCAL_ENDPOINT: &str = "track";

/// Substring identifying our script among the page's `<script>` tags
pub const SCRIPT_MARKER: &str = "phantom.js";

const TRACK_ID_PREFIX: &str = "track_";
const TRACK_ID_MIN_SUFFIX: usize = 20;
const TRACK_ID_MAX_SUFFIX: usize = 30;

/// Validated per-site track identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TrackId(String);

impl TrackId {
    /// Parse `track_` followed by 20 to 30 ASCII alphanumerics
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.is_empty() {
            return Err(TrackError::MissingTrackId);
        }

        let valid = raw
            .strip_prefix(TRACK_ID_PREFIX)
            .map(|suffix| {
                (TRACK_ID_MIN_SUFFIX..=TRACK_ID_MAX_SUFFIX).contains(&suffix.len())
                    && suffix.bytes().all(|b| b.is_ascii_alphanumeric())
            })
            .unwrap_or(false);

        if valid {
            Ok(Self(raw.to_string()))
        } else {
            Err(TrackError::InvalidTrackId(raw.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Engine timing parameters, all in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Quiet period after which presence flips to inactive
    pub inactivity_threshold_ms: u64,
    /// Cadence of the recurring heartbeat
    pub heartbeat_interval_ms: u64,
    /// Delay of the one-off heartbeat after load
    pub initial_heartbeat_delay_ms: u64,
    /// Retries after the first failed request
    pub max_retries: u32,
    /// Linear backoff step
    pub retry_delay_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            inactivity_threshold_ms: 30_000,
            heartbeat_interval_ms: 30_000,
            initial_heartbeat_delay_ms: 1_000,
            max_retries: 3,
            retry_delay_ms: 2_000,
        }
    }
}

/// Fully validated configuration. A tracker can only be built from one of these,
/// so a page with a bad track id never gets a partially running engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub track_id: TrackId,
    pub endpoint: String,
    pub timing: Timing,
    pub debug: bool,
}

impl TrackerConfig {
    pub fn new(track_id: &str, endpoint: impl Into<String>) -> Result<Self> {
        let endpoint = endpoint.into();
        if endpoint.trim().is_empty() {
            return Err(TrackError::MissingEndpoint);
        }

        Ok(Self {
            track_id: TrackId::parse(track_id)?,
            endpoint,
            timing: Timing::default(),
            debug: false,
        })
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Build from discovered script parameters and the page hostname
    pub fn from_script(params: &ScriptParams, hostname: &str) -> Result<Self> {
        let track_id = params.track_id.as_deref().ok_or(TrackError::MissingTrackId)?;
        let endpoint = resolve_endpoint(params.endpoint.as_deref(), hostname);
        Ok(Self::new(track_id, endpoint)?.with_debug(params.debug))
    }
}

/// Parameters read from a script reference's query string
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScriptParams {
    pub track_id: Option<String>,
    pub endpoint: Option<String>,
    pub debug: bool,
}

impl ScriptParams {
    /// Read `trackid`, `endpoint` and `debug` from a script `src`
    pub fn from_src(src: &str) -> Option<Self> {
        let url = Url::parse(src).ok()?;
        let mut params = Self::default();

        for (key, value) in url.query_pairs() {
            match key.as_ref() {
                "trackid" if !value.is_empty() => params.track_id = Some(value.into_owned()),
                "endpoint" if !value.is_empty() => params.endpoint = Some(value.into_owned()),
                "debug" => params.debug = value == "1" || value == "true",
                _ => {}
            }
        }

        Some(params)
    }

    /// Prefer the currently executing script; otherwise scan every script
    /// reference from last to first for ours with a `trackid`.
    pub fn discover<'a, I>(current_src: Option<&str>, all_srcs: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
        I::IntoIter: DoubleEndedIterator,
    {
        if let Some(params) = current_src.and_then(Self::from_src) {
            if params.track_id.is_some() {
                return Some(params);
            }
        }

        all_srcs
            .into_iter()
            .rev()
            .filter(|src| src.contains(SCRIPT_MARKER))
            .filter_map(Self::from_src)
            .find(|params| params.track_id.is_some())
    }
}

/// Explicit endpoint wins; local development hosts post to a relative path
pub fn resolve_endpoint(custom: Option<&str>, hostname: &str) -> String {
    match custom {
        Some(endpoint) if !endpoint.is_empty() => endpoint.to_string(),
        _ if is_local_host(hostname) => LOCAL_ENDPOINT.to_string(),
        _ => DEFAULT_ENDPOINT.to_string(),
    }
}

fn is_local_host(hostname: &str) -> bool {
    hostname == "localhost" || hostname == "127.0.0.1" || hostname.starts_with("192.168.")
}
