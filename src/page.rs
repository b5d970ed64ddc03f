//! Page context attached to every outbound event

use serde::{Deserialize, Serialize};
use url::Url;

const MAX_URL_LEN: usize = 2048;
const MAX_USER_AGENT_LEN: usize = 500;
const MAX_SCREEN_DIMENSION: u32 = 100_000;

/// Device class sniffed from the user agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Desktop,
    Mobile,
    Tablet,
    Unknown,
}

const TABLET_MARKERS: &[&str] = &["tablet", "ipad", "playbook", "silk"];

const MOBILE_MARKERS: &[&str] = &[
    "Mobile",
    "Android",
    "iPhone",
    "iPod",
    "IEMobile",
    "BlackBerry",
    "Kindle",
    "Silk-Accelerated",
    "hpwOS",
    "webOS",
    "Opera Mobi",
    "Opera Mini",
];

impl DeviceType {
    /// Classify a user agent. `None` means the browser would not tell us.
    pub fn from_user_agent(user_agent: Option<&str>) -> Self {
        let Some(ua) = user_agent else {
            return DeviceType::Unknown;
        };
        let lower = ua.to_ascii_lowercase();

        // Android without "mobi" anywhere after it is a tablet
        let android_tablet = lower
            .find("android")
            .map(|idx| !lower[idx..].contains("mobi"))
            .unwrap_or(false);

        if android_tablet || TABLET_MARKERS.iter().any(|m| lower.contains(m)) {
            DeviceType::Tablet
        } else if MOBILE_MARKERS.iter().any(|m| ua.contains(m)) {
            DeviceType::Mobile
        } else {
            DeviceType::Desktop
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceType::Desktop => "desktop",
            DeviceType::Mobile => "mobile",
            DeviceType::Tablet => "tablet",
            DeviceType::Unknown => "unknown",
        }
    }
}

/// Static description of the page the session runs on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageContext {
    pub page_url: String,
    pub referrer: String,
    pub device_type: DeviceType,
    pub screen_resolution: String,
    pub user_agent: String,
}

impl PageContext {
    /// Normalize raw browser values into the wire form
    pub fn new(
        href: &str,
        referrer: &str,
        user_agent: Option<&str>,
        screen: Option<(u32, u32)>,
    ) -> Self {
        let referrer = sanitize_url(referrer);

        Self {
            page_url: sanitize_url(href),
            referrer: if referrer.is_empty() {
                "direct".to_string()
            } else {
                referrer
            },
            device_type: DeviceType::from_user_agent(user_agent),
            screen_resolution: screen
                .map(|(w, h)| screen_resolution(w, h))
                .unwrap_or_else(|| "unknown".to_string()),
            user_agent: truncate_chars(user_agent.unwrap_or_default(), MAX_USER_AGENT_LEN),
        }
    }
}

/// Strip credentials and cap length. Unparsable input is only capped.
pub fn sanitize_url(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(mut url) => {
            // Both setters only fail for cannot-be-a-base URLs, which carry no credentials
            let _ = url.set_username("");
            let _ = url.set_password(None);
            truncate_chars(url.as_str(), MAX_URL_LEN)
        }
        Err(_) => truncate_chars(raw, MAX_URL_LEN),
    }
}

/// `"{w}x{h}"` for plausible dimensions, otherwise `"unknown"`
pub fn screen_resolution(width: u32, height: u32) -> String {
    let plausible = |d: u32| d > 0 && d < MAX_SCREEN_DIMENSION;
    if plausible(width) && plausible(height) {
        format!("{}x{}", width, height)
    } else {
        "unknown".to_string()
    }
}

pub(crate) fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => s[..idx].to_string(),
        None => s.to_string(),
    }
}
