//! Outbound event payloads
//!
//! Every event is a flat JSON object: session identity, page context,
//! `event_type`, and the fields specific to that type.

use crate::error::Result;
use crate::page::{DeviceType, PageContext};
use crate::session::Session;
use serde::{Deserialize, Serialize};

/// Kind of event reported to the collector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Pageview,
    Heartbeat,
    PageviewEnd,
    Leave,
    CustomEvent,
}

impl EventType {
    /// Events sent while the page is going away
    pub fn is_teardown(&self) -> bool {
        matches!(self, EventType::PageviewEnd | EventType::Leave)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Pageview => "pageview",
            EventType::Heartbeat => "heartbeat",
            EventType::PageviewEnd => "pageview_end",
            EventType::Leave => "leave",
            EventType::CustomEvent => "custom_event",
        }
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event-specific fields
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EventFields {
    #[default]
    None,
    Heartbeat {
        is_active: bool,
    },
    PageviewEnd {
        timespent: u64,
    },
    Custom {
        event_name: String,
        /// Property bag, already serialized to JSON text
        event_properties: String,
    },
}

/// Wire payload. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundEvent {
    pub trackid: String,
    pub session_id: String,
    pub page_url: String,
    pub referrer: String,
    pub device_type: DeviceType,
    pub screen_resolution: String,
    pub user_agent: String,
    pub event_type: EventType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timespent: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_properties: Option<String>,
}

impl OutboundEvent {
    /// Merge session identity and page context with the event fields
    pub fn build(
        session: &Session,
        page: &PageContext,
        event_type: EventType,
        fields: &EventFields,
    ) -> Self {
        let mut event = Self {
            trackid: session.track_id().to_string(),
            session_id: session.session_id().to_string(),
            page_url: page.page_url.clone(),
            referrer: page.referrer.clone(),
            device_type: page.device_type,
            screen_resolution: page.screen_resolution.clone(),
            user_agent: page.user_agent.clone(),
            event_type,
            is_active: None,
            timespent: None,
            event_name: None,
            event_properties: None,
        };

        match fields {
            EventFields::None => {}
            EventFields::Heartbeat { is_active } => event.is_active = Some(*is_active),
            EventFields::PageviewEnd { timespent } => event.timespent = Some(*timespent),
            EventFields::Custom {
                event_name,
                event_properties,
            } => {
                event.event_name = Some(event_name.clone());
                event.event_properties = Some(event_properties.clone());
            }
        }

        event
    }

    /// JSON text sent as the request body
    pub fn to_body(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrackerConfig;
    use serde_json::Value;

    fn fixture() -> (Session, PageContext) {
        let config = TrackerConfig::new("track_abcdefghij0123456789", "https://c.example/track").unwrap();
        let page = PageContext::new(
            "https://example.com/pricing",
            "https://google.com/",
            Some("Mozilla/5.0 (X11; Linux x86_64)"),
            Some((1920, 1080)),
        );
        (Session::new(&config, 1_000), page)
    }

    #[test]
    fn test_required_keys_present() {
        let (session, page) = fixture();
        let event = OutboundEvent::build(&session, &page, EventType::Pageview, &EventFields::None);
        let json: Value = serde_json::from_str(&event.to_body().unwrap()).unwrap();
        let obj = json.as_object().unwrap();

        for key in [
            "trackid",
            "session_id",
            "page_url",
            "referrer",
            "device_type",
            "screen_resolution",
            "user_agent",
            "event_type",
        ] {
            assert!(obj.contains_key(key), "missing {}", key);
        }
        assert_eq!(obj.len(), 8);
        assert_eq!(obj["event_type"], "pageview");
        assert_eq!(obj["device_type"], "desktop");
        assert_eq!(obj["screen_resolution"], "1920x1080");
    }

    #[test]
    fn test_event_specific_fields() {
        let (session, page) = fixture();

        let heartbeat = OutboundEvent::build(
            &session,
            &page,
            EventType::Heartbeat,
            &EventFields::Heartbeat { is_active: false },
        );
        let json: Value = serde_json::to_value(&heartbeat).unwrap();
        assert_eq!(json["is_active"], false);
        assert!(json.get("timespent").is_none());

        let end = OutboundEvent::build(
            &session,
            &page,
            EventType::PageviewEnd,
            &EventFields::PageviewEnd { timespent: 42 },
        );
        let json: Value = serde_json::to_value(&end).unwrap();
        assert_eq!(json["event_type"], "pageview_end");
        assert_eq!(json["timespent"], 42);

        let custom = OutboundEvent::build(
            &session,
            &page,
            EventType::CustomEvent,
            &EventFields::Custom {
                event_name: "signup".into(),
                event_properties: r#"{"plan":"pro"}"#.into(),
            },
        );
        let json: Value = serde_json::to_value(&custom).unwrap();
        assert_eq!(json["event_name"], "signup");
        assert_eq!(json["event_properties"], r#"{"plan":"pro"}"#);
    }

    #[test]
    fn test_teardown_classes() {
        assert!(EventType::Leave.is_teardown());
        assert!(EventType::PageviewEnd.is_teardown());
        assert!(!EventType::Heartbeat.is_teardown());
        assert_eq!(EventType::CustomEvent.to_string(), "custom_event");
    }
}
