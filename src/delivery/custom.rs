//! Custom events emitted by the host page
use super::EventFields;
use crate::error::{Result, TrackError};
use crate::page::truncate_chars;
use serde::Serialize;
use serde_json::Value;

/// Longer names are truncated
pub const MAX_EVENT_NAME_LEN: usize = 100;

/// Serialized property bags over this many characters are rejected
pub const MAX_PROPERTIES_LEN: usize = 10_000;

/// Validated custom event, ready for the pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomEvent {
    name: String,
    properties_json: String,
}

impl CustomEvent {
    /// Serialize `properties`; a falsy bag (`null`, `false`, `0`, `""`)
    /// becomes an empty object
    pub fn new<P: Serialize + ?Sized>(name: &str, properties: &P) -> Result<Self> {
        let value = serde_json::to_value(properties)?;
        let json = if is_falsy(&value) {
            "{}".to_string()
        } else {
            serde_json::to_string(&value)?
        };
        Self::from_json(name, json)
    }

    /// Take a property bag that was already serialized by the host
    pub fn from_json(name: &str, properties_json: String) -> Result<Self> {
        if name.is_empty() {
            return Err(TrackError::EmptyEventName);
        }

        let size = properties_json.chars().count();
        if size > MAX_PROPERTIES_LEN {
            return Err(TrackError::PayloadTooLarge {
                size,
                max: MAX_PROPERTIES_LEN,
            });
        }

        Ok(Self {
            name: truncate_chars(name, MAX_EVENT_NAME_LEN),
            properties_json,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties_json(&self) -> &str {
        &self.properties_json
    }

    pub fn into_fields(self) -> EventFields {
        EventFields::Custom {
            event_name: self.name,
            event_properties: self.properties_json,
        }
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}
