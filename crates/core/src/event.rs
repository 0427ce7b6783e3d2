//! Event wire types — the payload posted to the collector and the device
//! classification carried on it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Event name emitted for automatic page-view tracking.
pub const PAGE_VIEW: &str = "page_view";

/// Caller-supplied event properties.
pub type Properties = HashMap<String, serde_json::Value>;

/// Schema fields of the payload that caller properties may override.
/// `timestamp` is deliberately absent: it is stamped at send time and a
/// caller-supplied `timestamp` key is carried as metadata instead.
pub const SCHEMA_FIELDS: [&str; 6] = [
    "service",
    "event",
    "path",
    "referrer",
    "user_browser",
    "user_device",
];

/// Device classification derived from the user-agent string.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeviceClass {
    Mobile,
    Tablet,
    Desktop,
    Unknown,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceClass::Mobile => "mobile",
            DeviceClass::Tablet => "tablet",
            DeviceClass::Desktop => "desktop",
            DeviceClass::Unknown => "unknown",
        }
    }

    /// Case-insensitive parse of a class name, for caller overrides.
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "mobile" => Some(DeviceClass::Mobile),
            "tablet" => Some(DeviceClass::Tablet),
            "desktop" => Some(DeviceClass::Desktop),
            "unknown" => Some(DeviceClass::Unknown),
            _ => None,
        }
    }
}

/// A fully composed analytics event, serialized as-is into the POST body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    pub service: String,
    pub event: String,
    pub path: String,
    pub referrer: String,
    pub user_browser: String,
    pub user_device: DeviceClass,
    pub timestamp: DateTime<Utc>,
    /// Non-schema caller properties. `None` (and absent from the JSON)
    /// unless at least one was supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Properties>,
}
