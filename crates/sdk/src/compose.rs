//! Payload assembly — merges derived ambient context with caller-supplied
//! properties and partitions the latter into schema overrides vs metadata.

use chrono::Utc;

use beacon_core::event::SCHEMA_FIELDS;
use beacon_core::{BeaconResult, DeviceClass, EventPayload, Properties};

use crate::device::classify;
use crate::environment::Environment;

/// Build the payload for one tracking call.
///
/// Ambient fields are derived from a fresh environment snapshot and act as
/// defaults; caller properties whose key is one of [`SCHEMA_FIELDS`] override
/// them. An override applies only when its value coerces to the field's type
/// (a JSON string for the five string fields, a recognized device-class name
/// for `user_device`); everything else — including schema keys with
/// non-coercible values and any `timestamp` key — is carried as metadata.
/// The timestamp itself is stamped here, at send time.
pub fn compose(
    service: &str,
    event_type: &str,
    environment: &dyn Environment,
    properties: Properties,
) -> BeaconResult<EventPayload> {
    let snapshot = environment.snapshot()?;

    let mut payload = EventPayload {
        service: service.to_string(),
        event: event_type.to_string(),
        path: snapshot.path.unwrap_or_default(),
        referrer: snapshot.referrer.unwrap_or_default(),
        user_browser: snapshot.user_agent.clone().unwrap_or_default(),
        user_device: snapshot
            .user_agent
            .as_deref()
            .map(classify)
            .unwrap_or(DeviceClass::Unknown),
        timestamp: Utc::now(),
        metadata: None,
    };

    let mut metadata = Properties::new();
    for (key, value) in properties {
        if SCHEMA_FIELDS.contains(&key.as_str()) && apply_override(&mut payload, &key, &value) {
            continue;
        }
        metadata.insert(key, value);
    }
    if !metadata.is_empty() {
        payload.metadata = Some(metadata);
    }

    Ok(payload)
}

/// Apply one schema-field override. Returns false when the value does not
/// coerce, in which case the pair belongs in metadata.
fn apply_override(payload: &mut EventPayload, key: &str, value: &serde_json::Value) -> bool {
    if key == "user_device" {
        if let Some(device) = value.as_str().and_then(DeviceClass::parse) {
            payload.user_device = device;
            return true;
        }
        return false;
    }

    let Some(text) = value.as_str() else {
        return false;
    };
    match key {
        "service" => payload.service = text.to_string(),
        "event" => payload.event = text.to_string(),
        "path" => payload.path = text.to_string(),
        "referrer" => payload.referrer = text.to_string(),
        "user_browser" => payload.user_browser = text.to_string(),
        _ => return false,
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::StaticEnvironment;
    use serde_json::json;
    use std::collections::HashMap;

    const IPHONE: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 16_6 like Mac OS X) Mobile/15E148";

    fn browser_env() -> StaticEnvironment {
        StaticEnvironment::new()
            .with_path("/cart")
            .with_referrer("https://example.com")
            .with_user_agent(IPHONE)
    }

    #[test]
    fn test_derives_ambient_fields() {
        let payload = compose("checkout-web", "page_view", &browser_env(), HashMap::new()).unwrap();

        assert_eq!(payload.service, "checkout-web");
        assert_eq!(payload.event, "page_view");
        assert_eq!(payload.path, "/cart");
        assert_eq!(payload.referrer, "https://example.com");
        assert_eq!(payload.user_browser, IPHONE);
        assert_eq!(payload.user_device, DeviceClass::Mobile);
        assert!(payload.metadata.is_none());
    }

    #[test]
    fn test_detached_environment_falls_back() {
        let env = StaticEnvironment::default();
        let payload = compose("checkout-web", "page_view", &env, HashMap::new()).unwrap();

        assert_eq!(payload.path, "");
        assert_eq!(payload.referrer, "");
        assert_eq!(payload.user_browser, "");
        assert_eq!(payload.user_device, DeviceClass::Unknown);
    }

    #[test]
    fn test_override_wins_and_rest_is_metadata() {
        let properties = HashMap::from([
            ("user_role".to_string(), json!("admin")),
            ("service".to_string(), json!("override-svc")),
        ]);
        let payload = compose("checkout-web", "login", &browser_env(), properties).unwrap();

        assert_eq!(payload.service, "override-svc");
        let metadata = payload.metadata.unwrap();
        assert_eq!(metadata.len(), 1);
        assert_eq!(metadata["user_role"], json!("admin"));
    }

    #[test]
    fn test_all_schema_keys_means_no_metadata() {
        let properties = HashMap::from([
            ("path".to_string(), json!("/override")),
            ("user_device".to_string(), json!("tablet")),
        ]);
        let payload = compose("checkout-web", "login", &browser_env(), properties).unwrap();

        assert_eq!(payload.path, "/override");
        assert_eq!(payload.user_device, DeviceClass::Tablet);
        assert!(payload.metadata.is_none());

        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("metadata"));
    }

    #[test]
    fn test_non_coercible_override_is_metadata() {
        let properties = HashMap::from([
            ("service".to_string(), json!(42)),
            ("user_device".to_string(), json!("smart-tv")),
        ]);
        let payload = compose("checkout-web", "login", &browser_env(), properties).unwrap();

        assert_eq!(payload.service, "checkout-web");
        assert_eq!(payload.user_device, DeviceClass::Mobile);
        let metadata = payload.metadata.unwrap();
        assert_eq!(metadata["service"], json!(42));
        assert_eq!(metadata["user_device"], json!("smart-tv"));
    }

    #[test]
    fn test_timestamp_key_is_metadata() {
        let properties = HashMap::from([("timestamp".to_string(), json!("2001-01-01T00:00:00Z"))]);
        let before = Utc::now();
        let payload = compose("checkout-web", "login", &browser_env(), properties).unwrap();

        assert!(payload.timestamp >= before);
        assert_eq!(payload.metadata.unwrap()["timestamp"], json!("2001-01-01T00:00:00Z"));
    }

    #[test]
    fn test_device_override_is_case_insensitive() {
        let properties = HashMap::from([("user_device".to_string(), json!("Desktop"))]);
        let payload = compose("checkout-web", "login", &browser_env(), properties).unwrap();
        assert_eq!(payload.user_device, DeviceClass::Desktop);
    }
}
