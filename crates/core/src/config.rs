use serde::Deserialize;

use crate::error::{BeaconError, BeaconResult};

/// Tracker configuration. Loaded from an optional `beacon.toml` file and
/// environment variables with the prefix `BEACON__`, or built in code via
/// [`TrackerConfig::new`]. Immutable for the lifetime of one client.
#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Collector endpoint receiving event payloads.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Service name stamped on every event. Required, must be non-empty.
    pub service_name: String,
    /// Emit one `page_view` event per distinct route path.
    #[serde(default = "default_auto_track_page_views")]
    pub auto_track_page_views: bool,
    /// Per-request delivery timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_endpoint() -> String {
    "https://analytics.rashik.sh/api".to_string()
}
fn default_auto_track_page_views() -> bool {
    true
}
fn default_request_timeout_ms() -> u64 {
    5000
}

impl TrackerConfig {
    /// Configuration with defaults for everything except the service name.
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            endpoint: default_endpoint(),
            service_name: service_name.into(),
            auto_track_page_views: default_auto_track_page_views(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }

    /// Load from `beacon.toml` (optional) layered under `BEACON__*`
    /// environment variables.
    pub fn load() -> BeaconResult<Self> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("beacon").required(false))
            .add_source(
                config::Environment::with_prefix("BEACON")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| BeaconError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that would emit unusable events.
    pub fn validate(&self) -> BeaconResult<()> {
        if self.service_name.trim().is_empty() {
            return Err(BeaconError::Config("service_name must be non-empty".into()));
        }
        url::Url::parse(&self.endpoint)
            .map_err(|e| BeaconError::Config(format!("invalid endpoint {:?}: {e}", self.endpoint)))?;
        Ok(())
    }
}
