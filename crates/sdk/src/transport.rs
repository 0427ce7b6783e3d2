//! Collector delivery — HTTP POST of serialized payloads, plus an in-memory
//! transport for tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use beacon_core::{BeaconError, BeaconResult, EventPayload, TrackerConfig};

/// Delivers one composed payload to the collector. Called on a spawned task;
/// an error here reaches the error sink, never the tracking caller.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn deliver(&self, payload: &EventPayload) -> BeaconResult<()>;
}

/// POSTs payloads as JSON to the collector endpoint.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: Url,
}

impl HttpTransport {
    pub fn new(endpoint: &str, request_timeout: Duration) -> BeaconResult<Self> {
        let endpoint = Url::parse(endpoint)
            .map_err(|e| BeaconError::Config(format!("invalid endpoint {endpoint:?}: {e}")))?;
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| BeaconError::Transport(e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    pub fn from_config(config: &TrackerConfig) -> BeaconResult<Self> {
        Self::new(
            &config.endpoint,
            Duration::from_millis(config.request_timeout_ms),
        )
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn deliver(&self, payload: &EventPayload) -> BeaconResult<()> {
        self.client
            .post(self.endpoint.clone())
            .json(payload)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| BeaconError::Transport(e.to_string()))?;
        Ok(())
    }
}

/// In-memory transport that records delivered payloads for testing. Flip
/// [`CaptureTransport::set_failing`] to make every delivery fail.
#[derive(Default)]
pub struct CaptureTransport {
    delivered: Mutex<Vec<EventPayload>>,
    failing: AtomicBool,
}

impl CaptureTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Release);
    }

    pub fn delivered(&self) -> Vec<EventPayload> {
        self.delivered.lock().expect("transport mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.delivered.lock().expect("transport mutex poisoned").len()
    }

    pub fn count_event(&self, event_type: &str) -> usize {
        self.delivered
            .lock()
            .expect("transport mutex poisoned")
            .iter()
            .filter(|p| p.event == event_type)
            .count()
    }
}

#[async_trait]
impl Transport for CaptureTransport {
    async fn deliver(&self, payload: &EventPayload) -> BeaconResult<()> {
        if self.failing.load(Ordering::Acquire) {
            return Err(BeaconError::Transport("capture transport set to fail".into()));
        }
        self.delivered
            .lock()
            .expect("transport mutex poisoned")
            .push(payload.clone());
        Ok(())
    }
}

/// Convenience: capture transport for tests.
pub fn capture_transport() -> Arc<CaptureTransport> {
    Arc::new(CaptureTransport::new())
}
