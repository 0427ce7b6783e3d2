//! The tracker implementation hosts inject — composes each event and hands
//! it to the transport on an independent task.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::Notify;
use tracing::debug;

use beacon_core::tracker::{log_errors, ErrorSink, Tracker};
use beacon_core::{BeaconError, BeaconResult, Properties, TrackerConfig, PAGE_VIEW};

use crate::compose::compose;
use crate::environment::{Environment, StaticEnvironment};
use crate::transport::{HttpTransport, Transport};

/// Tracks events against one collector on behalf of one service.
///
/// Built once, then shared as an `Arc<dyn Tracker>` through the host's call
/// graph. Configuration is immutable after construction; every call composes
/// its own payload and spawns its own delivery, so tracking from concurrent
/// tasks needs no coordination and guarantees no ordering.
pub struct AnalyticsClient {
    config: TrackerConfig,
    environment: Arc<dyn Environment>,
    transport: Arc<dyn Transport>,
    errors: Arc<dyn ErrorSink>,
    last_path: Mutex<Option<String>>,
    in_flight: Arc<InFlight>,
}

impl AnalyticsClient {
    pub fn builder(config: TrackerConfig) -> AnalyticsClientBuilder {
        AnalyticsClientBuilder {
            config,
            environment: Arc::new(StaticEnvironment::default()),
            transport: None,
            errors: log_errors(),
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Report the current route path, typically once per render or
    /// navigation. With `auto_track_page_views` enabled this fires exactly
    /// one `page_view` per distinct consecutive path — the first observation
    /// fires, re-observing an unchanged path does not.
    pub fn observe_route(&self, path: &str) {
        if !self.config.auto_track_page_views {
            return;
        }
        {
            let mut last = self.last_path.lock().expect("route mutex poisoned");
            if last.as_deref() == Some(path) {
                return;
            }
            *last = Some(path.to_string());
        }
        self.track_event(PAGE_VIEW);
    }

    /// Wait until every spawned delivery has completed. Events fired while
    /// draining extend the wait. In-flight deliveries cannot be cancelled.
    pub async fn drain(&self) {
        self.in_flight.drained().await;
    }
}

impl Tracker for AnalyticsClient {
    fn track(&self, event_type: &str, properties: Properties) {
        let payload = match compose(
            &self.config.service_name,
            event_type,
            self.environment.as_ref(),
            properties,
        ) {
            Ok(payload) => payload,
            Err(e) => {
                self.errors.report(&e);
                return;
            }
        };

        debug!(
            event = %payload.event,
            path = %payload.path,
            device = payload.user_device.as_str(),
            "composed analytics event"
        );

        let handle = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                self.errors.report(&BeaconError::Transport(
                    "no tokio runtime available for event delivery".into(),
                ));
                return;
            }
        };

        let transport = self.transport.clone();
        let errors = self.errors.clone();
        let in_flight = self.in_flight.clone();
        in_flight.begin();
        handle.spawn(async move {
            if let Err(e) = transport.deliver(&payload).await {
                errors.report(&e);
            }
            in_flight.end();
        });
    }
}

pub struct AnalyticsClientBuilder {
    config: TrackerConfig,
    environment: Arc<dyn Environment>,
    transport: Option<Arc<dyn Transport>>,
    errors: Arc<dyn ErrorSink>,
}

impl AnalyticsClientBuilder {
    pub fn environment(mut self, environment: Arc<dyn Environment>) -> Self {
        self.environment = environment;
        self
    }

    /// Replace the default HTTP transport built from the configuration.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn error_sink(mut self, errors: Arc<dyn ErrorSink>) -> Self {
        self.errors = errors;
        self
    }

    pub fn build(self) -> BeaconResult<AnalyticsClient> {
        self.config.validate()?;
        let transport = match self.transport {
            Some(transport) => transport,
            None => Arc::new(HttpTransport::from_config(&self.config)?),
        };
        Ok(AnalyticsClient {
            config: self.config,
            environment: self.environment,
            transport,
            errors: self.errors,
            last_path: Mutex::new(None),
            in_flight: Arc::new(InFlight::default()),
        })
    }
}

/// Counter of spawned deliveries, awaitable at zero.
#[derive(Default)]
struct InFlight {
    count: AtomicUsize,
    done: Notify,
}

impl InFlight {
    fn begin(&self) {
        self.count.fetch_add(1, Ordering::AcqRel);
    }

    fn end(&self) {
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.done.notify_waiters();
        }
    }

    async fn drained(&self) {
        loop {
            let notified = self.done.notified();
            if self.count.load(Ordering::Acquire) == 0 {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::environment::EnvSnapshot;
    use crate::transport::{capture_transport, CaptureTransport};
    use beacon_core::tracker::capture_errors;
    use beacon_core::DeviceClass;
    use serde_json::json;
    use std::collections::HashMap;

    struct FailingEnvironment;

    impl Environment for FailingEnvironment {
        fn snapshot(&self) -> BeaconResult<EnvSnapshot> {
            Err(BeaconError::Compose("environment unavailable".into()))
        }
    }

    fn test_client(transport: Arc<CaptureTransport>) -> AnalyticsClient {
        AnalyticsClient::builder(TrackerConfig::new("checkout-web"))
            .environment(Arc::new(
                StaticEnvironment::new()
                    .with_path("/cart")
                    .with_user_agent("Mozilla/5.0 (iPad; CPU OS 16_6 like Mac OS X)"),
            ))
            .transport(transport)
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_track_delivers_composed_payload() {
        let transport = capture_transport();
        let client = test_client(transport.clone());

        client.track(
            "button_click",
            HashMap::from([("button_id".to_string(), json!("buy-now"))]),
        );
        client.drain().await;

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].service, "checkout-web");
        assert_eq!(delivered[0].event, "button_click");
        assert_eq!(delivered[0].path, "/cart");
        assert_eq!(delivered[0].user_device, DeviceClass::Tablet);
        assert_eq!(
            delivered[0].metadata.as_ref().unwrap()["button_id"],
            json!("buy-now")
        );
    }

    #[tokio::test]
    async fn test_transport_failure_reaches_sink_only() {
        let transport = capture_transport();
        transport.set_failing(true);
        let errors = capture_errors();

        let client = AnalyticsClient::builder(TrackerConfig::new("checkout-web"))
            .transport(transport.clone())
            .error_sink(errors.clone())
            .build()
            .unwrap();

        client.track_event("button_click");
        client.drain().await;

        assert_eq!(transport.count(), 0);
        assert_eq!(errors.count(), 1);
        assert!(errors.errors()[0].contains("Transport"));
    }

    #[tokio::test]
    async fn test_composition_failure_reaches_sink_only() {
        let transport = capture_transport();
        let errors = capture_errors();

        let client = AnalyticsClient::builder(TrackerConfig::new("checkout-web"))
            .environment(Arc::new(FailingEnvironment))
            .transport(transport.clone())
            .error_sink(errors.clone())
            .build()
            .unwrap();

        client.track_event("button_click");
        client.drain().await;

        assert_eq!(transport.count(), 0);
        assert_eq!(errors.count(), 1);
        assert!(errors.errors()[0].contains("environment unavailable"));
    }

    #[test]
    fn test_track_without_runtime_never_panics() {
        let transport = capture_transport();
        let errors = capture_errors();
        let client = AnalyticsClient::builder(TrackerConfig::new("checkout-web"))
            .transport(transport)
            .error_sink(errors.clone())
            .build()
            .unwrap();

        client.track_event("button_click");

        assert_eq!(errors.count(), 1);
        assert!(errors.errors()[0].contains("no tokio runtime"));
    }

    #[tokio::test]
    async fn test_observe_route_fires_once_per_distinct_path() {
        let transport = capture_transport();
        let client = test_client(transport.clone());

        client.observe_route("/cart");
        client.observe_route("/cart");
        client.observe_route("/checkout");
        client.observe_route("/checkout");
        client.observe_route("/cart");
        client.drain().await;

        assert_eq!(transport.count_event(PAGE_VIEW), 3);
    }

    #[tokio::test]
    async fn test_observe_route_disabled() {
        let transport = capture_transport();
        let mut config = TrackerConfig::new("checkout-web");
        config.auto_track_page_views = false;
        let client = AnalyticsClient::builder(config)
            .transport(transport.clone())
            .build()
            .unwrap();

        client.observe_route("/cart");
        client.observe_route("/checkout");
        client.drain().await;

        assert_eq!(transport.count(), 0);
    }

    #[test]
    fn test_builder_rejects_invalid_config() {
        let result = AnalyticsClient::builder(TrackerConfig::new("")).build();
        assert!(matches!(result, Err(BeaconError::Config(_))));
    }
}
