//! Tracking capability surface — trait for firing analytics events from any
//! part of the host application.
//!
//! Hosts pass an `Arc<dyn Tracker>` down their call graph. The no-op
//! implementation keeps the capability safely callable where no configured
//! client exists, and the capture implementation records events for tests.

use std::sync::{Arc, Mutex};

use crate::error::BeaconError;
use crate::event::Properties;

/// Trait for firing analytics events. The call never fails, never blocks,
/// and never panics; delivery problems surface only through the configured
/// [`ErrorSink`].
pub trait Tracker: Send + Sync {
    fn track(&self, event_type: &str, properties: Properties);

    /// Fire an event with no properties.
    fn track_event(&self, event_type: &str) {
        self.track(event_type, Properties::default());
    }
}

/// Null tracker for hosts (or subtrees) without a configured client.
pub struct NoopTracker;

impl Tracker for NoopTracker {
    fn track(&self, _event_type: &str, _properties: Properties) {}
}

/// In-memory tracker that records events for testing.
#[derive(Default)]
pub struct CaptureTracker {
    events: Mutex<Vec<(String, Properties)>>,
}

impl CaptureTracker {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<(String, Properties)> {
        self.events.lock().expect("tracker mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.events.lock().expect("tracker mutex poisoned").len()
    }

    pub fn count_event(&self, event_type: &str) -> usize {
        self.events
            .lock()
            .expect("tracker mutex poisoned")
            .iter()
            .filter(|(name, _)| name == event_type)
            .count()
    }

    pub fn clear(&self) {
        self.events.lock().expect("tracker mutex poisoned").clear();
    }
}

impl Tracker for CaptureTracker {
    fn track(&self, event_type: &str, properties: Properties) {
        self.events
            .lock()
            .expect("tracker mutex poisoned")
            .push((event_type.to_string(), properties));
    }
}

/// Sink for failures the tracking call itself can never raise.
pub trait ErrorSink: Send + Sync {
    fn report(&self, error: &BeaconError);
}

/// Default sink: failures are logged and dropped.
pub struct LogErrorSink;

impl ErrorSink for LogErrorSink {
    fn report(&self, error: &BeaconError) {
        tracing::error!(error = %error, "failed to send analytics event");
    }
}

/// Sink wrapping a caller-supplied error callback.
pub struct CallbackErrorSink {
    callback: Box<dyn Fn(&BeaconError) + Send + Sync>,
}

impl CallbackErrorSink {
    pub fn new(callback: impl Fn(&BeaconError) + Send + Sync + 'static) -> Self {
        Self {
            callback: Box::new(callback),
        }
    }
}

impl ErrorSink for CallbackErrorSink {
    fn report(&self, error: &BeaconError) {
        (self.callback)(error);
    }
}

/// In-memory sink that captures reported failures for testing.
#[derive(Default)]
pub struct CaptureErrorSink {
    errors: Mutex<Vec<String>>,
}

impl CaptureErrorSink {
    pub fn new() -> Self {
        Self {
            errors: Mutex::new(Vec::new()),
        }
    }

    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().expect("error sink mutex poisoned").clone()
    }

    pub fn count(&self) -> usize {
        self.errors.lock().expect("error sink mutex poisoned").len()
    }
}

impl ErrorSink for CaptureErrorSink {
    fn report(&self, error: &BeaconError) {
        self.errors
            .lock()
            .expect("error sink mutex poisoned")
            .push(error.to_string());
    }
}

/// Convenience: null tracker for unconfigured scopes.
pub fn noop_tracker() -> Arc<dyn Tracker> {
    Arc::new(NoopTracker)
}

/// Convenience: capture tracker for tests.
pub fn capture_tracker() -> Arc<CaptureTracker> {
    Arc::new(CaptureTracker::new())
}

/// Convenience: the default log-and-drop error sink.
pub fn log_errors() -> Arc<dyn ErrorSink> {
    Arc::new(LogErrorSink)
}

/// Convenience: capture error sink for tests.
pub fn capture_errors() -> Arc<CaptureErrorSink> {
    Arc::new(CaptureErrorSink::new())
}
