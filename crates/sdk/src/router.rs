//! Route-change subscription — decouples automatic page-view tracking from
//! the client so hosts with a routing signal can reuse it directly.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use beacon_core::tracker::{ErrorSink, Tracker};
use beacon_core::{BeaconResult, TrackerConfig, PAGE_VIEW};

use crate::client::AnalyticsClient;
use crate::environment::Environment;
use crate::transport::Transport;

/// Watches a route signal and fires one `page_view` per distinct path.
///
/// Spawning subscribes and fires for the initial path; notifications that do
/// not change the path fire nothing. Dropping the observer (or calling
/// [`RouteObserver::stop`]) unsubscribes.
pub struct RouteObserver {
    task: JoinHandle<()>,
}

impl RouteObserver {
    pub fn spawn(tracker: Arc<dyn Tracker>, mut routes: watch::Receiver<String>) -> Self {
        let task = tokio::spawn(async move {
            let mut last = routes.borrow_and_update().clone();
            tracker.track_event(PAGE_VIEW);

            while routes.changed().await.is_ok() {
                let path = routes.borrow_and_update().clone();
                if path != last {
                    last = path;
                    tracker.track_event(PAGE_VIEW);
                }
            }
        });
        Self { task }
    }

    /// Whether the subscription task is still live. Goes false once the
    /// route signal's sender is dropped or the observer is stopped.
    pub fn is_subscribed(&self) -> bool {
        !self.task.is_finished()
    }

    /// Unsubscribe and return to idle.
    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for RouteObserver {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// Build a client wired to a live route signal.
///
/// The returned client has its built-in page-view effect disabled; when
/// `auto_track_page_views` is set, the returned observer is the sole source
/// of `page_view` events, so the two can never double-count a path change.
pub fn routed_client(
    config: TrackerConfig,
    environment: Arc<dyn Environment>,
    transport: Arc<dyn Transport>,
    errors: Arc<dyn ErrorSink>,
    routes: watch::Receiver<String>,
) -> BeaconResult<(Arc<AnalyticsClient>, Option<RouteObserver>)> {
    let auto_track = config.auto_track_page_views;

    // Page views come from the observer, never the client's own effect.
    let mut config = config;
    config.auto_track_page_views = false;

    let client = Arc::new(
        AnalyticsClient::builder(config)
            .environment(environment)
            .transport(transport)
            .error_sink(errors)
            .build()?,
    );

    let observer =
        auto_track.then(|| RouteObserver::spawn(client.clone() as Arc<dyn Tracker>, routes));
    Ok((client, observer))
}
