//! Client-side event tracking SDK — composes analytics events with ambient
//! context (route path, referrer, browser, device class) and delivers them to
//! an HTTP collector as independent fire-and-forget requests.
//!
//! # Modules
//!
//! - [`device`] — User-agent device classification
//! - [`environment`] — Ambient context accessors (path, referrer, user agent)
//! - [`compose`] — Payload assembly and property partitioning
//! - [`transport`] — Collector delivery (HTTP POST, capture for tests)
//! - [`client`] — The [`AnalyticsClient`] tracker implementation
//! - [`router`] — Route-change subscription for automatic page views

pub mod client;
pub mod compose;
pub mod device;
pub mod environment;
pub mod router;
pub mod transport;

pub use client::{AnalyticsClient, AnalyticsClientBuilder};
pub use compose::compose;
pub use device::classify;
pub use environment::{EnvSnapshot, Environment, RouteEnvironment, StaticEnvironment};
pub use router::{routed_client, RouteObserver};
pub use transport::{capture_transport, CaptureTransport, HttpTransport, Transport};
