pub mod config;
pub mod error;
pub mod event;
pub mod tracker;

pub use config::TrackerConfig;
pub use error::{BeaconError, BeaconResult};
pub use event::{DeviceClass, EventPayload, Properties, PAGE_VIEW};
pub use tracker::{ErrorSink, Tracker};
