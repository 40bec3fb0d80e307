#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

mod config;
mod endpoint;
mod error;
mod source;
mod stats;
mod tracker;

use std::time::Duration;

pub use config::TrackerConfig;
pub use endpoint::{Endpoint, ProcessId};
pub use error::{QueryStatus, TrackerError};
pub use source::{Blocking, BlockingRttSource, RttReading, RttSource};
pub use stats::{SampleStore, WindowSnapshot};
pub use tracker::{LatencyTracker, TrackerSnapshot};

pub const DEFAULT_CAPACITY: usize = 20;
pub const DEFAULT_SAMPLE_INTERVAL: Duration = Duration::from_secs(3);
pub const DEFAULT_WATCH_INTERVAL: Duration = Duration::from_secs(10);
