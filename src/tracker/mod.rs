mod inner;
mod latency;
mod sampler;
mod watcher;

#[cfg(test)]
mod tests;

pub(crate) use inner::Inner;
pub use latency::{LatencyTracker, TrackerSnapshot};
