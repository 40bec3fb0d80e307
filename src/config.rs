use std::time::Duration;

use crate::{DEFAULT_CAPACITY, DEFAULT_SAMPLE_INTERVAL, DEFAULT_WATCH_INTERVAL, ProcessId, TrackerError};

/// Settings for a [`LatencyTracker`](crate::LatencyTracker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Process whose connection is measured.
    pub pid: ProcessId,
    /// Number of samples averaged.
    pub capacity: usize,
    /// Time between RTT queries.
    pub sample_interval: Duration,
    /// Time between endpoint re-resolutions.
    pub watch_interval: Duration,
}

impl TrackerConfig {
    #[must_use]
    pub fn new(pid: ProcessId) -> Self {
        Self {
            pid,
            capacity: DEFAULT_CAPACITY,
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            watch_interval: DEFAULT_WATCH_INTERVAL,
        }
    }

    #[must_use]
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_sample_interval(mut self, interval: Duration) -> Self {
        self.sample_interval = interval;
        self
    }

    #[must_use]
    pub fn with_watch_interval(mut self, interval: Duration) -> Self {
        self.watch_interval = interval;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), TrackerError> {
        if self.capacity == 0 {
            return Err(TrackerError::InvalidCapacity);
        }
        if self.sample_interval.is_zero() {
            return Err(TrackerError::InvalidInterval("sample"));
        }
        if self.watch_interval.is_zero() {
            return Err(TrackerError::InvalidInterval("watch"));
        }
        Ok(())
    }
}
