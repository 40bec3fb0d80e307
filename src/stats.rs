use std::{
    collections::VecDeque,
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard, PoisonError},
};

use crate::{Endpoint, RttReading, TrackerError};

/// A consistent copy of the sample window taken under the store lock.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    /// Samples in milliseconds, oldest first.
    pub samples: Vec<u64>,
    /// Mean of `samples`, `None` when the window is empty.
    pub average: Option<f64>,
    /// Most recently recorded sample, kept across resets.
    pub last_rtt: Option<u64>,
    /// Maximum number of samples the window holds.
    pub capacity: usize,
}

// everything a tracker reader sees, copied under one lock
pub(crate) struct StoreView {
    pub(crate) window: WindowSnapshot,
    pub(crate) endpoint: Endpoint,
    pub(crate) discontinuity: bool,
    pub(crate) last_code: Option<u32>,
}

struct SampleWindow {
    history: VecDeque<u64>,
    capacity: NonZeroUsize,
    average: Option<f64>,
    last: Option<u64>,
    endpoint: Endpoint,
    discontinuity: bool,
    last_code: Option<u32>,
}

impl SampleWindow {
    fn add(&mut self, rtt: u64) {
        self.history.push_back(rtt);
        while self.history.len() > self.capacity.get() {
            self.history.pop_front();
        }
        self.average = mean(&self.history);
        self.last = Some(rtt);
    }

    fn clear(&mut self) {
        self.history.clear();
        self.average = None;
    }

    fn window(&self) -> WindowSnapshot {
        WindowSnapshot {
            samples: self.history.iter().copied().collect(),
            average: self.average,
            last_rtt: self.last,
            capacity: self.capacity.get(),
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean(history: &VecDeque<u64>) -> Option<f64> {
    if history.is_empty() {
        return None;
    }
    let sum: u128 = history.iter().map(|&x| u128::from(x)).sum();
    Some(sum as f64 / history.len() as f64)
}

/// Bounded FIFO of RTT samples with an eagerly maintained average.
///
/// The store also owns the endpoint the samples belong to, the
/// discontinuity flag and the status of the last query. Every mutation and
/// every read goes through one mutex, so a reader never sees an average
/// that disagrees with its window, or a window that belongs to another
/// endpoint than the one reported next to it.
pub struct SampleStore {
    window: Mutex<SampleWindow>,
}

impl SampleStore {
    /// Creates an empty store holding at most `capacity` samples, tracking
    /// [`Endpoint::UNSPECIFIED`].
    pub fn new(capacity: usize) -> Result<Self, TrackerError> {
        let capacity = NonZeroUsize::new(capacity).ok_or(TrackerError::InvalidCapacity)?;
        Ok(Self {
            window: Mutex::new(SampleWindow {
                history: VecDeque::with_capacity(capacity.get()),
                capacity,
                average: None,
                last: None,
                endpoint: Endpoint::UNSPECIFIED,
                discontinuity: false,
                last_code: None,
            }),
        })
    }

    // no mutation can panic midway, so a poisoned window is still consistent
    fn lock(&self) -> MutexGuard<'_, SampleWindow> {
        self.window.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `rtt`, evicting the oldest samples past capacity.
    pub fn record(&self, rtt: u64) { self.lock().add(rtt); }

    /// Empties the window. The last recorded RTT is kept.
    pub fn reset(&self) { self.lock().clear(); }

    /// Points the store at `endpoint`.
    ///
    /// A different endpoint empties the window and raises the discontinuity
    /// flag; the same endpoint lowers it. Moving away from
    /// [`Endpoint::UNSPECIFIED`] adopts the endpoint without a discontinuity.
    /// Returns the previous endpoint when it changed.
    pub fn rebase(&self, endpoint: Endpoint) -> Option<Endpoint> {
        let mut w = self.lock();
        let previous = w.endpoint;
        if previous == endpoint {
            w.discontinuity = false;
            return None;
        }
        w.endpoint = endpoint;
        if previous == Endpoint::UNSPECIFIED {
            return None;
        }
        w.clear();
        w.discontinuity = true;
        Some(previous)
    }

    /// Stores the status of `reading` and, when it succeeded and `endpoint`
    /// is still the tracked one, its RTT. Returns whether a sample was added.
    pub fn record_reading(&self, endpoint: Endpoint, reading: RttReading) -> bool {
        let mut w = self.lock();
        w.last_code = Some(reading.code);
        if reading.status().is_success() && w.endpoint == endpoint {
            w.add(reading.rtt_ms);
            true
        } else {
            false
        }
    }

    /// Mean of the window in milliseconds, `None` when empty.
    #[must_use]
    pub fn average(&self) -> Option<f64> { self.lock().average }

    #[must_use]
    pub fn last_rtt(&self) -> Option<u64> { self.lock().last }

    #[must_use]
    pub fn endpoint(&self) -> Endpoint { self.lock().endpoint }

    #[must_use]
    pub fn discontinuity(&self) -> bool { self.lock().discontinuity }

    /// Raw status code of the last reading, `None` before the first one.
    #[must_use]
    pub fn last_code(&self) -> Option<u32> { self.lock().last_code }

    #[must_use]
    pub fn len(&self) -> usize { self.lock().history.len() }

    #[must_use]
    pub fn is_empty(&self) -> bool { self.lock().history.is_empty() }

    #[must_use]
    pub fn capacity(&self) -> usize { self.lock().capacity.get() }

    #[must_use]
    pub fn snapshot(&self) -> WindowSnapshot { self.lock().window() }

    pub(crate) fn view(&self) -> StoreView {
        let w = self.lock();
        StoreView {
            window: w.window(),
            endpoint: w.endpoint,
            discontinuity: w.discontinuity,
            last_code: w.last_code,
        }
    }
}
