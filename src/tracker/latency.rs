use std::sync::Arc;

use tokio::runtime::Handle;
use tokio_util::task::TaskTracker;
use tracing::Instrument;

use super::Inner;
use crate::{
    Endpoint, ProcessId, QueryStatus, RttSource, SampleStore, TrackerConfig, TrackerError,
    WindowSnapshot,
};

/// Everything a host needs to draw a ping indicator, copied under the
/// store lock in one go.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSnapshot {
    pub endpoint: Endpoint,
    pub window: WindowSnapshot,
    /// `None` until the first query has completed.
    pub last_status: Option<QueryStatus>,
    pub discontinuity: bool,
}

impl TrackerSnapshot {
    /// The last query succeeded and there is at least one sample to average.
    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.last_status.is_some_and(QueryStatus::is_success) && !self.window.samples.is_empty()
    }
}

/// Samples the RTT of one process's connection in the background.
///
/// Two tasks run for the lifetime of the tracker: one queries the RTT every
/// `sample_interval`, the other re-resolves the endpoint every
/// `watch_interval` and discards the window when it changes. All getters
/// are cheap and may be called from any thread.
pub struct LatencyTracker<S: RttSource + 'static> {
    inner: Arc<Inner<S>>,
    tasks: TaskTracker,
}

/// Stops the loops if the user forgets to call [`LatencyTracker::shutdown`].
impl<S: RttSource + 'static> Drop for LatencyTracker<S> {
    fn drop(&mut self) { self.inner.token.cancel(); }
}

impl<S: RttSource + 'static> LatencyTracker<S> {
    /// Resolves the target endpoint and spawns both loops on the current
    /// tokio runtime.
    ///
    /// Fails without spawning anything if the configuration is invalid or
    /// the endpoint cannot be resolved.
    pub async fn start(source: Arc<S>, config: TrackerConfig) -> Result<Self, TrackerError> {
        config.validate()?;
        let handle = Handle::try_current().map_err(|_| TrackerError::NoRuntime)?;
        let samples = SampleStore::new(config.capacity)?;

        let endpoint = source.resolve_endpoint(config.pid).await?;
        tracing::info!(
            pid = %config.pid,
            %endpoint,
            capacity = config.capacity,
            "tracking endpoint"
        );

        let inner = Arc::new(Inner::new(source, config.pid, samples, endpoint));
        let span = tracing::info_span!("tracker", pid = %config.pid);
        let tasks = TaskTracker::new();
        tasks.spawn_on(
            Arc::clone(&inner)
                .sample_loop(config.sample_interval)
                .instrument(span.clone()),
            &handle,
        );
        tasks.spawn_on(
            Arc::clone(&inner)
                .watch_loop(config.watch_interval)
                .instrument(span),
            &handle,
        );
        tasks.close();

        Ok(Self { inner, tasks })
    }

    #[must_use]
    pub fn pid(&self) -> ProcessId { self.inner.pid }

    /// Mean RTT in milliseconds over the window, `None` while it is empty.
    #[must_use]
    pub fn average(&self) -> Option<f64> { self.inner.samples.average() }

    /// Latest accepted RTT in milliseconds. Survives endpoint changes.
    #[must_use]
    pub fn last_rtt(&self) -> Option<u64> { self.inner.samples.last_rtt() }

    #[must_use]
    pub fn last_status(&self) -> Option<QueryStatus> { self.inner.last_status() }

    /// Raw code behind [`last_status`](Self::last_status), useful when the
    /// status is [`QueryStatus::Other`].
    #[must_use]
    pub fn last_status_code(&self) -> Option<u32> { self.inner.last_code() }

    #[must_use]
    pub fn endpoint(&self) -> Endpoint { self.inner.endpoint() }

    /// True right after the endpoint changed, until the next watch tick.
    #[must_use]
    pub fn discontinuity(&self) -> bool { self.inner.discontinuity() }

    #[must_use]
    pub fn samples(&self) -> WindowSnapshot { self.inner.samples.snapshot() }

    #[must_use]
    pub fn snapshot(&self) -> TrackerSnapshot {
        let view = self.inner.samples.view();
        TrackerSnapshot {
            endpoint: view.endpoint,
            window: view.window,
            last_status: view.last_code.map(QueryStatus::from),
            discontinuity: view.discontinuity,
        }
    }

    /// The fatal error that stopped the tracker, if any.
    #[must_use]
    pub fn fault(&self) -> Option<TrackerError> { self.inner.fault() }

    /// True while either loop is still alive.
    #[must_use]
    pub fn is_running(&self) -> bool { !self.tasks.is_empty() }

    /// Signals both loops to stop without waiting for them.
    pub fn cancel(&self) { self.inner.token.cancel(); }

    /// Stops both loops and waits for them to exit. Safe to call repeatedly
    /// and concurrently; every call returns only once both loops are gone.
    pub async fn shutdown(&self) {
        self.inner.token.cancel();
        self.tasks.wait().await;
    }
}
