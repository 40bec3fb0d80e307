use std::sync::Arc;

use async_trait::async_trait;

use crate::{Endpoint, ProcessId, QueryStatus, TrackerError};

/// One answer from the OS RTT query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RttReading {
    /// Round-trip time in milliseconds. Meaningless unless the status is success.
    pub rtt_ms: u64,
    /// Raw OS status code, see [`QueryStatus`].
    pub code: u32,
}

impl RttReading {
    #[must_use]
    pub fn ok(rtt_ms: u64) -> Self {
        Self {
            rtt_ms,
            code: QueryStatus::Success.into(),
        }
    }

    #[must_use]
    pub fn failed(status: impl Into<u32>) -> Self {
        Self {
            rtt_ms: 0,
            code: status.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> QueryStatus { QueryStatus::from(self.code) }
}

/// The OS facilities a tracker needs: finding the remote endpoint of a
/// process and reading the RTT of the connection to it.
///
/// Resolution failures are fatal for the tracker. Query failures are
/// reported through [`RttReading::code`] and retried on the next tick.
#[async_trait]
pub trait RttSource: Send + Sync {
    async fn resolve_endpoint(&self, pid: ProcessId) -> Result<Endpoint, TrackerError>;

    async fn query_rtt(&self, endpoint: Endpoint) -> RttReading;
}

/// Synchronous form of [`RttSource`] for sources backed by blocking OS calls.
/// Wrap it in [`Blocking`] to hand it to a tracker.
pub trait BlockingRttSource: Send + Sync + 'static {
    fn resolve_endpoint(&self, pid: ProcessId) -> Result<Endpoint, TrackerError>;

    fn query_rtt(&self, endpoint: Endpoint) -> RttReading;
}

/// Runs a [`BlockingRttSource`] on tokio's blocking pool.
pub struct Blocking<T>(Arc<T>);

impl<T: BlockingRttSource> Blocking<T> {
    pub fn new(source: T) -> Self { Self(Arc::new(source)) }
}

#[async_trait]
impl<T: BlockingRttSource> RttSource for Blocking<T> {
    async fn resolve_endpoint(&self, pid: ProcessId) -> Result<Endpoint, TrackerError> {
        let source = Arc::clone(&self.0);
        tokio::task::spawn_blocking(move || BlockingRttSource::resolve_endpoint(&*source, pid))
            .await
            .unwrap_or_else(|e| {
                Err(TrackerError::EndpointUnresolved {
                    pid,
                    reason: e.to_string(),
                })
            })
    }

    async fn query_rtt(&self, endpoint: Endpoint) -> RttReading {
        let source = Arc::clone(&self.0);
        match tokio::task::spawn_blocking(move || BlockingRttSource::query_rtt(&*source, endpoint))
            .await
        {
            Ok(reading) => reading,
            Err(e) => {
                tracing::warn!(error = %e, %endpoint, "blocking rtt query did not complete");
                RttReading::failed(QueryStatus::Other)
            }
        }
    }
}
