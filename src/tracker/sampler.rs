use std::{ops::ControlFlow, sync::Arc, time::Duration};

use tokio::time::{MissedTickBehavior, interval};

use super::Inner;
use crate::RttSource;

impl<S: RttSource> Inner<S> {
    pub(crate) async fn sample_loop(self: Arc<Self>, period: Duration) {
        let mut interval = interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                () = self.token.cancelled() => break,
                _ = interval.tick() => {}
            }

            if self.sample_once().await.is_break() {
                break;
            }
        }
        tracing::info!("sampling loop stopped");
    }

    /// Queries the current endpoint once and folds the reading into the store.
    pub(crate) async fn sample_once(&self) -> ControlFlow<()> {
        let endpoint = self.endpoint();
        let reading = tokio::select! {
            biased;
            () = self.token.cancelled() => return ControlFlow::Break(()),
            r = self.source.query_rtt(endpoint) => r,
        };
        if self.token.is_cancelled() {
            return ControlFlow::Break(());
        }

        let status = reading.status();
        if self.samples.record_reading(endpoint, reading) {
            tracing::trace!(rtt_ms = reading.rtt_ms, %endpoint, "sample recorded");
        } else if status.is_success() {
            // the watcher moved on while the query was in flight
            tracing::debug!(%endpoint, "endpoint changed during query, sample dropped");
        } else {
            tracing::debug!(?status, code = reading.code, %endpoint, "rtt query failed");
        }
        ControlFlow::Continue(())
    }
}
