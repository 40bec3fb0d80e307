use std::{ops::ControlFlow, sync::Arc, time::Duration};

use tokio::time::{Instant, MissedTickBehavior, interval_at};

use super::Inner;
use crate::RttSource;

impl<S: RttSource> Inner<S> {
    pub(crate) async fn watch_loop(self: Arc<Self>, period: Duration) {
        // the endpoint was resolved during start, skip the immediate tick
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                () = self.token.cancelled() => break,
                _ = interval.tick() => {}
            }

            if self.watch_once().await.is_break() {
                break;
            }
        }
        tracing::info!("endpoint watch loop stopped");
    }

    /// Re-resolves the endpoint and discards the samples if it moved.
    pub(crate) async fn watch_once(&self) -> ControlFlow<()> {
        let resolved = tokio::select! {
            biased;
            () = self.token.cancelled() => return ControlFlow::Break(()),
            r = self.source.resolve_endpoint(self.pid) => r,
        };
        if self.token.is_cancelled() {
            return ControlFlow::Break(());
        }

        match resolved {
            Ok(current) => {
                if let Some(previous) = self.samples.rebase(current) {
                    tracing::info!(%previous, %current, "endpoint changed, samples discarded");
                }
            }
            Err(e) => {
                self.fail(e);
                return ControlFlow::Break(());
            }
        }
        ControlFlow::Continue(())
    }
}
