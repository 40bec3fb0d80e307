use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::{Endpoint, ProcessId, QueryStatus, SampleStore, TrackerError};

/// State shared between the tracker handle and both loops.
pub(crate) struct Inner<S> {
    pub(crate) source: Arc<S>,
    pub(crate) pid: ProcessId,
    pub(crate) samples: SampleStore,
    pub(crate) fault: Mutex<Option<TrackerError>>,
    pub(crate) token: CancellationToken,
}

impl<S> Inner<S> {
    pub(crate) fn new(
        source: Arc<S>,
        pid: ProcessId,
        samples: SampleStore,
        endpoint: Endpoint,
    ) -> Self {
        samples.rebase(endpoint);
        Self {
            source,
            pid,
            samples,
            fault: Mutex::new(None),
            token: CancellationToken::new(),
        }
    }

    pub(crate) fn endpoint(&self) -> Endpoint { self.samples.endpoint() }

    pub(crate) fn discontinuity(&self) -> bool { self.samples.discontinuity() }

    pub(crate) fn last_code(&self) -> Option<u32> { self.samples.last_code() }

    pub(crate) fn last_status(&self) -> Option<QueryStatus> { self.last_code().map(QueryStatus::from) }

    pub(crate) fn fault(&self) -> Option<TrackerError> {
        self.fault
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    // record a fatal error and stop both loops
    pub(crate) fn fail(&self, error: TrackerError) {
        tracing::error!(error = %error, "endpoint resolution failed, stopping tracker");
        *self.fault.lock().unwrap_or_else(PoisonError::into_inner) = Some(error);
        self.token.cancel();
    }
}
