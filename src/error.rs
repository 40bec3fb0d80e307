use crate::ProcessId;

/// Outcome of a single RTT query, using the OS-level codes reported by
/// per-connection statistics APIs.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryStatus {
    /// The reading carries a valid RTT.
    Success = 0,
    /// The caller may not read connection statistics for the target.
    AccessDenied = 5,
    /// Per-connection statistics are unavailable on this system.
    NotSupported = 50,
    /// The endpoint value was rejected by the OS.
    InvalidParameter = 87,
    /// The connection exists but has no RTT estimate yet.
    NoData = 232,
    /// No established connection to the endpoint.
    NotFound = 1168,
    /// The remote side refused the connection.
    ConnectionRefused = 1225,
    /// The network of the endpoint cannot be reached.
    NetworkUnreachable = 1231,
    /// The endpoint host cannot be reached.
    HostUnreachable = 1232,
    /// Any other code; the raw value is kept by the tracker.
    Other = u32::MAX,
}

impl QueryStatus {
    #[must_use]
    pub fn is_success(self) -> bool { matches!(self, QueryStatus::Success) }
}

impl From<QueryStatus> for u32 {
    fn from(value: QueryStatus) -> Self { value as u32 }
}

impl From<u32> for QueryStatus {
    fn from(code: u32) -> Self {
        match code {
            0 => QueryStatus::Success,
            5 => QueryStatus::AccessDenied,
            50 => QueryStatus::NotSupported,
            87 => QueryStatus::InvalidParameter,
            232 => QueryStatus::NoData,
            1168 => QueryStatus::NotFound,
            1225 => QueryStatus::ConnectionRefused,
            1231 => QueryStatus::NetworkUnreachable,
            1232 => QueryStatus::HostUnreachable,
            _ => QueryStatus::Other,
        }
    }
}

/// Errors that prevent a tracker from starting or force it to stop.
///
/// Transient query failures are not errors; they surface as a
/// [`QueryStatus`] on the tracker instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TrackerError {
    /// The target process does not exist.
    #[error("process {0} not found")]
    ProcessNotFound(ProcessId),
    /// The process exists but no endpoint could be resolved for it.
    #[error("no endpoint for process {pid}: {reason}")]
    EndpointUnresolved {
        /// The process being tracked.
        pid: ProcessId,
        /// What the source reported.
        reason: String,
    },
    /// The sample window was configured with zero capacity.
    #[error("sample window capacity must be at least 1")]
    InvalidCapacity,
    /// A loop interval was configured as zero.
    #[error("{0} interval must be non-zero")]
    InvalidInterval(&'static str),
    /// `start` was called outside of a tokio runtime.
    #[error("no tokio runtime to spawn the tracker loops on")]
    NoRuntime,
}
