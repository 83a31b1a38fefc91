//! Error types for log sinks

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::SinkId;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors reported by sinks and by the log service.
///
/// None of these terminate the process; they are handed back to whoever
/// called `write`, `log` or `close` to decide what a lost record means.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The configured destination cannot be used (for example it is a
    /// directory). Raised at construction time.
    #[error("invalid log destination {}: {reason}", path.display())]
    Configuration {
        /// The rejected path
        path: PathBuf,
        /// Why it was rejected
        reason: String,
    },

    /// Renaming or reopening during rotation failed. The pre-rotation file is
    /// still in place.
    #[error("failed to rotate {}: {source}", path.display())]
    RotationFailed {
        /// The active log file
        path: PathBuf,
        /// The underlying error
        source: io::Error,
    },

    /// The record could not be written and is lost.
    #[error("failed to write to {sink}: {source}")]
    WriteFailed {
        /// Name of the sink
        sink: String,
        /// The underlying error
        source: io::Error,
    },

    /// One or more members of a multiplexing sink failed; the others still
    /// received the record.
    #[error("{count} multiplexed sink(s) failed to write", count = .failures.len())]
    PartialWriteFailure {
        /// The members that failed, in registration order
        failures: Vec<MemberFailure>,
    },

    /// One or more sinks failed to close; every other sink was still closed.
    #[error("{count} sink(s) failed to close", count = .failures.len())]
    PartialCloseFailure {
        /// The members that failed, in registration order
        failures: Vec<MemberFailure>,
    },

    /// A record was logged after the service stopped.
    #[error("log service is closed")]
    ServiceClosed,

    /// A record was written to a sink that has been closed.
    #[error("sink {0} is closed")]
    Closed(String),

    /// The record could not be rendered.
    #[error("failed to format log record: {0}")]
    Format(String),
}

impl SinkError {
    /// Failures of individual members, if this is an aggregated error.
    #[must_use]
    pub fn member_failures(&self) -> &[MemberFailure] {
        match self {
            Self::PartialWriteFailure { failures } | Self::PartialCloseFailure { failures } => {
                failures
            }
            _ => &[],
        }
    }
}

/// A failure of one member of a multiplexed operation.
#[derive(Debug, Error)]
#[error("{name} ({id}): {error}")]
pub struct MemberFailure {
    /// Identifier the member was registered under
    pub id: SinkId,
    /// Name of the member sink
    pub name: String,
    /// What went wrong
    #[source]
    pub error: SinkError,
}
