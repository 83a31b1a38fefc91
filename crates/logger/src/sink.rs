//! Core sink trait

use std::fmt;

use crate::{LogRecord, Result};

/// Identifier handed out by a [`MultiplexSink`](crate::MultiplexSink) when a
/// member is registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SinkId(u64);

impl SinkId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink#{}", self.0)
    }
}

/// A destination for log records.
///
/// Implementations serialise access to their own state, so a sink can be
/// shared between threads behind an `Arc` and written to concurrently.
pub trait Sink: Send + Sync + 'static {
    /// Human readable name, used in error reports.
    fn name(&self) -> &str;

    /// Write a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record could not be delivered.
    fn write(&self, record: &LogRecord) -> Result<()>;

    /// Flush any buffered output.
    ///
    /// # Errors
    ///
    /// Returns an error if buffered output could not be flushed.
    fn flush(&self) -> Result<()> {
        Ok(())
    }

    /// Release the destination. Closing twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the destination could not be released cleanly.
    fn close(&self) -> Result<()>;
}

/// Sink that discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpSink;

impl Sink for NoOpSink {
    fn name(&self) -> &str {
        "noop"
    }

    fn write(&self, _record: &LogRecord) -> Result<()> {
        Ok(())
    }

    fn close(&self) -> Result<()> {
        Ok(())
    }
}
