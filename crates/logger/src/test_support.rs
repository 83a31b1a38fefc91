//! Test support utilities
//!
//! In-memory sinks and loggers for asserting on what was logged. Available to
//! other crates with the `test-support` feature.

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{Level, LogRecord, Logger, Result, Sink, SinkError};

#[derive(Default)]
struct CaptureState {
    records: Vec<LogRecord>,
    close_count: usize,
    fail_writes: bool,
    fail_close: bool,
}

/// A sink that captures every record in memory.
///
/// Clones share the same buffer, so a test can hand one clone to the code
/// under test and inspect another.
#[derive(Clone)]
pub struct CaptureSink {
    name: Arc<str>,
    state: Arc<Mutex<CaptureState>>,
}

impl CaptureSink {
    /// Create a capture sink with the given name
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            name: name.into(),
            state: Arc::default(),
        }
    }

    /// Every record written so far
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.state.lock().records.clone()
    }

    /// Messages of every record written so far
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.state
            .lock()
            .records
            .iter()
            .map(|r| r.message().to_string())
            .collect()
    }

    /// How many times `close` was called
    #[must_use]
    pub fn close_count(&self) -> usize {
        self.state.lock().close_count
    }

    /// Make subsequent writes fail
    pub fn fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Make subsequent closes fail (the call is still counted)
    pub fn fail_close(&self, fail: bool) {
        self.state.lock().fail_close = fail;
    }
}

impl Sink for CaptureSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(SinkError::WriteFailed {
                sink: self.name.to_string(),
                source: io::Error::other("injected write failure"),
            });
        }
        state.records.push(record.clone());
        Ok(())
    }

    fn close(&self) -> Result<()> {
        let mut state = self.state.lock();
        state.close_count += 1;
        if state.fail_close {
            return Err(SinkError::WriteFailed {
                sink: self.name.to_string(),
                source: io::Error::other("injected close failure"),
            });
        }
        Ok(())
    }
}

/// A logger that captures all records in memory for testing
#[derive(Clone)]
pub struct CaptureLogger {
    records: Arc<Mutex<Vec<LogRecord>>>,
    min_level: Level,
}

impl CaptureLogger {
    /// Create a new capture logger
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::default(),
            min_level: Level::Trace,
        }
    }

    /// Create with a specific level
    #[must_use]
    pub fn with_level(mut self, level: Level) -> Self {
        self.min_level = level;
        self
    }

    /// Get all captured records
    #[must_use]
    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Check if any captured message contains a specific string
    #[must_use]
    pub fn contains(&self, text: &str) -> bool {
        self.records.lock().iter().any(|r| r.message().contains(text))
    }
}

impl Default for CaptureLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for CaptureLogger {
    fn log(&self, record: LogRecord) -> Result<()> {
        self.records.lock().push(record);
        Ok(())
    }

    fn is_enabled(&self, level: Level) -> bool {
        level >= self.min_level
    }
}

/// Cloneable in-memory byte stream, standing in for stdout/stderr.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far, lossily decoded as UTF-8
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }
}

impl io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
