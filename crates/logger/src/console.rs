//! Console sink writing to an already-open byte stream

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::{LogFormatter, LogRecord, PlainTextFormatter, Result, Sink, SinkError};

/// Sink that writes formatted records to a byte stream such as stdout.
///
/// The stream belongs to the process, not to the sink: `close` only flushes
/// it, so the runtime can keep using it after logging has moved elsewhere.
pub struct ConsoleSink {
    name: String,
    formatter: Arc<dyn LogFormatter>,
    /// Lock for the stream (to prevent interleaving)
    writer: Mutex<Box<dyn Write + Send>>,
}

impl ConsoleSink {
    /// Create a console sink over any writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            name: "console".to_string(),
            formatter: Arc::new(PlainTextFormatter),
            writer: Mutex::new(Box::new(writer)),
        }
    }

    /// Console sink over the process's stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }

    /// Use a different formatter
    #[must_use]
    pub fn with_formatter(mut self, formatter: Arc<dyn LogFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Use a different name in error reports
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    fn write_failed(&self, source: io::Error) -> SinkError {
        SinkError::WriteFailed {
            sink: self.name.clone(),
            source,
        }
    }
}

impl std::fmt::Debug for ConsoleSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleSink")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

impl Sink for ConsoleSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let line = self.formatter.format(record)?;
        let mut writer = self.writer.lock();
        writer.write_all(&line).map_err(|e| self.write_failed(e))?;
        writer.flush().map_err(|e| self.write_failed(e))
    }

    fn flush(&self) -> Result<()> {
        self.writer.lock().flush().map_err(|e| self.write_failed(e))
    }

    fn close(&self) -> Result<()> {
        self.flush()
    }
}
