//! Core logger trait

use std::sync::Arc;

use crate::{Level, LogRecord, Result};

/// The single logging entry point consumers write through.
pub trait Logger: Send + Sync + 'static {
    /// Log a record.
    ///
    /// # Errors
    ///
    /// Returns an error if the record was not delivered to every destination.
    fn log(&self, record: LogRecord) -> Result<()>;

    /// Check if a level is enabled (for fast filtering)
    fn is_enabled(&self, level: Level) -> bool {
        let _ = level;
        true
    }
}

/// Logger that accepts and discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpLogger;

impl Logger for NoOpLogger {
    fn log(&self, _record: LogRecord) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self, _level: Level) -> bool {
        false
    }
}

/// Handle that stamps every record with a fixed source.
#[derive(Clone)]
pub struct ScopedLogger {
    logger: Arc<dyn Logger>,
    source: Arc<str>,
}

impl ScopedLogger {
    /// Create a handle logging through `logger` as `source`.
    pub fn new(logger: Arc<dyn Logger>, source: impl Into<Arc<str>>) -> Self {
        Self {
            logger,
            source: source.into(),
        }
    }

    /// The source stamped on records.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Log `message` at `level`. Disabled levels succeed without logging.
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying logger.
    pub fn log(&self, level: Level, message: impl Into<String>) -> Result<()> {
        if !self.logger.is_enabled(level) {
            return Ok(());
        }
        self.logger
            .log(LogRecord::new(level, &*self.source, message))
    }

    /// Log an error
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying logger.
    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Error, message)
    }

    /// Log a warning
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying logger.
    pub fn warn(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Warn, message)
    }

    /// Log info
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying logger.
    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Info, message)
    }

    /// Log debug
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying logger.
    pub fn debug(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Debug, message)
    }

    /// Log trace
    ///
    /// # Errors
    ///
    /// Propagates the error of the underlying logger.
    pub fn trace(&self, message: impl Into<String>) -> Result<()> {
        self.log(Level::Trace, message)
    }
}

impl std::fmt::Debug for ScopedLogger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedLogger")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}
