//! Rendering of records into bytes

use std::fmt::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::{LogRecord, Result, SinkError};

/// Turns a record into the exact bytes a sink appends, including the
/// trailing newline.
pub trait LogFormatter: Send + Sync + 'static {
    /// Render one record.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Format`] if the record cannot be rendered.
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>>;
}

/// Human readable single-line format:
/// `2025-01-01 12:00:00.000+0000 INFO  [source] message`.
///
/// The `[source]` part is left out for records with an empty source.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTextFormatter;

impl LogFormatter for PlainTextFormatter {
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>> {
        let mut line = String::with_capacity(48 + record.message().len());
        let _ = write!(
            line,
            "{} {:<5} ",
            record.timestamp().format("%Y-%m-%d %H:%M:%S%.3f%z"),
            record.level()
        );
        if !record.source().is_empty() {
            let _ = write!(line, "[{}] ", record.source());
        }
        line.push_str(record.message());
        line.push('\n');
        Ok(line.into_bytes())
    }
}

/// One JSON object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormatter;

impl LogFormatter for JsonFormatter {
    fn format(&self, record: &LogRecord) -> Result<Vec<u8>> {
        let mut bytes =
            serde_json::to_vec(record).map_err(|e| SinkError::Format(e.to_string()))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

/// Configuration-level selector for the built-in formatters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// [`PlainTextFormatter`]
    #[default]
    Plain,
    /// [`JsonFormatter`]
    Json,
}

impl LogFormat {
    /// Build the formatter this value selects.
    #[must_use]
    pub fn formatter(self) -> Arc<dyn LogFormatter> {
        match self {
            Self::Plain => Arc::new(PlainTextFormatter),
            Self::Json => Arc::new(JsonFormatter),
        }
    }
}
