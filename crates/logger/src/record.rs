//! Log record type

use crate::Level;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single unit of log output.
///
/// Records are built by callers and handed to sinks by reference, so once a
/// record has been logged nothing downstream can change it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogRecord {
    level: Level,
    source: String,
    message: String,
    timestamp: DateTime<Utc>,
}

impl LogRecord {
    /// Create a record stamped with the current time.
    pub fn new(level: Level, source: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level,
            source: source.into(),
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Builder-style method for overriding the timestamp
    #[must_use]
    pub const fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Severity.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// Identifier of the component that produced the record.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Rendered message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// When the record was created.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}
