//! Bridge from the `log` crate to a [`Logger`]

use std::sync::Arc;

use log::{Log, Metadata, Record};

use crate::{Level, LogRecord, Logger, is_dispatching};

/// Wrapper to implement the log crate's Log trait
pub struct LogBridge {
    logger: Arc<dyn Logger>,
}

impl LogBridge {
    /// Create a new log bridge
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.logger.is_enabled(map_level(metadata.level()))
    }

    fn log(&self, record: &Record) {
        if is_dispatching() || !self.enabled(record.metadata()) {
            return;
        }

        let level = map_level(record.level());
        let _ = self.logger.log(LogRecord::new(
            level,
            record.target(),
            record.args().to_string(),
        ));
    }

    fn flush(&self) {}
}

/// Map log levels to our levels
const fn map_level(level: log::Level) -> Level {
    match level {
        log::Level::Error => Level::Error,
        log::Level::Warn => Level::Warn,
        log::Level::Info => Level::Info,
        log::Level::Debug => Level::Debug,
        log::Level::Trace => Level::Trace,
    }
}

const fn level_filter(level: Level) -> log::LevelFilter {
    match level {
        Level::Error => log::LevelFilter::Error,
        Level::Warn => log::LevelFilter::Warn,
        Level::Info => log::LevelFilter::Info,
        Level::Debug => log::LevelFilter::Debug,
        Level::Trace => log::LevelFilter::Trace,
    }
}

/// Route the `log` crate facade to `logger`, forwarding `min_level` and above.
///
/// # Errors
///
/// Fails if a `log` logger has already been installed.
pub fn init_log_bridge(
    logger: Arc<dyn Logger>,
    min_level: Level,
) -> Result<(), log::SetLoggerError> {
    log::set_boxed_logger(Box::new(LogBridge::new(logger)))?;
    log::set_max_level(level_filter(min_level));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::CaptureLogger;

    #[test]
    fn test_bridge_converts_records() {
        let capture = CaptureLogger::new();
        let bridge = LogBridge::new(Arc::new(capture.clone()));

        bridge.log(
            &Record::builder()
                .level(log::Level::Warn)
                .target("hyper::server")
                .args(format_args!("connection reset by {}", "peer"))
                .build(),
        );

        let records = capture.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level(), Level::Warn);
        assert_eq!(records[0].source(), "hyper::server");
        assert_eq!(records[0].message(), "connection reset by peer");
    }

    #[test]
    fn test_bridge_respects_logger_level() {
        let capture = CaptureLogger::new().with_level(Level::Error);
        let bridge = LogBridge::new(Arc::new(capture.clone()));

        bridge.log(
            &Record::builder()
                .level(log::Level::Info)
                .args(format_args!("ignored"))
                .build(),
        );

        assert!(capture.records().is_empty());
    }
}
