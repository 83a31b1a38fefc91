//! The process-wide log service and its lifecycle

use std::io::Write;
use std::sync::Arc;

use parking_lot::RwLock;
use proven_logger::{
    ConsoleSink, DispatchGuard, Level, LogRecord, Logger, MultiplexSink, Result, ScopedLogger,
    Sink, SinkError, SinkId,
};
use proven_logger_file::{FileSystem, RotatingFileSink};
use tracing::{debug, warn};

use crate::{LifecyclePhase, LogConfig};

struct State {
    phase: LifecyclePhase,
    console: Option<SinkId>,
}

/// Routes records to the console and the log file across the process's life.
///
/// While starting, every record goes to both the console and the file so
/// that startup problems are visible to whoever launched the process. Once
/// startup completes the console is detached and only the file is written.
/// Shutdown closes every sink, after which [`log`](Self::log) fails with
/// [`SinkError::ServiceClosed`].
///
/// Writers hold the read side of one lock for the duration of a write and
/// lifecycle transitions take the write side, so a transition never races a
/// write in flight.
pub struct LogService {
    state: RwLock<State>,
    sinks: MultiplexSink,
    has_file: bool,
    level: Level,
}

impl LogService {
    /// Open the service described by `config`.
    ///
    /// `console` is the process's standard output (or a stand-in); it is
    /// flushed but never closed. The log file, if any, is opened through `fs`.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid or the log file cannot be
    /// opened; nothing is left open in that case.
    pub fn open(
        config: &LogConfig,
        console: impl Write + Send + 'static,
        fs: Arc<dyn FileSystem>,
    ) -> crate::Result<Self> {
        config.validate()?;
        let formatter = config.format.formatter();
        let console = ConsoleSink::new(console).with_formatter(Arc::clone(&formatter));

        let file: Option<Arc<dyn Sink>> = match config.log_file() {
            Some(path) => {
                let sink = RotatingFileSink::builder(path)
                    .policy(config.rotation_policy()?)
                    .file_system(fs)
                    .formatter(formatter)
                    .open()?;
                Some(Arc::new(sink))
            }
            None => None,
        };

        Ok(Self::new(Arc::new(console), file, config.level))
    }

    /// Assemble a service from already-open sinks.
    ///
    /// Without a `file` the console is the only destination and stays
    /// attached for the service's whole life.
    pub fn new(console: Arc<dyn Sink>, file: Option<Arc<dyn Sink>>, level: Level) -> Self {
        let sinks = MultiplexSink::new();
        let console = sinks.add(console);
        let has_file = file.is_some();
        if let Some(file) = file {
            sinks.add(file);
        }

        Self {
            state: RwLock::new(State {
                phase: LifecyclePhase::Starting,
                console: Some(console),
            }),
            sinks,
            has_file,
            level,
        }
    }

    /// Current lifecycle phase
    #[must_use]
    pub fn phase(&self) -> LifecyclePhase {
        self.state.read().phase
    }

    /// Whether a log file is being written
    #[must_use]
    pub const fn has_file_sink(&self) -> bool {
        self.has_file
    }

    /// Lowest level that is written
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }

    /// A handle that logs through this service as `source`.
    pub fn scoped(self: &Arc<Self>, source: impl Into<Arc<str>>) -> ScopedLogger {
        ScopedLogger::new(Arc::clone(self) as Arc<dyn Logger>, source)
    }

    /// Write a record to every attached sink.
    ///
    /// Records below the configured level are accepted and dropped.
    ///
    /// # Errors
    ///
    /// [`SinkError::ServiceClosed`] once the service has stopped, otherwise
    /// [`SinkError::PartialWriteFailure`] if any sink failed (the others still
    /// received the record).
    pub fn log(&self, record: &LogRecord) -> Result<()> {
        let state = self.state.read();
        if !state.phase.accepts_records() {
            return Err(SinkError::ServiceClosed);
        }
        if record.level() < self.level {
            return Ok(());
        }
        self.sinks.write(record)
    }

    /// Mark startup as complete.
    ///
    /// If a log file is open the console is detached (not closed) so that it
    /// no longer duplicates the file. Only the first call has any effect.
    pub fn on_startup_complete(&self) {
        let _dispatch = DispatchGuard::enter();
        let mut state = self.state.write();
        if state.phase != LifecyclePhase::Starting {
            return;
        }
        state.phase = LifecyclePhase::Running;

        if self.has_file {
            if let Some(console) = state.console.take() {
                if let Some(sink) = self.sinks.remove(console) {
                    // Leave nothing buffered behind on the detached console.
                    if let Err(e) = sink.flush() {
                        warn!(error = %e, "failed to flush console");
                    }
                }
            }
        }
        debug!(phase = %state.phase, "log service running");
    }

    /// Close every sink and stop accepting records.
    ///
    /// Sinks are closed in registration order; a failing close does not stop
    /// the others. Only the first call has any effect, later calls succeed
    /// without doing anything.
    ///
    /// # Errors
    ///
    /// [`SinkError::PartialCloseFailure`] listing the sinks that failed to
    /// close. The service is stopped regardless.
    pub fn on_shutdown(&self) -> Result<()> {
        let _dispatch = DispatchGuard::enter();
        let mut state = self.state.write();
        if state.phase >= LifecyclePhase::ShuttingDown {
            return Ok(());
        }
        state.phase = LifecyclePhase::ShuttingDown;

        let result = self.sinks.close();
        if let Err(e) = &result {
            warn!(error = %e, "failed to close log sinks");
        }

        state.phase = LifecyclePhase::Stopped;
        state.console = None;
        result
    }
}

impl Logger for LogService {
    fn log(&self, record: LogRecord) -> Result<()> {
        Self::log(self, &record)
    }

    fn is_enabled(&self, level: Level) -> bool {
        level >= self.level
    }
}

impl std::fmt::Debug for LogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogService")
            .field("phase", &self.phase())
            .field("has_file", &self.has_file)
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use assert_matches::assert_matches;
    use proven_logger::test_support::{CaptureSink, SharedBuffer};
    use proven_logger_file::MemoryFileSystem;

    use super::*;

    fn record(message: &str) -> LogRecord {
        LogRecord::new(Level::Info, "test", message)
    }

    fn service_with_file() -> (LogService, CaptureSink, CaptureSink) {
        let console = CaptureSink::new("console");
        let file = CaptureSink::new("file");
        let service = LogService::new(
            Arc::new(console.clone()),
            Some(Arc::new(file.clone())),
            Level::Info,
        );
        (service, console, file)
    }

    #[test]
    fn test_starting_duplicates_to_console_and_file() {
        let (service, console, file) = service_with_file();

        service.log(&record("booting")).unwrap();

        assert_eq!(service.phase(), LifecyclePhase::Starting);
        assert_eq!(console.messages(), vec!["booting"]);
        assert_eq!(file.messages(), vec!["booting"]);
    }

    #[test]
    fn test_startup_complete_detaches_console_once() {
        let (service, console, file) = service_with_file();

        service.on_startup_complete();
        service.on_startup_complete();
        service.log(&record("running")).unwrap();

        assert_eq!(service.phase(), LifecyclePhase::Running);
        assert!(console.messages().is_empty());
        assert_eq!(console.close_count(), 0);
        assert_eq!(file.messages(), vec!["running"]);
    }

    #[test]
    fn test_console_only_keeps_console() {
        let console = CaptureSink::new("console");
        let service = LogService::new(Arc::new(console.clone()), None, Level::Info);

        service.on_startup_complete();
        service.log(&record("still here")).unwrap();

        assert!(!service.has_file_sink());
        assert_eq!(console.messages(), vec!["still here"]);
    }

    #[test]
    fn test_shutdown_closes_everything_once() {
        let (service, console, file) = service_with_file();
        service.on_startup_complete();

        service.on_shutdown().unwrap();
        service.on_shutdown().unwrap();

        assert_eq!(service.phase(), LifecyclePhase::Stopped);
        assert_eq!(file.close_count(), 1);
        assert_eq!(console.close_count(), 0);
    }

    #[test]
    fn test_shutdown_while_starting_closes_console_too() {
        let (service, console, file) = service_with_file();

        service.on_shutdown().unwrap();
        service.on_startup_complete();

        assert_eq!(service.phase(), LifecyclePhase::Stopped);
        assert_eq!(console.close_count(), 1);
        assert_eq!(file.close_count(), 1);
    }

    #[test]
    fn test_log_after_shutdown_is_rejected_without_io() {
        let (service, console, file) = service_with_file();
        service.on_shutdown().unwrap();

        assert_matches!(service.log(&record("late")), Err(SinkError::ServiceClosed));
        assert_matches!(
            service.log(&LogRecord::new(Level::Trace, "test", "late and quiet")),
            Err(SinkError::ServiceClosed)
        );
        assert!(console.records().is_empty());
        assert!(file.records().is_empty());
    }

    #[test]
    fn test_close_failures_are_collected() {
        let (service, console, file) = service_with_file();
        console.fail_close(true);

        let err = service.on_shutdown().unwrap_err();

        assert_matches!(err, SinkError::PartialCloseFailure { .. });
        assert_eq!(err.member_failures().len(), 1);
        assert_eq!(err.member_failures()[0].name, "console");
        assert_eq!(file.close_count(), 1);
        assert_eq!(service.phase(), LifecyclePhase::Stopped);
        service.on_shutdown().unwrap();
    }

    #[test]
    fn test_failing_member_does_not_silence_the_other() {
        let (service, console, file) = service_with_file();
        file.fail_writes(true);

        let err = service.log(&record("partial")).unwrap_err();

        assert_matches!(err, SinkError::PartialWriteFailure { .. });
        assert_eq!(console.messages(), vec!["partial"]);
    }

    #[test]
    fn test_records_below_level_are_dropped() {
        let console = CaptureSink::new("console");
        let service = LogService::new(Arc::new(console.clone()), None, Level::Warn);

        service
            .log(&LogRecord::new(Level::Info, "test", "chatty"))
            .unwrap();
        service
            .log(&LogRecord::new(Level::Error, "test", "important"))
            .unwrap();

        assert_eq!(console.messages(), vec!["important"]);
        assert!(!Logger::is_enabled(&service, Level::Debug));
    }

    #[test]
    fn test_scoped_logger_stamps_source() {
        let console = CaptureSink::new("console");
        let service = Arc::new(LogService::new(Arc::new(console.clone()), None, Level::Info));

        service.scoped("storage").warn("disk nearly full").unwrap();

        let records = console.records();
        assert_eq!(records[0].source(), "storage");
        assert_eq!(records[0].level(), Level::Warn);
    }

    #[test]
    fn test_open_writes_through_filesystem() {
        let fs = MemoryFileSystem::new();
        let stdout = SharedBuffer::new();
        let config: LogConfig = r#"path = "logs/app.log""#.parse().unwrap();

        let service = LogService::open(&config, stdout.clone(), Arc::new(fs.clone())).unwrap();
        service.log(&record("first")).unwrap();
        service.on_startup_complete();
        service.log(&record("second")).unwrap();
        service.on_shutdown().unwrap();

        let file = fs.read_to_string(Path::new("logs/app.log")).unwrap();
        assert!(file.contains("[test] first"));
        assert!(file.contains("[test] second"));
        let console = stdout.contents();
        assert!(console.contains("[test] first"));
        assert!(!console.contains("second"));
    }

    #[test]
    fn test_open_rejects_directory() {
        let fs = MemoryFileSystem::new();
        fs.insert_dir("logs/app.log");
        let config: LogConfig = r#"path = "logs/app.log""#.parse().unwrap();

        let err = LogService::open(&config, SharedBuffer::new(), Arc::new(fs)).unwrap_err();

        assert_matches!(err, crate::Error::Sink(SinkError::Configuration { .. }));
    }

    #[test]
    fn test_foreground_opens_no_file() {
        let fs = MemoryFileSystem::new();
        let config: LogConfig = "foreground = true".parse().unwrap();

        let service = LogService::open(&config, SharedBuffer::new(), Arc::new(fs.clone())).unwrap();

        assert!(!service.has_file_sink());
        assert!(fs.paths().is_empty());
    }
}
