//! End-to-end lifecycle against the real filesystem

use std::fs;
use std::sync::Arc;
use std::thread;

use proven_log_service::{LifecyclePhase, LogConfig, LogService};
use proven_logger::test_support::SharedBuffer;
use proven_logger::{Level, LogRecord, SinkError};
use proven_logger_file::OsFileSystem;

fn config_for(path: &std::path::Path, extra: &str) -> LogConfig {
    format!("path = {:?}\n{extra}", path.display().to_string())
        .parse()
        .unwrap()
}

#[test]
fn test_full_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs/server.log");
    let stdout = SharedBuffer::new();
    let service = LogService::open(&config_for(&path, ""), stdout.clone(), Arc::new(OsFileSystem))
        .unwrap();

    service
        .log(&LogRecord::new(Level::Info, "boot", "loading"))
        .unwrap();
    service.on_startup_complete();
    assert_eq!(service.phase(), LifecyclePhase::Running);
    service
        .log(&LogRecord::new(Level::Info, "boot", "serving"))
        .unwrap();
    service.on_shutdown().unwrap();

    let file = fs::read_to_string(&path).unwrap();
    assert!(file.contains("loading"));
    assert!(file.contains("serving"));
    assert!(stdout.contents().contains("loading"));
    assert!(!stdout.contents().contains("serving"));

    let late = service.log(&LogRecord::new(Level::Error, "boot", "too late"));
    assert!(matches!(late, Err(SinkError::ServiceClosed)));
    assert!(!fs::read_to_string(&path).unwrap().contains("too late"));
}

#[test]
fn test_concurrent_logging_through_service() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.log");
    let service = Arc::new(
        LogService::open(
            &config_for(&path, "rotation-threshold = 0"),
            SharedBuffer::new(),
            Arc::new(OsFileSystem),
        )
        .unwrap(),
    );
    service.on_startup_complete();

    let handles: Vec<_> = (0..50)
        .map(|worker| {
            let log = service.scoped(format!("worker-{worker}"));
            thread::spawn(move || {
                for i in 0..100 {
                    log.info(format!("message {i}")).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }
    service.on_shutdown().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), 5000);
    assert!(content.lines().all(|line| line.contains("] message ")));
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
}

#[test]
fn test_shutdown_races_writers_safely() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("server.log");
    let service = Arc::new(
        LogService::open(&config_for(&path, ""), SharedBuffer::new(), Arc::new(OsFileSystem))
            .unwrap(),
    );

    let writers: Vec<_> = (0..8)
        .map(|_| {
            let service = Arc::clone(&service);
            thread::spawn(move || {
                let mut written = 0usize;
                for i in 0..500 {
                    let record = LogRecord::new(Level::Info, "race", format!("line {i}"));
                    match service.log(&record) {
                        Ok(()) => written += 1,
                        Err(SinkError::ServiceClosed) => break,
                        Err(e) => panic!("unexpected error: {e}"),
                    }
                }
                written
            })
        })
        .collect();
    service.on_shutdown().unwrap();
    let written: usize = writers.into_iter().map(|h| h.join().unwrap()).sum();

    let content = fs::read_to_string(&path).unwrap();
    assert_eq!(content.lines().count(), written);
}
