//! Tests for the global compatibility bridges

use std::sync::{Arc, Mutex};

use proven_logger::*;
use serial_test::serial;

#[derive(Clone, Default)]
struct Collector(Arc<Mutex<Vec<LogRecord>>>);

impl Collector {
    fn messages(&self) -> Vec<String> {
        self.0
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.message().to_string())
            .collect()
    }
}

impl Logger for Collector {
    fn log(&self, record: LogRecord) -> Result<()> {
        self.0.lock().unwrap().push(record);
        Ok(())
    }
}

#[test]
#[serial]
#[cfg(feature = "tracing-compat")]
fn test_tracing_bridge() {
    let collector = Collector::default();
    compat::init_tracing_bridge(Arc::new(collector.clone()), Level::Info)
        .expect("no global subscriber installed yet");

    tracing::debug!("Debug from tracing");
    tracing::info!("Info from tracing");
    tracing::error!("Error from tracing");

    let messages = collector.messages();
    assert!(!messages.iter().any(|m| m.contains("Debug from tracing")));
    assert!(messages.iter().any(|m| m == "Info from tracing"));
    assert!(messages.iter().any(|m| m == "Error from tracing"));
}

#[test]
#[serial]
#[cfg(feature = "log-compat")]
fn test_log_bridge() {
    let collector = Collector::default();
    compat::init_log_bridge(Arc::new(collector.clone()), Level::Warn)
        .expect("no log logger installed yet");

    log::info!("Info from log crate");
    log::warn!("Warning from log crate");

    let messages = collector.messages();
    assert_eq!(messages, vec!["Warning from log crate".to_string()]);
}
