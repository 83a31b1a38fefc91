//! Startup behaviour seen from the outside: exit codes and stream contents

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use proven_log_bootstrap::{Bootstrap, ShutdownHook};
use proven_logger::test_support::SharedBuffer;
use proven_logger_file::MemoryFileSystem;
use tempfile::TempDir;

struct Harness {
    stdout: SharedBuffer,
    stderr: SharedBuffer,
    fs: MemoryFileSystem,
    hook: Rc<RefCell<Option<ShutdownHook>>>,
    dir: TempDir,
}

impl Harness {
    fn new() -> Self {
        Self {
            stdout: SharedBuffer::new(),
            stderr: SharedBuffer::new(),
            fs: MemoryFileSystem::new(),
            hook: Rc::default(),
            dir: tempfile::tempdir().unwrap(),
        }
    }

    fn write_config(&self, contents: &str) -> PathBuf {
        let path = self.dir.path().join("logging.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    fn bootstrap(&self) -> Bootstrap {
        let hook = Rc::clone(&self.hook);
        Bootstrap::new(
            self.stdout.clone(),
            self.stderr.clone(),
            Arc::new(self.fs.clone()),
        )
        .with_shutdown_hook_registrar(move |h| *hook.borrow_mut() = Some(h))
    }

    fn start(&self, args: &[&str]) -> i32 {
        self.bootstrap().start(args.iter().copied())
    }

    fn shutdown(&self) {
        let hook = self.hook.borrow_mut().take().expect("hook registered");
        hook();
    }

    fn log_file(&self, path: &str) -> String {
        self.fs.read_to_string(Path::new(path)).unwrap_or_default()
    }
}

#[test]
fn test_usage_on_invalid_arguments() {
    let harness = Harness::new();

    let code = harness.start(&["--invalid"]);

    assert_eq!(code, 1);
    assert_eq!(harness.stdout.contents(), "");
    let stderr = harness.stderr.contents();
    assert!(stderr.contains("unexpected argument"), "{stderr}");
    assert!(stderr.contains("Usage: proven-logd"), "{stderr}");
}

#[test]
fn test_help_goes_to_stdout() {
    let harness = Harness::new();

    let code = harness.start(&["-h"]);

    assert_eq!(code, 0);
    assert!(harness.stdout.contents().contains("Usage: proven-logd"));
    assert!(harness.stdout.contents().contains("--foreground"));
    assert_eq!(harness.stderr.contents(), "");
    assert!(harness.hook.borrow().is_none());
}

#[test]
fn test_missing_config_argument() {
    let harness = Harness::new();

    let code = harness.start(&[]);

    assert_eq!(code, 1);
    assert_eq!(harness.stdout.contents(), "");
    let stderr = harness.stderr.contents();
    assert!(stderr.contains("No configuration file specified"));
    assert!(stderr.contains("Usage: proven-logd"));
}

#[test]
fn test_missing_config_file() {
    let harness = Harness::new();

    let code = harness.start(&["/invalid/config/file.toml"]);

    assert_eq!(code, 1);
    assert_eq!(harness.stdout.contents(), "");
    assert!(
        harness
            .stderr
            .contents()
            .contains("Reading configuration failed: /invalid/config/file.toml")
    );
}

#[test]
fn test_invalid_config_file() {
    let harness = Harness::new();
    let config = harness.write_config("rotation-threshold = \"plenty\"");

    let code = harness.start(&[config.to_str().unwrap()]);

    assert_eq!(code, 1);
    assert_eq!(harness.stdout.contents(), "");
    let stderr = harness.stderr.contents();
    assert!(stderr.starts_with("Reading configuration failed: "), "{stderr}");
    assert!(stderr.contains("invalid byte size"), "{stderr}");
}

#[test]
fn test_log_file_cannot_be_opened() {
    let harness = Harness::new();
    harness.fs.insert_dir("/output");
    let config = harness.write_config(r#"path = "/output""#);

    let code = harness.start(&[config.to_str().unwrap()]);

    assert_eq!(code, 1);
    assert_eq!(harness.stdout.contents(), "");
    let stderr = harness.stderr.contents();
    assert!(stderr.contains("Failed to open output log file: "), "{stderr}");
    assert!(stderr.contains("/output: Is a directory"), "{stderr}");
}

#[test]
fn test_startup_checks_log_to_console_in_foreground() {
    let harness = Harness::new();
    let config = harness.write_config(r#"path = "logs/server.log""#);

    let code = harness
        .bootstrap()
        .with_startup_check(|log| {
            log.warn("An environment related warning").unwrap();
        })
        .start(["-f", config.to_str().unwrap()]);

    assert_eq!(code, 0);
    let stdout = harness.stdout.contents();
    assert!(stdout.contains("WARN  [proven_log_bootstrap] An environment related warning"));
    assert!(stdout.contains("Server startup complete"));
    assert_eq!(harness.stderr.contents(), "");
    assert!(harness.fs.paths().is_empty());

    harness.shutdown();
    assert!(harness.stdout.contents().contains("Server shutdown complete"));
}

#[test]
fn test_console_detached_after_startup() {
    let harness = Harness::new();
    let config = harness.write_config(r#"path = "logs/server.log""#);

    let code = harness.start(&[config.to_str().unwrap()]);
    assert_eq!(code, 0);

    let stdout = harness.stdout.contents();
    assert!(stdout.contains("Server startup complete"));
    assert!(harness.log_file("logs/server.log").contains("Server startup complete"));

    harness.shutdown();

    assert!(!harness.stdout.contents().contains("Server shutdown complete"));
    assert!(harness.log_file("logs/server.log").contains("Server shutdown complete"));
    assert_eq!(harness.stderr.contents(), "");
}

#[test]
fn test_level_from_config_applies() {
    let harness = Harness::new();
    let config = harness.write_config("path = \"logs/server.log\"\nlevel = \"warn\"");

    let code = harness
        .bootstrap()
        .with_startup_check(|log| {
            log.info("chatty").unwrap();
            log.error("broken").unwrap();
        })
        .start([config.to_str().unwrap()]);

    assert_eq!(code, 0);
    let file = harness.log_file("logs/server.log");
    assert!(file.contains("broken"));
    assert!(!file.contains("chatty"));
    assert!(!file.contains("Server startup complete"));
}
