//! Startup sequence of the server

use std::ffi::OsString;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use proven_log_service::{LogConfig, LogService};
use proven_logger::{Level, Logger, ScopedLogger};
use proven_logger_file::FileSystem;
use tracing::{debug, error};

use crate::{Args, BIN_NAME, Error, Result};

/// Process exit code for a successful start (or `--help`)
pub const EXIT_SUCCESS: i32 = 0;

/// Process exit code for any failure to start
pub const EXIT_FAILURE: i32 = 1;

/// Source stamped on the bootstrap's own records
pub const BOOTSTRAP_SOURCE: &str = "proven_log_bootstrap";

/// Work to run when the process is asked to terminate.
pub type ShutdownHook = Box<dyn FnOnce() + Send>;

type HookRegistrar = Box<dyn FnOnce(ShutdownHook)>;
type StartupCheck = Box<dyn Fn(&ScopedLogger)>;
type FrameworkRedirect = Box<dyn FnOnce(Arc<dyn Logger>, Level)>;

/// Parses the command line, opens logging and hands back a shutdown hook.
///
/// Every outside effect is injected: the standard streams, the filesystem
/// the log is written through, how the shutdown hook is registered and which
/// checks run during startup.
pub struct Bootstrap {
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
    fs: Arc<dyn FileSystem>,
    register_shutdown_hook: HookRegistrar,
    startup_checks: Vec<StartupCheck>,
    redirect_frameworks: Option<FrameworkRedirect>,
}

impl Bootstrap {
    /// Bootstrap writing to the given streams and filesystem.
    ///
    /// Until a registrar is set the shutdown hook is dropped, so the log is
    /// never closed.
    pub fn new(
        stdout: impl Write + Send + 'static,
        stderr: impl Write + Send + 'static,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            stdout: Box::new(stdout),
            stderr: Box::new(stderr),
            fs,
            register_shutdown_hook: Box::new(drop::<ShutdownHook>),
            startup_checks: Vec::new(),
            redirect_frameworks: None,
        }
    }

    /// Receive the shutdown hook once startup has completed.
    #[must_use]
    pub fn with_shutdown_hook_registrar(
        mut self,
        registrar: impl FnOnce(ShutdownHook) + 'static,
    ) -> Self {
        self.register_shutdown_hook = Box::new(registrar);
        self
    }

    /// Run `check` during startup; it reports problems through the logger.
    #[must_use]
    pub fn with_startup_check(mut self, check: impl Fn(&ScopedLogger) + 'static) -> Self {
        self.startup_checks.push(Box::new(check));
        self
    }

    /// Called once the log is open to route other logging frameworks into it.
    #[must_use]
    pub fn with_framework_redirect(
        mut self,
        redirect: impl FnOnce(Arc<dyn Logger>, Level) + 'static,
    ) -> Self {
        self.redirect_frameworks = Some(Box::new(redirect));
        self
    }

    /// Start with `args` (not including the program name) and return the
    /// process exit code.
    ///
    /// Usage problems go to stderr; `--help` goes to stdout. On success the
    /// startup-complete record has been logged, the console detached (unless
    /// running in the foreground) and the shutdown hook registered.
    pub fn start<I, T>(mut self, args: I) -> i32
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let argv = std::iter::once(OsString::from(BIN_NAME))
            .chain(args.into_iter().map(Into::into));
        let args = match Args::try_parse_from(argv) {
            Ok(args) => args,
            Err(e) => return self.usage_error(&e),
        };

        match self.run(args) {
            Ok(()) => EXIT_SUCCESS,
            Err(e) => {
                let _ = writeln!(self.stderr, "{e}");
                if matches!(e, Error::MissingConfig) {
                    let _ = writeln!(self.stderr, "{}", Args::command().render_usage());
                }
                let _ = self.stderr.flush();
                EXIT_FAILURE
            }
        }
    }

    fn usage_error(&mut self, e: &clap::Error) -> i32 {
        let text = e.render().to_string();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                let _ = write!(self.stdout, "{text}");
                let _ = self.stdout.flush();
                EXIT_SUCCESS
            }
            _ => {
                let _ = write!(self.stderr, "{text}");
                let _ = self.stderr.flush();
                EXIT_FAILURE
            }
        }
    }

    fn run(&mut self, args: Args) -> Result<()> {
        let config_path = args
            .config
            .filter(|path| !path.as_os_str().is_empty())
            .ok_or(Error::MissingConfig)?;
        let config = load_config(&config_path, args.foreground)?;

        let stdout = std::mem::replace(&mut self.stdout, Box::new(std::io::sink()));
        let service = LogService::open(&config, stdout, Arc::clone(&self.fs))
            .map(Arc::new)
            .map_err(Error::OpenLog)?;
        debug!(
            config = %config_path.display(),
            file = service.has_file_sink(),
            "log service opened"
        );

        if let Some(redirect) = self.redirect_frameworks.take() {
            redirect(Arc::clone(&service) as Arc<dyn Logger>, config.level);
        }
        let log = service.scoped(BOOTSTRAP_SOURCE);

        for check in &self.startup_checks {
            check(&log);
        }

        log_or_report(&log, "Server startup complete");
        service.on_startup_complete();

        let register = std::mem::replace(
            &mut self.register_shutdown_hook,
            Box::new(drop::<ShutdownHook>),
        );
        register(Box::new(move || {
            log_or_report(&log, "Server shutdown complete");
            if let Err(e) = service.on_shutdown() {
                error!(error = %e, "failed to close the log cleanly");
            }
        }));

        Ok(())
    }
}

fn load_config(path: &Path, foreground: bool) -> Result<LogConfig> {
    let mut config = LogConfig::load(path)?;
    config.foreground |= foreground;
    Ok(config)
}

fn log_or_report(log: &ScopedLogger, message: &str) {
    if let Err(e) = log.info(message) {
        error!(error = %e, record = message, "failed to log");
    }
}

impl std::fmt::Debug for Bootstrap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bootstrap")
            .field("startup_checks", &self.startup_checks.len())
            .finish_non_exhaustive()
    }
}
