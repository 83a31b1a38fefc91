//! Server bootstrap with managed logging.
//!
//! [`Bootstrap`] turns a command line into a running [`LogService`]: it loads
//! the logging configuration, opens the log, routes `tracing` and `log`
//! output into it, logs that startup is complete and hands the caller a
//! hook that closes everything on shutdown.
//!
//! [`LogService`]: proven_log_service::LogService
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod args;
mod bootstrap;
mod error;
mod frameworks;

pub use args::{Args, BIN_NAME};
pub use bootstrap::{BOOTSTRAP_SOURCE, Bootstrap, EXIT_FAILURE, EXIT_SUCCESS, ShutdownHook};
pub use error::{Error, Result};
pub use frameworks::{DEFAULT_DIAGNOSTICS_FILTER, redirect_frameworks};
