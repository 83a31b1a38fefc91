//! Log lifecycle service.
//!
//! [`LogService`] owns the process's log destinations: the console while the
//! process is starting, a size-rotated file once it is running, and nothing
//! after shutdown. It is configured from a [`LogConfig`] and driven through
//! three calls: [`log`](LogService::log),
//! [`on_startup_complete`](LogService::on_startup_complete) and
//! [`on_shutdown`](LogService::on_shutdown).
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod phase;
mod service;

pub use config::{DEFAULT_LOG_PATH, LogConfig, parse_byte_size};
pub use error::{ConfigError, Error, Result};
pub use phase::LifecyclePhase;
pub use service::LogService;
