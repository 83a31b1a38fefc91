//! Routing of `tracing` and `log` output into the log service

use std::io;
use std::sync::Arc;

use proven_logger::compat::{TracingBridge, init_log_bridge};
use proven_logger::{Level, Logger};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

use crate::Result;

/// Filter for the stderr diagnostics layer when `RUST_LOG` is unset.
pub const DEFAULT_DIAGNOSTICS_FILTER: &str = "warn";

/// Install the process-wide subscribers.
///
/// `tracing` events at `level` and above, and `log` records likewise, go to
/// `logger`. Diagnostics also go to stderr, filtered by `RUST_LOG`, so
/// problems inside the log sinks themselves (which are never fed back into
/// them) still reach someone.
///
/// # Errors
///
/// Fails if a global `tracing` subscriber or `log` logger is already set.
pub fn redirect_frameworks(logger: Arc<dyn Logger>, level: Level) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIAGNOSTICS_FILTER));
    let stderr = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_filter(filter);

    let subscriber = tracing_subscriber::registry()
        .with(stderr)
        .with(TracingBridge::new(Arc::clone(&logger)).with_min_level(level));
    tracing::subscriber::set_global_default(subscriber)?;

    init_log_bridge(logger, level)?;
    Ok(())
}
