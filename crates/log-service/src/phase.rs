//! Lifecycle phases of the log service

use std::fmt;

/// Where the service is in its life.
///
/// Phases only move forward, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecyclePhase {
    /// Console and file both receive records
    Starting,
    /// Startup finished; the console has been detached if a file is open
    Running,
    /// Sinks are being closed
    ShuttingDown,
    /// Every sink is closed and logging is rejected
    Stopped,
}

impl LifecyclePhase {
    /// Whether `log` is still accepted in this phase
    #[must_use]
    pub const fn accepts_records(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Starting => "starting",
            Self::Running => "running",
            Self::ShuttingDown => "shutting down",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}
