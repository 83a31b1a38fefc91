//! Hooks for observing what a rotating sink does

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

/// Observer notified by a [`RotatingFileSink`](crate::RotatingFileSink).
///
/// Called with the sink's lock held; implementations must not log back into
/// the same sink.
pub trait RotationTracer: Send + Sync + 'static {
    /// `bytes` were appended to the active file.
    fn bytes_written(&self, _bytes: u64) {}

    /// The active file was moved to `archive`.
    fn rotated(&self, _archive: &Path) {}

    /// A rotation was attempted and abandoned.
    fn rotation_failed(&self, _error: &std::io::Error) {}

    /// `archive` was deleted to stay within the archive bound.
    fn evicted(&self, _archive: &Path) {}
}

/// Tracer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTracer;

impl RotationTracer for NoOpTracer {}

/// Tracer that counts events.
#[derive(Debug, Default)]
pub struct RotationCounters {
    bytes: AtomicU64,
    rotations: AtomicU64,
    failures: AtomicU64,
    evictions: AtomicU64,
}

impl RotationCounters {
    /// All counters at zero
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total bytes appended
    pub fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    /// Successful rotations
    pub fn rotations(&self) -> u64 {
        self.rotations.load(Ordering::Relaxed)
    }

    /// Abandoned rotations
    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    /// Deleted archives
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }
}

impl RotationTracer for RotationCounters {
    fn bytes_written(&self, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn rotated(&self, _archive: &Path) {
        self.rotations.fetch_add(1, Ordering::Relaxed);
    }

    fn rotation_failed(&self, _error: &std::io::Error) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }

    fn evicted(&self, _archive: &Path) {
        self.evictions.fetch_add(1, Ordering::Relaxed);
    }
}
