//! Size-rotated file sink for the proven logger.
//!
//! [`RotatingFileSink`] appends formatted records to one file. When the next
//! record would push the file past the [`RotationPolicy`] threshold, the file
//! is renamed to `<name>.<generation>` and a fresh one takes its place; the
//! oldest archives beyond the policy's bound are deleted in the same step.
//!
//! Filesystem access and time go through the [`FileSystem`] and [`Clock`]
//! traits so rotation can be driven deterministically in tests.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

mod clock;
mod error;
mod fs;
mod policy;
mod sink;
mod state;
mod tracer;

#[cfg(any(test, feature = "test-support"))]
mod memory;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{Error, Result};
pub use fs::{FileSystem, OsFileSystem};
#[cfg(any(test, feature = "test-support"))]
pub use memory::MemoryFileSystem;
pub use policy::{
    DEFAULT_MAX_ARCHIVES, DEFAULT_MIN_DELAY, DEFAULT_SIZE_THRESHOLD, RotationPolicy,
    archive_generation, archive_path,
};
pub use sink::{RotatingFileSink, RotatingFileSinkBuilder};
pub use state::RotationState;
pub use tracer::{NoOpTracer, RotationCounters, RotationTracer};
