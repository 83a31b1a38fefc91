//! When to rotate, what to call the archive, which archives to drop.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::{Error, Result, RotationState};

/// Default size threshold, 20 MiB.
pub const DEFAULT_SIZE_THRESHOLD: u64 = 20 * 1024 * 1024;

/// Default minimum delay between two rotations.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(300);

/// Default number of archives kept next to the active file.
pub const DEFAULT_MAX_ARCHIVES: usize = 7;

/// Rotation settings for one log file. Pure decision logic, no I/O.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    size_threshold: u64,
    min_delay: Duration,
    max_archives: NonZeroUsize,
}

impl RotationPolicy {
    /// Create a policy.
    ///
    /// A `size_threshold` of 0 disables rotation whatever the delay.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidPolicy`] if `max_archives` is 0.
    pub fn new(size_threshold: u64, min_delay: Duration, max_archives: usize) -> Result<Self> {
        let max_archives = NonZeroUsize::new(max_archives).ok_or_else(|| {
            Error::InvalidPolicy("max_archives must be at least 1".to_string())
        })?;
        Ok(Self {
            size_threshold,
            min_delay,
            max_archives,
        })
    }

    /// A policy that never rotates.
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            size_threshold: 0,
            min_delay: Duration::ZERO,
            max_archives: NonZeroUsize::MIN,
        }
    }

    /// Size in bytes above which the file is rotated; 0 when disabled.
    #[must_use]
    pub const fn size_threshold(&self) -> u64 {
        self.size_threshold
    }

    /// Minimum time between two rotations.
    #[must_use]
    pub const fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Maximum number of archives kept.
    #[must_use]
    pub const fn max_archives(&self) -> usize {
        self.max_archives.get()
    }

    /// Whether rotation is enabled at all.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.size_threshold > 0
    }

    /// Whether writing `incoming` more bytes at `now` should first rotate.
    ///
    /// If the size bound would be crossed but the delay has not elapsed the
    /// answer is `false` and the write goes into the oversized file.
    #[must_use]
    pub fn should_rotate(&self, state: &RotationState, incoming: u64, now: Instant) -> bool {
        if !self.is_enabled() {
            return false;
        }
        if state.bytes_written().saturating_add(incoming) <= self.size_threshold {
            return false;
        }
        state
            .last_rotation()
            .is_none_or(|last| now.saturating_duration_since(last) >= self.min_delay)
    }

    /// Name for the next archive of `base`: one generation past the newest
    /// of `existing`, or generation 1 when there are none.
    ///
    /// `None` once the newest generation is `u64::MAX`.
    #[must_use]
    pub fn next_archive_name(base: &Path, existing: &[PathBuf]) -> Option<PathBuf> {
        next_generation(base, existing).map(|generation| archive_path(base, generation))
    }

    /// Archives that must be deleted to bring `archives` (oldest first) back
    /// within bound, oldest first.
    #[must_use]
    pub fn evict(&self, archives: &[PathBuf]) -> Vec<PathBuf> {
        let excess = archives.len().saturating_sub(self.max_archives.get());
        archives[..excess].to_vec()
    }
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self {
            size_threshold: DEFAULT_SIZE_THRESHOLD,
            min_delay: DEFAULT_MIN_DELAY,
            max_archives: NonZeroUsize::new(DEFAULT_MAX_ARCHIVES).unwrap_or(NonZeroUsize::MIN),
        }
    }
}

/// `<base>.<generation>`, next to `base`.
#[must_use]
pub fn archive_path(base: &Path, generation: u64) -> PathBuf {
    let mut name = base.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".{generation}"));
    base.with_file_name(name)
}

/// Generation of `candidate` if it is an archive of `base`.
///
/// Only the names [`archive_path`] produces count, so `server.log.05` is not
/// an archive of `server.log`.
#[must_use]
pub fn archive_generation(base: &Path, candidate: &Path) -> Option<u64> {
    let base_name = base.file_name()?.to_str()?;
    let candidate_name = candidate.file_name()?.to_str()?;
    let suffix = candidate_name.strip_prefix(base_name)?.strip_prefix('.')?;
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if suffix.len() > 1 && suffix.starts_with('0') {
        return None;
    }
    suffix.parse().ok()
}

pub(crate) fn next_generation(base: &Path, existing: &[PathBuf]) -> Option<u64> {
    existing
        .iter()
        .filter_map(|path| archive_generation(base, path))
        .max()
        .map_or(Some(1), |newest| newest.checked_add(1))
}
