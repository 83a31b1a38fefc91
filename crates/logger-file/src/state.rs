//! Mutable bookkeeping for one rotating file

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

/// What a rotating sink knows about its active file and its archives.
///
/// Owned by the sink and only touched while its lock is held.
pub struct RotationState {
    bytes_written: u64,
    last_rotation: Option<Instant>,
    archives: Vec<PathBuf>,
    pub(crate) file: Option<Box<dyn Write + Send>>,
}

impl RotationState {
    /// State with no open file.
    ///
    /// `last_rotation` of `None` means the file has never been rotated, so
    /// the minimum delay does not apply. `archives` are oldest first.
    #[must_use]
    pub fn new(bytes_written: u64, last_rotation: Option<Instant>, archives: Vec<PathBuf>) -> Self {
        Self {
            bytes_written,
            last_rotation,
            archives,
            file: None,
        }
    }

    /// Bytes in the active file, including what was there before opening.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// When the last successful rotation happened.
    #[must_use]
    pub const fn last_rotation(&self) -> Option<Instant> {
        self.last_rotation
    }

    /// Archives currently on disk, oldest first.
    #[must_use]
    pub fn archives(&self) -> &[PathBuf] {
        &self.archives
    }

    pub(crate) const fn add_bytes(&mut self, bytes: u64) {
        self.bytes_written = self.bytes_written.saturating_add(bytes);
    }

    pub(crate) fn rotated(&mut self, archive: PathBuf, file: Box<dyn Write + Send>, now: Instant) {
        self.archives.push(archive);
        self.file = Some(file);
        self.bytes_written = 0;
        self.last_rotation = Some(now);
    }

    pub(crate) fn archives_mut(&mut self) -> &mut Vec<PathBuf> {
        &mut self.archives
    }
}

impl std::fmt::Debug for RotationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotationState")
            .field("bytes_written", &self.bytes_written)
            .field("last_rotation", &self.last_rotation)
            .field("archives", &self.archives)
            .field("open", &self.file.is_some())
            .finish()
    }
}
