//! Size-rotated log file

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use proven_logger::{
    DispatchGuard, LogFormatter, LogRecord, PlainTextFormatter, Result, Sink, SinkError,
};
use tracing::{debug, error, warn};

use crate::policy::{archive_generation, archive_path, next_generation};
use crate::{
    Clock, FileSystem, NoOpTracer, OsFileSystem, RotationPolicy, RotationState, RotationTracer,
    SystemClock,
};

/// A sink appending to one file and rotating it into numbered archives.
///
/// Rotation is decided on the write path: if the next record would push the
/// file past the policy's threshold (and the minimum delay has passed), the
/// file is renamed to `<name>.<generation>`, a fresh file is opened in its
/// place, and the oldest archives beyond the policy's bound are deleted. All
/// of this happens under the sink's lock, so concurrent writers never see a
/// half-rotated file.
pub struct RotatingFileSink {
    name: String,
    path: PathBuf,
    policy: RotationPolicy,
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    formatter: Arc<dyn LogFormatter>,
    tracer: Arc<dyn RotationTracer>,
    state: Mutex<RotationState>,
}

/// Builder for [`RotatingFileSink`].
pub struct RotatingFileSinkBuilder {
    path: PathBuf,
    policy: RotationPolicy,
    fs: Arc<dyn FileSystem>,
    clock: Arc<dyn Clock>,
    formatter: Arc<dyn LogFormatter>,
    tracer: Arc<dyn RotationTracer>,
}

impl RotatingFileSinkBuilder {
    /// Rotation policy (defaults to [`RotationPolicy::default`])
    #[must_use]
    pub const fn policy(mut self, policy: RotationPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Filesystem to write through (defaults to [`OsFileSystem`])
    #[must_use]
    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    /// Time source for the rotation delay (defaults to [`SystemClock`])
    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Record formatter (defaults to [`PlainTextFormatter`])
    #[must_use]
    pub fn formatter(mut self, formatter: Arc<dyn LogFormatter>) -> Self {
        self.formatter = formatter;
        self
    }

    /// Observer for writes and rotations (defaults to [`NoOpTracer`])
    #[must_use]
    pub fn tracer(mut self, tracer: Arc<dyn RotationTracer>) -> Self {
        self.tracer = tracer;
        self
    }

    /// Open the file, creating it and its parent directories as needed.
    ///
    /// Archives of the file already present in its directory are picked up,
    /// and the oldest are deleted if there are more than the policy allows.
    ///
    /// # Errors
    ///
    /// Returns [`SinkError::Configuration`] if the path is a directory or the
    /// file cannot be opened for appending.
    pub fn open(self) -> Result<RotatingFileSink> {
        let Self {
            path,
            policy,
            fs,
            clock,
            formatter,
            tracer,
        } = self;

        let configuration = |reason: String| SinkError::Configuration {
            path: path.clone(),
            reason,
        };

        if fs.is_dir(&path) {
            return Err(configuration("Is a directory".to_string()));
        }
        let dir = parent_dir(&path);
        if !fs.exists(dir) {
            fs.create_dir_all(dir)
                .map_err(|e| configuration(e.to_string()))?;
        }
        let file = fs
            .open_append(&path)
            .map_err(|e| configuration(e.to_string()))?;
        let bytes_written = fs.file_len(&path).unwrap_or(0);
        let archives = discover_archives(fs.as_ref(), &path);

        let mut state = RotationState::new(bytes_written, None, archives);
        state.file = Some(file);

        let sink = RotatingFileSink {
            name: path.display().to_string(),
            path,
            policy,
            fs,
            clock,
            formatter,
            tracer,
            state: Mutex::new(state),
        };

        {
            let mut state = sink.state.lock();
            if sink.policy.is_enabled() {
                sink.evict_excess(&mut state);
            }
            debug!(
                path = %sink.path.display(),
                bytes = state.bytes_written(),
                archives = state.archives().len(),
                "opened log file"
            );
        }

        Ok(sink)
    }
}

impl RotatingFileSink {
    /// Start building a sink writing to `path`.
    pub fn builder(path: impl Into<PathBuf>) -> RotatingFileSinkBuilder {
        RotatingFileSinkBuilder {
            path: path.into(),
            policy: RotationPolicy::default(),
            fs: Arc::new(OsFileSystem),
            clock: Arc::new(SystemClock),
            formatter: Arc::new(PlainTextFormatter),
            tracer: Arc::new(NoOpTracer),
        }
    }

    /// Open `path` on the real filesystem with `policy` and plain-text output.
    ///
    /// # Errors
    ///
    /// See [`RotatingFileSinkBuilder::open`].
    pub fn open(path: impl Into<PathBuf>, policy: RotationPolicy) -> Result<Self> {
        Self::builder(path).policy(policy).open()
    }

    /// The active file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The rotation policy in force
    #[must_use]
    pub const fn policy(&self) -> &RotationPolicy {
        &self.policy
    }

    /// Bytes in the active file
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.state.lock().bytes_written()
    }

    /// Archives on disk, oldest first
    #[must_use]
    pub fn archives(&self) -> Vec<PathBuf> {
        self.state.lock().archives().to_vec()
    }

    /// Rotate now, whatever the size and delay.
    ///
    /// # Errors
    ///
    /// [`SinkError::RotationFailed`] if the file could not be moved aside or
    /// reopened (the active file is left in place), [`SinkError::Closed`] if
    /// the sink was closed.
    pub fn rotate(&self) -> Result<()> {
        let _dispatch = DispatchGuard::enter();
        let mut state = self.state.lock();
        if state.file.is_none() {
            return Err(self.closed());
        }
        let now = self.clock.now();
        self.rotate_locked(&mut state, now).map_err(|source| {
            self.tracer.rotation_failed(&source);
            SinkError::RotationFailed {
                path: self.path.clone(),
                source,
            }
        })
    }

    fn closed(&self) -> SinkError {
        SinkError::Closed(self.name.clone())
    }

    fn write_failed(&self, source: io::Error) -> SinkError {
        SinkError::WriteFailed {
            sink: self.name.clone(),
            source,
        }
    }

    fn rotate_locked(&self, state: &mut RotationState, now: Instant) -> io::Result<()> {
        if let Some(file) = state.file.as_mut() {
            file.flush()?;
        }

        let archive = self.next_archive(state.archives())?;
        self.fs.rename(&self.path, &archive)?;
        let file = match self.fs.open_append(&self.path) {
            Ok(file) => file,
            Err(e) => {
                // Put the old file back so writes keep landing at the base path.
                if let Err(undo) = self.fs.rename(&archive, &self.path) {
                    error!(
                        path = %self.path.display(),
                        archive = %archive.display(),
                        error = %undo,
                        "failed to restore log file after aborted rotation"
                    );
                    // Writes now land in the archive; track it so it is evicted in turn.
                    state.archives_mut().push(archive);
                    self.evict_excess(state);
                }
                return Err(e);
            }
        };

        debug!(path = %self.path.display(), archive = %archive.display(), "rotated log file");
        self.tracer.rotated(&archive);
        state.rotated(archive, file, now);
        self.evict_excess(state);
        Ok(())
    }

    fn next_archive(&self, archives: &[PathBuf]) -> io::Result<PathBuf> {
        let exhausted = || {
            io::Error::other(format!(
                "{}: no archive generation left",
                self.path.display()
            ))
        };

        let mut generation = next_generation(&self.path, archives).ok_or_else(exhausted)?;
        loop {
            let candidate = archive_path(&self.path, generation);
            if !self.fs.exists(&candidate) {
                return Ok(candidate);
            }
            generation = generation.checked_add(1).ok_or_else(exhausted)?;
        }
    }

    fn evict_excess(&self, state: &mut RotationState) {
        let evicted = self.policy.evict(state.archives());
        for archive in &evicted {
            match self.fs.remove_file(archive) {
                Ok(()) => {
                    debug!(archive = %archive.display(), "deleted old log archive");
                    self.tracer.evicted(archive);
                }
                Err(e) => warn!(
                    archive = %archive.display(),
                    error = %e,
                    "failed to delete old log archive"
                ),
            }
        }
        state.archives_mut().drain(..evicted.len());
    }

    fn append(&self, state: &mut RotationState, bytes: &[u8]) -> Result<()> {
        let file = state.file.as_mut().ok_or_else(|| self.closed())?;
        file.write_all(bytes).map_err(|e| self.write_failed(e))?;

        let len = bytes.len() as u64;
        state.add_bytes(len);
        self.tracer.bytes_written(len);
        Ok(())
    }
}

impl Sink for RotatingFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, record: &LogRecord) -> Result<()> {
        let _dispatch = DispatchGuard::enter();
        let bytes = self.formatter.format(record)?;

        let mut state = self.state.lock();
        if state.file.is_none() {
            return Err(self.closed());
        }

        // An empty file has nothing worth archiving, even for an oversized record.
        let now = self.clock.now();
        if state.bytes_written() > 0 && self.policy.should_rotate(&state, bytes.len() as u64, now)
        {
            if let Err(e) = self.rotate_locked(&mut state, now) {
                self.tracer.rotation_failed(&e);
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "log rotation failed, continuing in the current file"
                );
            }
        }

        self.append(&mut state, &bytes)
    }

    fn flush(&self) -> Result<()> {
        let mut state = self.state.lock();
        match state.file.as_mut() {
            Some(file) => file.flush().map_err(|e| self.write_failed(e)),
            None => Ok(()),
        }
    }

    fn close(&self) -> Result<()> {
        let Some(mut file) = self.state.lock().file.take() else {
            return Ok(());
        };
        debug!(path = %self.path.display(), "closing log file");
        file.flush().map_err(|e| self.write_failed(e))
    }
}

impl std::fmt::Debug for RotatingFileSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFileSink")
            .field("path", &self.path)
            .field("policy", &self.policy)
            .field("state", &*self.state.lock())
            .finish_non_exhaustive()
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Archives of `path` in its directory, oldest first.
fn discover_archives(fs: &dyn FileSystem, path: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs.list_dir(parent_dir(path)) else {
        return Vec::new();
    };
    let mut archives: Vec<(u64, PathBuf)> = entries
        .into_iter()
        .filter_map(|entry| archive_generation(path, &entry).map(|generation| (generation, entry)))
        .collect();
    archives.sort_unstable();
    archives.dedup_by_key(|(generation, _)| *generation);
    archives.into_iter().map(|(_, archive)| archive).collect()
}
