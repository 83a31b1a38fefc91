//! In-memory filesystem with failure injection
//!
//! Open handles keep pointing at their file's content after a rename, the
//! way a descriptor does on a POSIX filesystem, so a test can observe what a
//! sink wrote to a file that has since been archived.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::FileSystem;

type Content = Arc<Mutex<Vec<u8>>>;

#[derive(Default)]
struct Inner {
    files: BTreeMap<PathBuf, Content>,
    dirs: BTreeSet<PathBuf>,
    /// Renames left before they start failing; `None` never fails
    renames_left: Option<usize>,
    fail_opens: bool,
    fail_writes: bool,
    fail_removes: bool,
}

/// A filesystem held entirely in memory. Clones share the same tree.
#[derive(Clone, Default)]
pub struct MemoryFileSystem {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryFileSystem {
    /// Empty filesystem
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a file with `content`, replacing any existing one.
    pub fn insert_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.inner
            .lock()
            .files
            .insert(path.into(), Arc::new(Mutex::new(content.into())));
    }

    /// Create a directory.
    pub fn insert_dir(&self, path: impl Into<PathBuf>) {
        self.inner.lock().dirs.insert(path.into());
    }

    /// Content of the file at `path`, if any.
    #[must_use]
    pub fn read(&self, path: &Path) -> Option<Vec<u8>> {
        self.inner.lock().files.get(path).map(|c| c.lock().clone())
    }

    /// Content of the file at `path` as text, if any.
    #[must_use]
    pub fn read_to_string(&self, path: &Path) -> Option<String> {
        self.read(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Every file path, sorted.
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.inner.lock().files.keys().cloned().collect()
    }

    /// Make renames fail
    pub fn fail_renames(&self, fail: bool) {
        self.inner.lock().renames_left = fail.then_some(0);
    }

    /// Let `successes` more renames through, then make the rest fail.
    pub fn fail_renames_after(&self, successes: usize) {
        self.inner.lock().renames_left = Some(successes);
    }

    /// Make opens fail
    pub fn fail_opens(&self, fail: bool) {
        self.inner.lock().fail_opens = fail;
    }

    /// Make writes through any handle fail
    pub fn fail_writes(&self, fail: bool) {
        self.inner.lock().fail_writes = fail;
    }

    /// Make deletes fail
    pub fn fail_removes(&self, fail: bool) {
        self.inner.lock().fail_removes = fail;
    }
}

fn not_found(path: &Path) -> io::Error {
    io::Error::new(
        io::ErrorKind::NotFound,
        format!("{}: no such file", path.display()),
    )
}

fn injected(what: &str) -> io::Error {
    io::Error::other(format!("injected {what} failure"))
}

impl FileSystem for MemoryFileSystem {
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let mut inner = self.inner.lock();
        if inner.fail_opens {
            return Err(injected("open"));
        }
        if inner.dirs.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::IsADirectory,
                format!("{}: is a directory", path.display()),
            ));
        }
        let content = Arc::clone(inner.files.entry(path.to_path_buf()).or_default());
        Ok(Box::new(MemoryHandle {
            content,
            fs: Arc::clone(&self.inner),
        }))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock();
        match inner.renames_left {
            Some(0) => return Err(injected("rename")),
            Some(left) => inner.renames_left = Some(left - 1),
            None => {}
        }
        let content = inner.files.remove(from).ok_or_else(|| not_found(from))?;
        inner.files.insert(to.to_path_buf(), content);
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock();
        if inner.fail_removes {
            return Err(injected("remove"));
        }
        inner
            .files
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| not_found(path))
    }

    fn exists(&self, path: &Path) -> bool {
        let inner = self.inner.lock();
        inner.files.contains_key(path) || inner.dirs.contains(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.inner.lock().dirs.contains(path)
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        let mut inner = self.inner.lock();
        for ancestor in path.ancestors() {
            if !ancestor.as_os_str().is_empty() {
                inner.dirs.insert(ancestor.to_path_buf());
            }
        }
        Ok(())
    }

    fn file_len(&self, path: &Path) -> io::Result<u64> {
        let inner = self.inner.lock();
        let content = inner.files.get(path).ok_or_else(|| not_found(path))?;
        Ok(content.lock().len() as u64)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .inner
            .lock()
            .files
            .keys()
            .filter(|path| path.parent() == Some(dir))
            .cloned()
            .collect())
    }
}

struct MemoryHandle {
    content: Content,
    fs: Arc<Mutex<Inner>>,
}

impl Write for MemoryHandle {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.fs.lock().fail_writes {
            return Err(injected("write"));
        }
        self.content.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_follows_renamed_file() {
        let fs = MemoryFileSystem::new();
        let mut handle = fs.open_append(Path::new("logs/a.log")).unwrap();
        handle.write_all(b"one ").unwrap();

        fs.rename(Path::new("logs/a.log"), Path::new("logs/a.log.1"))
            .unwrap();
        handle.write_all(b"two").unwrap();

        assert!(!fs.exists(Path::new("logs/a.log")));
        assert_eq!(
            fs.read_to_string(Path::new("logs/a.log.1")).as_deref(),
            Some("one two")
        );
    }

    #[test]
    fn test_directory_cannot_be_opened() {
        let fs = MemoryFileSystem::new();
        fs.create_dir_all(Path::new("var/log")).unwrap();

        assert!(fs.is_dir(Path::new("var")));
        let err = fs.open_append(Path::new("var/log")).err().unwrap();
        assert_eq!(err.kind(), io::ErrorKind::IsADirectory);
    }

    #[test]
    fn test_injected_failures() {
        let fs = MemoryFileSystem::new();
        fs.insert_file("a.log", "x");

        fs.fail_renames(true);
        assert!(fs.rename(Path::new("a.log"), Path::new("b.log")).is_err());
        fs.fail_removes(true);
        assert!(fs.remove_file(Path::new("a.log")).is_err());
        assert!(fs.exists(Path::new("a.log")));
    }

    #[test]
    fn test_renames_fail_after_budget() {
        let fs = MemoryFileSystem::new();
        fs.insert_file("a.log", "x");

        fs.fail_renames_after(1);
        fs.rename(Path::new("a.log"), Path::new("b.log")).unwrap();
        assert!(fs.rename(Path::new("b.log"), Path::new("a.log")).is_err());
        assert!(fs.exists(Path::new("b.log")));

        fs.fail_renames(false);
        fs.rename(Path::new("b.log"), Path::new("a.log")).unwrap();
    }
}
