//! The filesystem operations rotation needs

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Filesystem operations used by [`RotatingFileSink`](crate::RotatingFileSink).
///
/// `rename` must be atomic with respect to other users of the directory.
pub trait FileSystem: Send + Sync + 'static {
    /// Open `path` for appending, creating it if missing.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying open.
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn Write + Send>>;

    /// Rename `from` to `to`.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying rename.
    fn rename(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete a file.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying delete.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// Whether anything exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Whether `path` is a directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Create `path` and all missing parents.
    ///
    /// # Errors
    ///
    /// Any I/O error from the underlying create.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Size of the file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file does not exist.
    fn file_len(&self, path: &Path) -> io::Result<u64>;

    /// Files directly inside `dir`.
    ///
    /// # Errors
    ///
    /// Fails if `dir` cannot be read.
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;
}

/// The real filesystem.
///
/// Files are written unbuffered; every record reaches the OS as one
/// `write_all`.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn open_append(&self, path: &Path) -> io::Result<Box<dyn Write + Send>> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Box::new(file))
    }

    fn rename(&self, from: &Path, to: &Path) -> io::Result<()> {
        fs::rename(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        fs::remove_file(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        fs::create_dir_all(path)
    }

    fn file_len(&self, path: &Path) -> io::Result<u64> {
        Ok(fs::metadata(path)?.len())
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        Ok(paths)
    }
}
