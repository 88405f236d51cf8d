//! Filesystem operations trait.
//!
//! The operation set mirrors the host's path-based file functions so that
//! code written against it can run on [`MemoryFilesystem`] in tests and
//! on [`DiskFilesystem`] in production.
//!
//! Every fallible operation overwrites the backend's last error: cleared
//! on success, set to the failure message otherwise.
//!
//! [`MemoryFilesystem`]: crate::MemoryFilesystem
//! [`DiskFilesystem`]: crate::DiskFilesystem

use shadowfs_glob::GlobFlags;

use crate::error::{FsError, FsResult};
use crate::lines::split_lines;
use crate::types::{LineFlags, Metadata, PutFlags, ScandirOrder};

/// Core filesystem operations trait.
///
/// Paths are slash-separated strings; relative paths are resolved from
/// the working directory.
pub trait Filesystem {
    // ========================================================================
    // Navigation
    // ========================================================================

    /// Change the working directory. Links are followed.
    fn chdir(&mut self, path: &str) -> FsResult<()>;

    /// Absolute path of the working directory.
    fn getcwd(&self) -> String;

    /// Return the current umask, replacing it when `mask` is given.
    fn umask(&mut self, mask: Option<u32>) -> u32;

    // ========================================================================
    // Reading
    // ========================================================================

    /// Returns true if a node exists at `path` (a dangling link exists).
    fn file_exists(&self, path: &str) -> bool;

    /// Read the whole file.
    fn file_get_contents(&mut self, path: &str) -> FsResult<Vec<u8>>;

    /// Read a file as lines.
    fn file(&mut self, path: &str, flags: LineFlags) -> FsResult<Vec<Vec<u8>>> {
        let data = self.file_get_contents(path)?;
        Ok(split_lines(&data, flags))
    }

    /// Read a file as UTF-8 text.
    fn read_to_string(&mut self, path: &str) -> FsResult<String> {
        let data = self.file_get_contents(path)?;
        String::from_utf8(data)
            .map_err(|e| FsError::invalid_argument(format!("File {path} is not valid UTF-8: {e}")))
    }

    /// Permission bits.
    fn fileperms(&mut self, path: &str) -> FsResult<u32>;

    /// Byte length of the file `path` denotes.
    fn filesize(&mut self, path: &str) -> FsResult<u64>;

    /// Type, mode and size of the node itself (a final link is not followed).
    fn metadata(&mut self, path: &str) -> FsResult<Metadata>;

    /// Target text of a symbolic link.
    fn readlink(&mut self, path: &str) -> FsResult<String>;

    /// Directory entry names, `.` and `..` included.
    fn scandir(&mut self, path: &str, order: ScandirOrder) -> FsResult<Vec<String>>;

    /// Expand a glob pattern against the tree.
    fn glob(&mut self, pattern: &str, flags: GlobFlags) -> FsResult<Vec<String>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Replace permission bits (umask is not applied).
    fn chmod(&mut self, path: &str, mode: u32) -> FsResult<()>;

    /// Copy a file.
    fn copy(&mut self, source: &str, dest: &str) -> FsResult<()>;

    /// Write (or append) `data`, creating the file if needed.
    ///
    /// Returns the number of bytes written.
    fn file_put_contents(&mut self, path: &str, data: &[u8], flags: PutFlags) -> FsResult<usize>;

    /// Create a directory, optionally with missing parents.
    fn mkdir(&mut self, path: &str, mode: u32, recursive: bool) -> FsResult<()>;

    /// Move a file, link or directory tree.
    fn rename(&mut self, from: &str, to: &str) -> FsResult<()>;

    /// Remove an empty directory.
    fn rmdir(&mut self, path: &str) -> FsResult<()>;

    /// Create a symbolic link at `link` pointing to `target`.
    ///
    /// The target does not need to exist.
    fn symlink(&mut self, target: &str, link: &str) -> FsResult<()>;

    /// Create an empty file if nothing exists at `path`.
    fn touch(&mut self, path: &str) -> FsResult<()>;

    /// Remove a file or link.
    fn unlink(&mut self, path: &str) -> FsResult<()>;

    // ========================================================================
    // Predicates
    // ========================================================================

    /// Directory, or link to one.
    fn is_dir(&self, path: &str) -> bool;

    /// Regular file, or link to one.
    fn is_file(&self, path: &str) -> bool;

    /// Symbolic link (not followed).
    fn is_link(&self, path: &str) -> bool;

    fn is_readable(&self, path: &str) -> bool;

    fn is_writable(&self, path: &str) -> bool;

    /// Message of the most recent failure, if the last fallible call failed.
    fn last_error(&self) -> Option<&str>;
}
