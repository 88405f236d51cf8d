//! Host filesystem backend.
//!
//! Maps the virtual namespace onto a directory of the host filesystem so
//! code tested against [`MemoryFilesystem`](super::MemoryFilesystem) can
//! run unchanged on real storage. Paths are normalised lexically and `..`
//! is clamped at the root, so virtual paths never name anything outside
//! it. Beyond that, behaviour is whatever the host OS does.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};
use std::path::{Path, PathBuf};

use shadowfs_glob::GlobFlags;

use crate::config::FsConfig;
use crate::error::{FsError, FsResult};
use crate::mode::Mode;
use crate::ops::Filesystem;
use crate::path;
use crate::types::{FileType, Metadata, PutFlags, ScandirOrder};

/// Host filesystem rooted at a directory.
///
/// The host process working directory is never changed; `chdir` only moves
/// the virtual one.
#[derive(Debug, Clone)]
pub struct DiskFilesystem {
    root: PathBuf,
    cwd: String,
    umask: u32,
    last_error: Option<String>,
}

impl DiskFilesystem {
    /// Create a filesystem rooted at `root`.
    ///
    /// The root is canonicalised at construction time to handle symlinks
    /// (e.g. macOS `/tmp` -> `/private/tmp`).
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::from_parts(root.into(), &FsConfig::default())
    }

    /// Create a filesystem rooted at `root` with `config`'s umask and
    /// working directory (created if missing).
    pub fn with_config(root: impl Into<PathBuf>, config: &FsConfig) -> FsResult<Self> {
        config.validate()?;
        let mut fs = Self::from_parts(root.into(), config);
        let cwd = config.working_directory.as_str();
        if cwd != "/" {
            if fs::symlink_metadata(fs.host_path(cwd)).is_err() {
                fs.try_mkdir(cwd, 0o777, true)?;
            }
            fs.try_chdir(cwd)?;
        }
        Ok(fs)
    }

    fn from_parts(root: PathBuf, config: &FsConfig) -> Self {
        let root = dunce::canonicalize(&root).unwrap_or(root);
        Self {
            root,
            cwd: "/".to_string(),
            umask: config.umask & Mode::MASK,
            last_error: None,
        }
    }

    /// Host directory backing the virtual root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn virtual_path(&self, path: &str) -> String {
        path::normalize(&path::absolute(&self.cwd, path))
    }

    /// Host path for a virtual path.
    pub(crate) fn host_path(&self, path: &str) -> PathBuf {
        let virt = self.virtual_path(path);
        let relative = virt.trim_start_matches('/');
        if relative.is_empty() {
            self.root.clone()
        } else {
            self.root.join(relative)
        }
    }

    /// Like [`host_path`](Self::host_path), but an empty path is an error
    /// for `call` rather than the working directory.
    fn locate(&self, call: &str, path: &str) -> FsResult<PathBuf> {
        if path.is_empty() {
            return Err(FsError::from_io(call, path, io::Error::from(io::ErrorKind::NotFound)));
        }
        Ok(self.host_path(path))
    }

    fn apply_mode(&self, host: &Path, bits: u32) -> io::Result<()> {
        let mode = Mode::masked(bits, self.umask);
        fs::set_permissions(host, fs::Permissions::from_mode(mode.bits()))
    }

    fn owner_mode(&self, path: &str) -> Option<Mode> {
        fs::metadata(self.host_path(path))
            .ok()
            .map(|meta| Mode::new(meta.permissions().mode()))
    }

    fn record<T>(&mut self, result: FsResult<T>) -> FsResult<T> {
        match &result {
            Ok(_) => self.last_error = None,
            Err(e) => {
                e.emit();
                self.last_error = Some(e.message().to_string());
            }
        }
        result
    }

    /// Write `data` to `host`, creating it with the umask-adjusted file
    /// mode if it did not exist.
    fn write_file(&self, host: &Path, data: &[u8], append: bool) -> io::Result<()> {
        let existed = fs::symlink_metadata(host).is_ok();
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .append(append)
            .truncate(!append)
            .mode(Mode::masked(0o666, self.umask).bits())
            .open(host)?;
        file.write_all(data)?;
        if !existed {
            self.apply_mode(host, 0o666)?;
        }
        Ok(())
    }

    fn try_chdir(&mut self, path: &str) -> FsResult<()> {
        let host = self.locate("chdir", path)?;
        let meta = fs::metadata(&host).map_err(|e| FsError::from_io("chdir", path, e))?;
        if !meta.is_dir() {
            return Err(FsError::wrong_type(format!("Path {path} is not a directory"))
                .with_diagnostic("chdir", path, "Not a directory"));
        }
        self.cwd = self.virtual_path(path);
        tracing::debug!(cwd = %self.cwd, "working directory changed");
        Ok(())
    }

    fn try_mkdir(&mut self, path: &str, mode: u32, recursive: bool) -> FsResult<()> {
        let host = self.locate("mkdir", path)?;
        let io_err = |e| FsError::from_io("mkdir", path, e);

        if recursive {
            let mut missing = Vec::new();
            let mut cursor = host.parent();
            while let Some(dir) = cursor {
                if !dir.starts_with(&self.root) || fs::symlink_metadata(dir).is_ok() {
                    break;
                }
                missing.push(dir.to_path_buf());
                cursor = dir.parent();
            }
            for dir in missing.iter().rev() {
                fs::create_dir(dir)
                    .and_then(|()| self.apply_mode(dir, mode | 0o700))
                    .map_err(io_err)?;
            }
        }

        fs::create_dir(&host)
            .and_then(|()| self.apply_mode(&host, mode))
            .map_err(io_err)?;
        tracing::debug!(path, "directory created");
        Ok(())
    }
}

impl Filesystem for DiskFilesystem {
    fn chdir(&mut self, path: &str) -> FsResult<()> {
        let result = self.try_chdir(path);
        self.record(result)
    }

    fn getcwd(&self) -> String {
        self.cwd.clone()
    }

    fn umask(&mut self, mask: Option<u32>) -> u32 {
        let previous = self.umask;
        if let Some(mask) = mask {
            self.umask = mask & Mode::MASK;
            tracing::debug!(umask = %Mode::new(self.umask), "umask changed");
        }
        previous
    }

    fn file_exists(&self, path: &str) -> bool {
        !path.is_empty() && fs::symlink_metadata(self.host_path(path)).is_ok()
    }

    fn file_get_contents(&mut self, path: &str) -> FsResult<Vec<u8>> {
        let result = self
            .locate("file_get_contents", path)
            .and_then(|host| fs::read(host).map_err(|e| FsError::from_io("file_get_contents", path, e)));
        self.record(result)
    }

    fn fileperms(&mut self, path: &str) -> FsResult<u32> {
        let result = self.locate("fileperms", path).and_then(|host| {
            fs::metadata(host)
                .map(|meta| Mode::new(meta.permissions().mode()).bits())
                .map_err(|e| FsError::from_io("fileperms", path, e))
        });
        self.record(result)
    }

    fn filesize(&mut self, path: &str) -> FsResult<u64> {
        let result = self.locate("filesize", path).and_then(|host| {
            fs::metadata(host)
                .map(|meta| meta.len())
                .map_err(|e| FsError::from_io("filesize", path, e))
        });
        self.record(result)
    }

    fn metadata(&mut self, path: &str) -> FsResult<Metadata> {
        let result = self.locate("lstat", path).and_then(|host| {
            let meta = fs::symlink_metadata(host).map_err(|e| FsError::from_io("lstat", path, e))?;
            let file_type = meta.file_type();
            let kind = if file_type.is_symlink() {
                FileType::Symlink
            } else if file_type.is_dir() {
                FileType::Directory
            } else {
                FileType::File
            };
            Ok(Metadata {
                kind,
                mode: Mode::new(meta.permissions().mode()),
                size: if kind.is_dir() { 0 } else { meta.len() },
            })
        });
        self.record(result)
    }

    fn readlink(&mut self, path: &str) -> FsResult<String> {
        let result = self.locate("readlink", path).and_then(|host| {
            let target = fs::read_link(host).map_err(|e| FsError::from_io("readlink", path, e))?;
            Ok(match target.strip_prefix(&self.root) {
                Ok(inside) => format!("/{}", inside.to_string_lossy()),
                Err(_) => target.to_string_lossy().into_owned(),
            })
        });
        self.record(result)
    }

    fn scandir(&mut self, path: &str, order: ScandirOrder) -> FsResult<Vec<String>> {
        let result = self.locate("scandir", path).and_then(|host| {
            let entries = fs::read_dir(host).map_err(|e| FsError::from_io("scandir", path, e))?;
            let mut names = vec![".".to_string(), "..".to_string()];
            for entry in entries {
                let entry = entry.map_err(|e| FsError::from_io("scandir", path, e))?;
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
            match order {
                ScandirOrder::Ascending => names.sort(),
                ScandirOrder::Descending => names.sort_by(|a, b| b.cmp(a)),
                ScandirOrder::Unsorted => {}
            }
            Ok(names)
        });
        self.record(result)
    }

    fn glob(&mut self, pattern: &str, flags: GlobFlags) -> FsResult<Vec<String>> {
        let result = shadowfs_glob::glob(&*self, &self.cwd, pattern, flags).map_err(FsError::from);
        self.record(result)
    }

    fn chmod(&mut self, path: &str, mode: u32) -> FsResult<()> {
        let result = self.locate("chmod", path).and_then(|host| {
            let mode = Mode::new(mode);
            fs::set_permissions(host, fs::Permissions::from_mode(mode.bits()))
                .map_err(|e| FsError::from_io("chmod", path, e))?;
            tracing::debug!(path, %mode, "mode changed");
            Ok(())
        });
        self.record(result)
    }

    fn copy(&mut self, source: &str, dest: &str) -> FsResult<()> {
        let result = self.locate("copy", source).and_then(|src| {
            let dst = self.locate("copy", dest)?;
            let data = fs::read(src).map_err(|e| FsError::from_io("copy", source, e))?;
            self.write_file(&dst, &data, false)
                .map_err(|e| FsError::from_io("copy", dest, e))
        });
        self.record(result)
    }

    fn file_put_contents(&mut self, path: &str, data: &[u8], flags: PutFlags) -> FsResult<usize> {
        let result = self.locate("file_put_contents", path).and_then(|host| {
            self.write_file(&host, data, flags.contains(PutFlags::APPEND))
                .map_err(|e| FsError::from_io("file_put_contents", path, e))?;
            Ok(data.len())
        });
        self.record(result)
    }

    fn mkdir(&mut self, path: &str, mode: u32, recursive: bool) -> FsResult<()> {
        let result = self.try_mkdir(path, mode, recursive);
        self.record(result)
    }

    #[tracing::instrument(level = "debug", skip(self))]
    fn rename(&mut self, from: &str, to: &str) -> FsResult<()> {
        let result = self.locate("rename", from).and_then(|src| {
            let dst = self.locate("rename", to)?;
            fs::rename(src, dst).map_err(|e| FsError::from_io("rename", from, e))
        });
        self.record(result)
    }

    fn rmdir(&mut self, path: &str) -> FsResult<()> {
        let result = self
            .locate("rmdir", path)
            .and_then(|host| fs::remove_dir(host).map_err(|e| FsError::from_io("rmdir", path, e)));
        self.record(result)
    }

    fn symlink(&mut self, target: &str, link: &str) -> FsResult<()> {
        let result = self.locate("symlink", link).and_then(|host| {
            let stored = if target.starts_with('/') {
                self.host_path(target)
            } else {
                PathBuf::from(target)
            };
            std::os::unix::fs::symlink(stored, host)
                .map_err(|e| FsError::from_io("symlink", link, e))
        });
        self.record(result)
    }

    fn touch(&mut self, path: &str) -> FsResult<()> {
        let result = self.locate("touch", path).and_then(|host| {
            if fs::symlink_metadata(&host).is_ok() {
                return Ok(());
            }
            self.write_file(&host, b"", false)
                .map_err(|e| FsError::from_io("touch", path, e))
        });
        self.record(result)
    }

    fn unlink(&mut self, path: &str) -> FsResult<()> {
        let result = self
            .locate("unlink", path)
            .and_then(|host| fs::remove_file(host).map_err(|e| FsError::from_io("unlink", path, e)));
        self.record(result)
    }

    fn is_dir(&self, path: &str) -> bool {
        !path.is_empty() && self.host_path(path).is_dir()
    }

    fn is_file(&self, path: &str) -> bool {
        !path.is_empty() && self.host_path(path).is_file()
    }

    fn is_link(&self, path: &str) -> bool {
        !path.is_empty() && self.host_path(path).is_symlink()
    }

    fn is_readable(&self, path: &str) -> bool {
        !path.is_empty() && self.owner_mode(path).is_some_and(Mode::is_readable)
    }

    fn is_writable(&self, path: &str) -> bool {
        !path.is_empty() && self.owner_mode(path).is_some_and(Mode::is_writable)
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (TempDir, DiskFilesystem) {
        let dir = TempDir::new().unwrap();
        let fs = DiskFilesystem::new(dir.path());
        (dir, fs)
    }

    #[test]
    fn test_paths_stay_under_root() {
        let (dir, fs) = setup();
        let root = dunce::canonicalize(dir.path()).unwrap();
        assert_eq!(fs.host_path("/"), root);
        assert_eq!(fs.host_path("/../../etc/passwd"), root.join("etc/passwd"));
        assert_eq!(fs.host_path("a/./b/../c"), root.join("a/c"));
    }

    #[test]
    fn test_write_read_and_modes() {
        let (_dir, mut fs) = setup();
        fs.umask(Some(0o022));
        fs.file_put_contents("/f", b"disk", PutFlags::empty()).unwrap();
        assert_eq!(fs.file_get_contents("/f").unwrap(), b"disk");
        assert_eq!(fs.fileperms("/f").unwrap(), 0o644);

        fs.mkdir("/a/b", 0o700, true).unwrap();
        assert_eq!(fs.fileperms("/a/b").unwrap(), 0o700);
        assert_eq!(fs.fileperms("/a").unwrap(), 0o700);
    }

    #[test]
    fn test_virtual_cwd() {
        let (_dir, mut fs) = setup();
        fs.mkdir("/work", 0o777, false).unwrap();
        fs.chdir("/work").unwrap();
        fs.touch("rel").unwrap();
        assert!(fs.is_file("/work/rel"));
        assert_eq!(fs.getcwd(), "/work");

        let err = fs.chdir("/work/rel").unwrap_err();
        assert_eq!(err.diagnostic(), Some("chdir(): Not a directory"));
    }

    #[test]
    fn test_absolute_symlink_round_trip() {
        let (_dir, mut fs) = setup();
        fs.file_put_contents("/target", b"t", PutFlags::empty()).unwrap();
        fs.symlink("/target", "/link").unwrap();
        assert_eq!(fs.readlink("/link").unwrap(), "/target");
        assert_eq!(fs.file_get_contents("/link").unwrap(), b"t");

        fs.symlink("target", "/rel").unwrap();
        assert_eq!(fs.readlink("/rel").unwrap(), "target");
    }

    #[test]
    fn test_host_errors_carry_diagnostics() {
        let (_dir, mut fs) = setup();
        let err = fs.unlink("/missing").unwrap_err();
        assert_eq!(err.diagnostic(), Some("unlink(/missing): No such file or directory"));
        assert!(fs.last_error().is_some());

        fs.mkdir("/d", 0o777, false).unwrap();
        let err = fs.mkdir("/d", 0o777, false).unwrap_err();
        assert_eq!(err.diagnostic(), Some("mkdir(): File exists"));
    }
}
