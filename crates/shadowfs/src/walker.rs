//! Glob walker adapters.
//!
//! Bridges the node tree (and the host adapter) to `shadowfs_glob`'s
//! `WalkerFs` trait so both backends share one glob implementation.

use shadowfs_glob::{WalkerError, WalkerFs};

use crate::tree::Tree;

impl WalkerFs for Tree {
    fn list_dir(&self, path: &str) -> Result<Vec<String>, WalkerError> {
        let id = self
            .resolve(path)
            .ok_or_else(|| WalkerError::NotFound(path.to_string()))?;
        let dir = self
            .directory(id)
            .ok_or_else(|| WalkerError::NotADirectory(path.to_string()))?;
        if !self.is_readable(id) {
            return Err(WalkerError::PermissionDenied(path.to_string()));
        }
        Ok(dir.names().map(str::to_string).collect())
    }

    fn is_dir(&self, path: &str) -> bool {
        self.resolve(path).is_some_and(|id| Tree::is_dir(self, id))
    }
}

#[cfg(unix)]
mod disk {
    use std::fs;
    use std::io;

    use shadowfs_glob::{WalkerError, WalkerFs};

    use crate::backends::DiskFilesystem;

    impl WalkerFs for DiskFilesystem {
        fn list_dir(&self, path: &str) -> Result<Vec<String>, WalkerError> {
            let entries = fs::read_dir(self.host_path(path)).map_err(|e| match e.kind() {
                io::ErrorKind::PermissionDenied => WalkerError::PermissionDenied(path.to_string()),
                io::ErrorKind::NotADirectory => WalkerError::NotADirectory(path.to_string()),
                _ => WalkerError::NotFound(path.to_string()),
            })?;
            Ok(entries
                .filter_map(Result::ok)
                .map(|entry| entry.file_name().to_string_lossy().into_owned())
                .collect())
        }

        fn is_dir(&self, path: &str) -> bool {
            self.host_path(path).is_dir()
        }
    }
}

#[cfg(test)]
mod tests {
    use shadowfs_glob::{GlobFlags, glob};

    use crate::{Filesystem, FsErrorKind, MemoryFilesystem, PutFlags};

    fn populated() -> MemoryFilesystem {
        let mut fs = MemoryFilesystem::new();
        fs.mkdir("/demo/sub", 0o777, true).unwrap();
        fs.file_put_contents("/demo/file.txt", b"", PutFlags::empty()).unwrap();
        fs.file_put_contents("/demo/file2.txt", b"", PutFlags::empty()).unwrap();
        fs.symlink("/demo/sub", "/demo/linked").unwrap();
        fs
    }

    #[test]
    fn test_tree_walk() {
        let fs = populated();
        let found = glob(fs.tree(), "/", "/demo/*2*", GlobFlags::empty()).unwrap();
        assert_eq!(found, vec!["/demo/file2.txt"]);
    }

    #[test]
    fn test_links_to_directories_are_walked() {
        let mut fs = populated();
        fs.touch("/demo/sub/inner").unwrap();
        let found = fs.glob("/demo/*/inner", GlobFlags::empty()).unwrap();
        assert_eq!(found, vec!["/demo/linked/inner", "/demo/sub/inner"]);

        let found = fs.glob("/demo/*", GlobFlags::ONLYDIR | GlobFlags::MARK).unwrap();
        assert_eq!(found, vec!["/demo/linked/", "/demo/sub/"]);
    }

    #[test]
    fn test_unreadable_directory() {
        let mut fs = populated();
        fs.touch("/demo/sub/inner").unwrap();
        fs.chmod("/demo/sub", 0o300).unwrap();

        let found = fs.glob("/demo/sub/*", GlobFlags::empty()).unwrap();
        assert!(found.is_empty());

        let err = fs.glob("/demo/sub/*", GlobFlags::ERR).unwrap_err();
        assert_eq!(err.kind(), FsErrorKind::PermissionDenied);
        assert_eq!(fs.last_error(), Some("Directory /demo/sub is not readable"));
    }
}
