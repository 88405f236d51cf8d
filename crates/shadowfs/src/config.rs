//! Filesystem configuration.
//!
//! Configuration can be built in code with the `with_*` builders or loaded
//! from TOML:
//!
//! ```toml
//! umask = 0o022
//! root_mode = 0o755
//! working_directory = "/home/test"
//! symlink_limit = 40
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{FsError, FsResult};
use crate::tree::DEFAULT_SYMLINK_LIMIT;

/// Initial state for a [`MemoryFilesystem`](crate::MemoryFilesystem) or
/// [`DiskFilesystem`](crate::DiskFilesystem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FsConfig {
    /// Bits cleared from the mode of every newly created node.
    pub umask: u32,
    /// Mode of the root directory.
    pub root_mode: u32,
    /// Initial working directory, created (with parents) if missing.
    pub working_directory: String,
    /// Maximum link hops taken while resolving one path.
    pub symlink_limit: usize,
}

impl Default for FsConfig {
    fn default() -> Self {
        Self {
            umask: 0,
            root_mode: 0o755,
            working_directory: "/".to_string(),
            symlink_limit: DEFAULT_SYMLINK_LIMIT,
        }
    }
}

impl FsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> FsResult<Self> {
        let config: Self = toml::from_str(source)
            .map_err(|e| FsError::invalid_argument(format!("invalid filesystem config: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> FsResult<()> {
        if !self.working_directory.starts_with('/') {
            return Err(FsError::invalid_argument(format!(
                "working_directory must be absolute, got {:?}",
                self.working_directory
            )));
        }
        Ok(())
    }

    pub fn with_umask(mut self, umask: u32) -> Self {
        self.umask = umask;
        self
    }

    pub fn with_root_mode(mut self, mode: u32) -> Self {
        self.root_mode = mode;
        self
    }

    pub fn with_working_directory(mut self, path: impl Into<String>) -> Self {
        self.working_directory = path.into();
        self
    }

    pub fn with_symlink_limit(mut self, limit: usize) -> Self {
        self.symlink_limit = limit;
        self
    }
}
