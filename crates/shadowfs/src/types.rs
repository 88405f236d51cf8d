//! Value types shared by every backend.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::mode::Mode;

/// File type enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }

    /// Returns true if this is a symbolic link.
    pub fn is_symlink(&self) -> bool {
        matches!(self, FileType::Symlink)
    }
}

/// What `metadata()` reports about a node, without following a final link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Node type.
    pub kind: FileType,
    /// Permission bits of the node itself.
    pub mode: Mode,
    /// Content length for files, target length for links, 0 for directories.
    pub size: u64,
}

impl Metadata {
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }

    pub fn is_symlink(&self) -> bool {
        self.kind.is_symlink()
    }
}

/// Ordering applied by `scandir()`.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ScandirOrder {
    /// Byte-wise ascending.
    #[default]
    Ascending,
    /// Byte-wise descending.
    Descending,
    /// `.` and `..` first, then insertion order.
    Unsorted,
}

bitflags! {
    /// Options for `file_put_contents()`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct PutFlags: u32 {
        /// Append to existing contents instead of replacing them.
        const APPEND = 8;
    }
}

bitflags! {
    /// Options for `file()`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LineFlags: u32 {
        /// Strip the trailing `\n` from every line.
        const IGNORE_NEW_LINES = 2;
        /// Drop lines that are empty (after newline stripping).
        const SKIP_EMPTY_LINES = 4;
    }
}
