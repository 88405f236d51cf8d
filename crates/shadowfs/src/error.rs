//! Filesystem error types.
//!
//! Every failure carries two views of the same problem:
//!
//! - a machine-checkable [`FsErrorKind`] plus a free-text `message`
//!   (what `last_error()` reports), and
//! - for operations that model a host OS call, a `diagnostic` holding the
//!   exact text the host would print (`"mkdir(): File exists"`). The
//!   diagnostic is also emitted as a `tracing` warning when the error is
//!   recorded, so code that watches the warning channel behaves the same
//!   against the emulator and the real OS.

use std::io;

use serde::{Deserialize, Serialize};
use shadowfs_glob::GlobError;
use strum::{Display, EnumString};
use thiserror::Error;

/// Broad category of a filesystem failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FsErrorKind {
    /// Path does not resolve.
    NotFound,
    /// Expected a file and got a directory, or the reverse.
    WrongType,
    /// Missing read or write bit.
    PermissionDenied,
    /// Create-if-absent conflict.
    AlreadyExists,
    /// `rmdir` on a populated directory.
    NotEmpty,
    /// Argument makes no sense for the target (e.g. `readlink` on a file).
    InvalidArgument,
    /// Glob pattern could not be compiled.
    InvalidPattern,
    /// Any other host I/O failure.
    Io,
}

/// Filesystem error.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FsError {
    kind: FsErrorKind,
    message: String,
    diagnostic: Option<String>,
}

impl FsError {
    /// Create an error of the given kind.
    pub fn new(kind: FsErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            diagnostic: None,
        }
    }

    /// Create a NotFound error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(FsErrorKind::NotFound, message)
    }

    /// Create a WrongType error.
    pub fn wrong_type(message: impl Into<String>) -> Self {
        Self::new(FsErrorKind::WrongType, message)
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::new(FsErrorKind::PermissionDenied, message)
    }

    /// Create an AlreadyExists error.
    pub fn already_exists(message: impl Into<String>) -> Self {
        Self::new(FsErrorKind::AlreadyExists, message)
    }

    /// Create a NotEmpty error.
    pub fn not_empty(message: impl Into<String>) -> Self {
        Self::new(FsErrorKind::NotEmpty, message)
    }

    /// Create an InvalidArgument error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(FsErrorKind::InvalidArgument, message)
    }

    /// Create an InvalidPattern error.
    pub fn invalid_pattern(message: impl Into<String>) -> Self {
        Self::new(FsErrorKind::InvalidPattern, message)
    }

    /// Attach the host-style diagnostic for `call` failing on `path`.
    ///
    /// `rmdir` and `unlink` name the path (`"rmdir(/a): Directory not empty"`),
    /// every other call leaves the parentheses empty.
    pub fn with_diagnostic(mut self, call: &str, path: &str, reason: &str) -> Self {
        self.diagnostic = Some(os_call_message(call, path, reason));
        self
    }

    /// Build an error from a host I/O failure of `call` on `path`.
    pub fn from_io(call: &str, path: &str, err: io::Error) -> Self {
        let (kind, reason) = match err.kind() {
            io::ErrorKind::NotFound => (FsErrorKind::NotFound, "No such file or directory"),
            io::ErrorKind::AlreadyExists => (FsErrorKind::AlreadyExists, "File exists"),
            io::ErrorKind::PermissionDenied => (FsErrorKind::PermissionDenied, "Permission denied"),
            io::ErrorKind::NotADirectory => (FsErrorKind::WrongType, "Not a directory"),
            io::ErrorKind::IsADirectory => (FsErrorKind::WrongType, "Is a directory"),
            io::ErrorKind::DirectoryNotEmpty => (FsErrorKind::NotEmpty, "Directory not empty"),
            io::ErrorKind::InvalidInput => (FsErrorKind::InvalidArgument, "Invalid argument"),
            _ => (FsErrorKind::Io, ""),
        };

        let reason = match (kind, call, err.raw_os_error()) {
            (FsErrorKind::Io, _, _) => err.to_string(),
            (_, "chdir", Some(errno)) => format!("{reason} (errno {errno})"),
            _ => reason.to_string(),
        };

        Self::new(kind, format!("{call} {path}: {err}")).with_diagnostic(call, path, &reason)
    }

    /// Error category.
    pub fn kind(&self) -> FsErrorKind {
        self.kind
    }

    /// Free-text description (the `last_error()` value).
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Host-style warning text, for operations that model an OS call.
    pub fn diagnostic(&self) -> Option<&str> {
        self.diagnostic.as_deref()
    }

    /// Emit the diagnostic on the warning channel.
    pub(crate) fn emit(&self) {
        match &self.diagnostic {
            Some(diagnostic) => {
                tracing::warn!(target: "shadowfs::diagnostic", kind = %self.kind, "{diagnostic}")
            }
            None => tracing::debug!(kind = %self.kind, message = %self.message, "operation failed"),
        }
    }
}

fn os_call_message(call: &str, path: &str, reason: &str) -> String {
    if matches!(call, "rmdir" | "unlink") {
        format!("{call}({path}): {reason}")
    } else {
        format!("{call}(): {reason}")
    }
}

impl From<GlobError> for FsError {
    fn from(e: GlobError) -> Self {
        let message = e.to_string();
        match e {
            GlobError::InvalidPattern { .. } => FsError::invalid_pattern(message),
            GlobError::Unreadable { path } => {
                FsError::permission_denied(format!("Directory {path} is not readable"))
            }
        }
    }
}

/// Convert FsError to std::io::Error for compatibility.
impl From<FsError> for io::Error {
    fn from(e: FsError) -> Self {
        let kind = match e.kind {
            FsErrorKind::NotFound => io::ErrorKind::NotFound,
            FsErrorKind::WrongType => io::ErrorKind::InvalidInput,
            FsErrorKind::PermissionDenied => io::ErrorKind::PermissionDenied,
            FsErrorKind::AlreadyExists => io::ErrorKind::AlreadyExists,
            FsErrorKind::NotEmpty => io::ErrorKind::DirectoryNotEmpty,
            FsErrorKind::InvalidArgument | FsErrorKind::InvalidPattern => {
                io::ErrorKind::InvalidInput
            }
            FsErrorKind::Io => io::ErrorKind::Other,
        };
        io::Error::new(kind, e.message)
    }
}

/// Filesystem result type.
pub type FsResult<T> = Result<T, FsError>;
