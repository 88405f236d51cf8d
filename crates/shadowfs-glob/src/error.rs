//! Glob error types.

use thiserror::Error;

/// Error raised while compiling or expanding a glob pattern.
#[derive(Debug, Clone, Error)]
pub enum GlobError {
    /// The pattern produced a matcher the regex engine rejects.
    #[error("invalid pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },

    /// A directory could not be read and `GlobFlags::ERR` was set.
    #[error("directory not readable: {path}")]
    Unreadable { path: String },
}

/// Error reported by a [`WalkerFs`](crate::WalkerFs) listing.
#[derive(Debug, Clone, Error)]
pub enum WalkerError {
    /// Path does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Path exists but is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(String),

    /// Directory exists but may not be listed.
    #[error("permission denied: {0}")]
    PermissionDenied(String),
}
