//! # shadowfs-glob
//!
//! Shell-glob expansion for path-based filesystems.
//!
//! - [`compile`] / [`compile_segment`] turn glob syntax into anchored
//!   per-segment matchers (`*`, `?`, `[...]`, `[!...]`, `\x`, `{a,b}`).
//! - [`glob`] walks any [`WalkerFs`] depth-first, intersecting the
//!   matchers segment by segment.
//!
//! ```
//! use shadowfs_glob::{GlobFlags, compile_segment};
//!
//! let m = compile_segment("*.{rs,toml}", GlobFlags::BRACE).unwrap();
//! assert!(m.is_match("lib.rs"));
//! assert!(m.is_match("Cargo.toml"));
//! assert!(!m.is_match("README.md"));
//! ```

mod error;
mod flags;
mod pattern;
mod walker;

pub use error::{GlobError, WalkerError};
pub use flags::GlobFlags;
pub use pattern::{SegmentMatcher, compile, compile_segment};
pub use walker::{WalkerFs, glob};
