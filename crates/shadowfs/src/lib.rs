//! In-memory, permission-aware filesystem double.
//!
//! Key components:
//!
//! - [`Filesystem`] - the operation set, modelled on the host's path-based
//!   file functions
//! - [`MemoryFilesystem`] - a node tree held entirely in memory, with
//!   permission checks, a umask, symbolic links and a working directory
//! - [`DiskFilesystem`] - the same operations on a real directory, for
//!   running one test suite against both
//! - [`Tree`] - node arena and path resolver behind the memory backend
//!
//! ## Design Decisions
//!
//! - **Arena tree**: nodes live in a slab and refer to their parent by
//!   handle, so `..`, `path_of` and subtree removal need no shared
//!   ownership.
//! - **Links resolved on demand**: a link stores its target text only;
//!   its type and contents are looked up through the tree at query time.
//! - **Two error channels**: failures return [`FsError`] and set
//!   `last_error()`; calls that model a host OS function also log a
//!   host-style diagnostic on the `shadowfs::diagnostic` warning target.
//!
//! ```
//! use shadowfs::{Filesystem, MemoryFilesystem, PutFlags};
//!
//! let mut fs = MemoryFilesystem::new();
//! fs.mkdir("/tmp/work", 0o777, true)?;
//! fs.file_put_contents("/tmp/work/notes.txt", b"hello", PutFlags::empty())?;
//! assert_eq!(fs.file_get_contents("/tmp/work/notes.txt")?, b"hello");
//! # Ok::<(), shadowfs::FsError>(())
//! ```

pub mod backends;
mod config;
mod error;
mod lines;
mod mode;
mod node;
mod ops;
pub mod path;
mod tree;
mod types;
mod walker;

#[cfg(unix)]
pub use backends::DiskFilesystem;
pub use backends::MemoryFilesystem;
pub use config::FsConfig;
pub use error::{FsError, FsErrorKind, FsResult};
pub use lines::split_lines;
pub use mode::Mode;
pub use node::{Directory, Node, NodeId, NodeKind, RegularFile, SymbolicLink};
pub use ops::Filesystem;
pub use shadowfs_glob::GlobFlags;
pub use tree::{DEFAULT_SYMLINK_LIMIT, Tree};
pub use types::{FileType, LineFlags, Metadata, PutFlags, ScandirOrder};
