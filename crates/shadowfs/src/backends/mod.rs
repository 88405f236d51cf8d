//! Filesystem backends.

mod memory;
#[cfg(unix)]
mod disk;

pub use memory::MemoryFilesystem;
#[cfg(unix)]
pub use disk::DiskFilesystem;
