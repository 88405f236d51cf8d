//! Permission bits.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Unix permission bits, always masked to `0o777`.
///
/// Only the owner bits take part in access checks: there is no notion of
/// users or groups, so `0o400` decides readability and `0o200` writability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "u32", into = "u32")]
pub struct Mode(u32);

impl Mode {
    pub const MASK: u32 = 0o777;
    pub const OWNER_READ: u32 = 0o400;
    pub const OWNER_WRITE: u32 = 0o200;
    pub const OWNER_EXECUTE: u32 = 0o100;

    pub const fn new(bits: u32) -> Self {
        Self(bits & Self::MASK)
    }

    /// `bits` with every bit set in `umask` cleared.
    pub const fn masked(bits: u32, umask: u32) -> Self {
        Self::new(bits & !umask)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_readable(self) -> bool {
        self.0 & Self::OWNER_READ != 0
    }

    pub const fn is_writable(self) -> bool {
        self.0 & Self::OWNER_WRITE != 0
    }

    pub const fn is_executable(self) -> bool {
        self.0 & Self::OWNER_EXECUTE != 0
    }
}

impl From<u32> for Mode {
    fn from(bits: u32) -> Self {
        Self::new(bits)
    }
}

impl From<Mode> for u32 {
    fn from(mode: Mode) -> Self {
        mode.0
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04o}", self.0)
    }
}
