use std::fmt;

use crate::Error;

/// Version tag of the identifiers this crate produces and accepts.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug)]
#[repr(u8)]
pub enum Version {
    /// Fully random (UUIDv4).
    V4 = 4,

    /// Unix milliseconds, sub-millisecond sequence, and monotonic counter (UUIDv7).
    V7 = 7,

    /// Unix nanoseconds followed by fast pseudo-random bits (UUIDv8).
    V8 = 8,
}

impl Version {
    /// Returns the 4-bit number stored in the version nibble.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Returns the version for a nibble value, or `None` if it is not 4, 7, or 8.
    pub const fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            4 => Some(Self::V4),
            7 => Some(Self::V7),
            8 => Some(Self::V8),
            _ => None,
        }
    }
}

impl Default for Version {
    fn default() -> Self {
        Self::V7
    }
}

impl TryFrom<u8> for Version {
    type Error = Error;

    fn try_from(src: u8) -> Result<Self, Self::Error> {
        Self::from_nibble(src).ok_or(Error::UnsupportedVersion(src))
    }
}

impl From<Version> for u8 {
    fn from(src: Version) -> Self {
        src.as_u8()
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.as_u8())
    }
}
