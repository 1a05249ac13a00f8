use thiserror::Error;

use crate::Version;

/// Error returned by the decoding, validation, ordering, and configuration functions.
#[derive(Error, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Error {
    /// The string is not an 8-4-4-4-12 hexadecimal representation.
    #[error("malformed uuid string: {0}")]
    MalformedText(#[from] TextError),

    /// The binary input is not exactly 16 bytes long.
    #[error("expected 16 bytes, got {0}")]
    WrongByteLength(usize),

    /// The top two bits of byte 8 do not read `10`.
    #[error("invalid variant bits")]
    InvalidVariant,

    /// The version nibble (or a requested default version) is not 4, 7, or 8.
    #[error("unsupported uuid version {0}; must be 4, 7, or 8")]
    UnsupportedVersion(u8),

    /// The reconstructed timestamp lies after the current wall-clock time.
    #[error("uuid {version} has a future timestamp ({timestamp})")]
    FutureTimestamp {
        /// Version of the rejected identifier.
        version: Version,
        /// Reconstructed timestamp (milliseconds for v7, nanoseconds for v8).
        timestamp: u64,
    },

    /// The timestamp field is zero.
    #[error("uuid {version} has a zero timestamp")]
    ZeroTimestamp {
        /// Version of the rejected identifier.
        version: Version,
    },

    /// Every random bit of the identifier is zero.
    #[error("uuid {version} should have non-zero random bits")]
    ZeroRandomField {
        /// Version of the rejected identifier.
        version: Version,
    },

    /// Time order was requested between identifiers of different versions.
    #[error("cannot compare uuid {left} with uuid {right}")]
    VersionMismatch {
        /// Version of the left-hand identifier.
        left: Version,
        /// Version of the right-hand identifier.
        right: Version,
    },

    /// Time order was requested on the fully random variant.
    #[error("uuid version is not time ordered")]
    NotTimeOrdered,
}

/// Rule of the textual representation violated by a malformed string.
///
/// Positions are byte offsets into the input.
#[derive(Error, Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum TextError {
    /// A character that is neither alphanumeric nor a hyphen.
    #[error("unexpected character {found:?} at {position}; only alphanumerics and hyphens allowed")]
    Character {
        /// Byte offset of the character.
        position: usize,
        /// The offending character.
        found: char,
    },

    /// A hyphen outside offsets 8, 13, 18, and 23.
    #[error("hyphen at {position}; hyphens belong at 8, 13, 18, and 23")]
    HyphenPlacement {
        /// Byte offset of the hyphen.
        position: usize,
    },

    /// Fewer than four hyphens.
    #[error("{found} of 4 hyphens present")]
    MissingHyphens {
        /// Number of hyphens present.
        found: usize,
    },

    /// Not exactly 32 digits.
    #[error("{digits} digits present; expected 32")]
    Length {
        /// Number of alphanumeric characters present.
        digits: usize,
    },

    /// An alphanumeric that is not a hexadecimal digit.
    #[error("invalid hexadecimal digit at {position}")]
    Hex {
        /// Byte offset of the digit.
        position: usize,
    },
}
