//! Structural and semantic checks on binary and textual identifiers.

use crate::generator::{StdSystemTime, TimeSource};
use crate::{Error, Uuid, Version};

/// Checks that `bytes` holds a well-formed UUIDv4, UUIDv7, or UUIDv8.
///
/// The variant bits must read `10` and the version nibble must be 4, 7, or 8. Time-ordered
/// versions must carry a non-zero timestamp no later than the current system time, and every
/// version must have at least one random bit set.
///
/// # Examples
///
/// ```rust
/// use uuid478::{validate, Error};
///
/// assert_eq!(validate(uuid478::uuid7().as_bytes()), Ok(()));
/// assert_eq!(validate(&[0u8; 16]), Err(Error::InvalidVariant));
/// assert_eq!(validate(&[0u8; 15]), Err(Error::WrongByteLength(15)));
/// ```
pub fn validate(bytes: &[u8]) -> Result<(), Error> {
    validate_with(bytes, &StdSystemTime)
}

/// Checks that `src` is an 8-4-4-4-12 hexadecimal string of a well-formed identifier.
///
/// Text-level errors are reported as [`Error::MalformedText`] before any binary check runs.
///
/// # Examples
///
/// ```rust
/// use uuid478::{validate_str, Error, TextError};
///
/// assert_eq!(validate_str("01915146-80e1-741e-a983-6cbdd7c69015"), Ok(()));
/// assert_eq!(
///     validate_str("01915146_80e1-741e-a983-6cbdd7c69015"),
///     Err(Error::MalformedText(TextError::Character { position: 8, found: '_' }))
/// );
/// ```
pub fn validate_str(src: &str) -> Result<(), Error> {
    validate_str_with(src, &StdSystemTime)
}

/// Same as [`validate()`], judging future timestamps against `clock`.
pub fn validate_with<C: TimeSource + ?Sized>(bytes: &[u8], clock: &C) -> Result<(), Error> {
    let bytes: &[u8; 16] = bytes
        .try_into()
        .map_err(|_| Error::WrongByteLength(bytes.len()))?;
    check(&Uuid::from(*bytes), clock)
}

/// Same as [`validate_str()`], judging future timestamps against `clock`.
pub fn validate_str_with<C: TimeSource + ?Sized>(src: &str, clock: &C) -> Result<(), Error> {
    check(&Uuid::decode_text(src)?, clock)
}

fn check<C: TimeSource + ?Sized>(uuid: &Uuid, clock: &C) -> Result<(), Error> {
    if uuid.variant_bits() != 0b10 {
        return Err(Error::InvalidVariant);
    }

    let version = uuid.checked_version()?;
    let bytes = uuid.as_bytes();
    match version {
        Version::V4 => {
            let mut scratch = *bytes;
            scratch[6] &= 0x0f;
            scratch[8] &= 0x3f;
            if u128::from_be_bytes(scratch) == 0 {
                return Err(Error::ZeroRandomField { version });
            }
        }
        Version::V7 => {
            let timestamp = uuid.unix_ts_ms();
            if timestamp == 0 {
                return Err(Error::ZeroTimestamp { version });
            }
            if timestamp > clock.now().as_millis() as u64 {
                return Err(Error::FutureTimestamp { version, timestamp });
            }
            if low_field(bytes) == 0 {
                return Err(Error::ZeroRandomField { version });
            }
        }
        Version::V8 => {
            let timestamp = uuid.unix_ts_nanos();
            if timestamp > clock.now().as_nanos() as u64 {
                return Err(Error::FutureTimestamp { version, timestamp });
            }
            if low_field(bytes) == 0 {
                return Err(Error::ZeroRandomField { version });
            }
        }
    }
    Ok(())
}

/// Returns bytes 8-15 with the variant bits cleared.
fn low_field(bytes: &[u8; 16]) -> u64 {
    let mut low = [0u8; 8];
    low.copy_from_slice(&bytes[8..]);
    low[0] &= 0x3f;
    u64::from_be_bytes(low)
}

impl Uuid {
    /// Creates an object from 16 bytes after checking them with [`validate()`].
    pub fn parse_bytes(bytes: &[u8]) -> Result<Self, Error> {
        validate(bytes)?;
        let mut dst = [0u8; 16];
        dst.copy_from_slice(bytes);
        Ok(Self::from(dst))
    }

    /// Creates an object from the 8-4-4-4-12 hexadecimal string after checking it with
    /// [`validate()`].
    ///
    /// Unlike [`str::parse()`], which only decodes the text, this rejects identifiers that
    /// this crate would never produce.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uuid478::{Error, Uuid};
    ///
    /// let e = Uuid::parse_str("01915146-80e1-741e-a983-6cbdd7c69015")?;
    /// assert_eq!(e.unix_ts_ms(), 0x0191_5146_80e1);
    ///
    /// assert!("00000000-0000-0000-0000-000000000000".parse::<Uuid>().is_ok());
    /// assert_eq!(
    ///     Uuid::parse_str("00000000-0000-0000-0000-000000000000"),
    ///     Err(Error::InvalidVariant)
    /// );
    /// # Ok::<(), Error>(())
    /// ```
    pub fn parse_str(src: &str) -> Result<Self, Error> {
        let uuid = Self::decode_text(src)?;
        check(&uuid, &StdSystemTime)?;
        Ok(uuid)
    }

    /// Same as [`Uuid::parse_bytes()`] but returns [`Uuid::NIL`] on any failure.
    pub fn from_bytes_or_nil(bytes: &[u8]) -> Self {
        Self::parse_bytes(bytes).unwrap_or(Self::NIL)
    }

    /// Same as [`Uuid::parse_str()`] but returns [`Uuid::NIL`] on any failure.
    pub fn from_str_or_nil(src: &str) -> Self {
        Self::parse_str(src).unwrap_or(Self::NIL)
    }
}
