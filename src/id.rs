use std::{cmp, fmt, str, time};

use fstr::FStr;

use crate::{Error, TextError, Version};

/// Represents a Universally Unique IDentifier.
///
/// The derived [`Ord`] compares raw bytes. Use [`Uuid::cmp_time()`] to order time-ordered
/// identifiers by their timestamp, sequence, and counter fields.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Uuid([u8; 16]);

/// The variant field of a UUID, read from the top bits of byte 8.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Variant {
    /// `0xx`: reserved, NCS backward compatibility.
    Var0,
    /// `10x`: the variant every identifier of this crate carries.
    Var10,
    /// `110`: reserved, Microsoft backward compatibility.
    Var110,
    /// `111`: reserved for future definition.
    VarReserved,
}

impl Uuid {
    /// Nil UUID (00000000-0000-0000-0000-000000000000)
    pub const NIL: Self = Self([0x00; 16]);

    /// Max UUID (ffffffff-ffff-ffff-ffff-ffffffffffff)
    pub const MAX: Self = Self([0xff; 16]);

    /// Returns a reference to the underlying byte array.
    pub const fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }

    /// Creates a UUIDv7 from its millisecond timestamp, 12-bit sequence, and 62-bit random field.
    ///
    /// The low 16 bits of `rand_b` hold the monotonic counter.
    ///
    /// # Panics
    ///
    /// Panics if any argument exceeds its field width.
    pub const fn from_fields_v7(unix_ts_ms: u64, sequence: u16, rand_b: u64) -> Self {
        if unix_ts_ms >= 1 << 48 || sequence >= 1 << 12 || rand_b >= 1 << 62 {
            panic!("invalid field value");
        }

        Self([
            (unix_ts_ms >> 40) as u8,
            (unix_ts_ms >> 32) as u8,
            (unix_ts_ms >> 24) as u8,
            (unix_ts_ms >> 16) as u8,
            (unix_ts_ms >> 8) as u8,
            unix_ts_ms as u8,
            0x70 | (sequence >> 8) as u8,
            sequence as u8,
            0x80 | (rand_b >> 56) as u8,
            (rand_b >> 48) as u8,
            (rand_b >> 40) as u8,
            (rand_b >> 32) as u8,
            (rand_b >> 24) as u8,
            (rand_b >> 16) as u8,
            (rand_b >> 8) as u8,
            rand_b as u8,
        ])
    }

    /// Creates a UUIDv8 from a Unix timestamp in nanoseconds and 64 random bits.
    ///
    /// The version nibble overwrites bits 12-15 of the timestamp and the variant overwrites the
    /// top two bits of `rand`.
    pub const fn from_fields_v8(unix_ts_nanos: u64, rand: u64) -> Self {
        let ts = unix_ts_nanos.to_be_bytes();
        let r = rand.to_be_bytes();
        Self([
            ts[0],
            ts[1],
            ts[2],
            ts[3],
            ts[4],
            ts[5],
            0x80 | (ts[6] & 0x0f),
            ts[7],
            0x80 | (r[0] & 0x3f),
            r[1],
            r[2],
            r[3],
            r[4],
            r[5],
            r[6],
            r[7],
        ])
    }

    /// Creates a UUIDv4 from 16 random bytes, stamping the version and variant bits.
    pub const fn from_random_v4(mut bytes: [u8; 16]) -> Self {
        bytes[6] = 0x40 | (bytes[6] & 0x0f);
        bytes[8] = 0x80 | (bytes[8] & 0x3f);
        Self(bytes)
    }

    /// Returns the 8-4-4-4-12 hexadecimal string representation stored in a stack-allocated
    /// structure that can be dereferenced as `str` and [`Display`](fmt::Display)ed.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uuid478::Uuid;
    ///
    /// let x = "01915146-80E1-741E-A983-6CBDD7C69015".parse::<Uuid>()?;
    /// let y = x.encode();
    /// assert_eq!(&*y, "01915146-80e1-741e-a983-6cbdd7c69015");
    /// assert_eq!(format!("{}", y), "01915146-80e1-741e-a983-6cbdd7c69015");
    /// # Ok::<(), uuid478::Error>(())
    /// ```
    pub fn encode(&self) -> FStr<36> {
        const DIGITS: &[u8; 16] = b"0123456789abcdef";

        let mut buffer = [0u8; 36];
        let mut j = 0;
        for (i, e) in self.0.iter().enumerate() {
            buffer[j] = DIGITS[(e >> 4) as usize];
            buffer[j + 1] = DIGITS[(e & 15) as usize];
            j += 2;
            if i == 3 || i == 5 || i == 7 || i == 9 {
                buffer[j] = b'-';
                j += 1;
            }
        }
        debug_assert!(buffer.is_ascii());
        // SAFETY: the buffer holds ASCII hex digits and hyphens only
        unsafe { FStr::from_inner_unchecked(buffer) }
    }

    /// Decodes the 8-4-4-4-12 hexadecimal string representation without judging the content.
    ///
    /// Checks, in this order: every character is alphanumeric or a hyphen, hyphens sit only at
    /// byte offsets 8, 13, 18, and 23, exactly 32 digits are present, all four hyphens are
    /// present, and every digit is hexadecimal. Upper-case digits are accepted.
    pub fn decode_text(src: &str) -> Result<Self, Error> {
        let mut digits = [(0usize, '\0'); 32];
        let mut n_digits = 0;
        let mut n_hyphens = 0;
        for (position, c) in src.char_indices() {
            if c == '-' {
                if !matches!(position, 8 | 13 | 18 | 23) {
                    return Err(TextError::HyphenPlacement { position }.into());
                }
                n_hyphens += 1;
            } else if c.is_alphanumeric() {
                if let Some(slot) = digits.get_mut(n_digits) {
                    *slot = (position, c);
                }
                n_digits += 1;
            } else {
                return Err(TextError::Character { position, found: c }.into());
            }
        }

        if n_digits != 32 {
            return Err(TextError::Length { digits: n_digits }.into());
        }
        if n_hyphens != 4 {
            return Err(TextError::MissingHyphens { found: n_hyphens }.into());
        }

        let mut dst = [0u8; 16];
        for (e, pair) in dst.iter_mut().zip(digits.chunks_exact(2)) {
            let mut byte = 0u8;
            for &(position, c) in pair {
                let digit = c.to_digit(16).ok_or(TextError::Hex { position })?;
                byte = (byte << 4) | digit as u8;
            }
            *e = byte;
        }
        Ok(Self(dst))
    }

    /// Returns the raw 4-bit version nibble (the top nibble of byte 6).
    pub const fn version_nibble(&self) -> u8 {
        self.0[6] >> 4
    }

    /// Returns the version if the version nibble reads 4, 7, or 8.
    pub const fn version(&self) -> Option<Version> {
        Version::from_nibble(self.version_nibble())
    }

    /// Returns the top two bits of byte 8; `0b10` for every identifier this crate produces.
    pub const fn variant_bits(&self) -> u8 {
        self.0[8] >> 6
    }

    /// Returns the variant field value.
    pub const fn variant(&self) -> Variant {
        match self.0[8] >> 5 {
            0b000..=0b011 => Variant::Var0,
            0b100 | 0b101 => Variant::Var10,
            0b110 => Variant::Var110,
            _ => Variant::VarReserved,
        }
    }

    /// Returns the 48-bit timestamp field stored in bytes 0-5.
    pub fn timestamp_field(&self) -> u64 {
        let mut head = [0u8; 8];
        head.copy_from_slice(&self.0[..8]);
        u64::from_be_bytes(right_align_timestamp(head))
    }

    /// Returns the Unix timestamp in milliseconds, interpreting the identifier as UUIDv7.
    pub fn unix_ts_ms(&self) -> u64 {
        self.timestamp_field()
    }

    /// Returns the Unix timestamp in nanoseconds, interpreting the identifier as UUIDv8.
    ///
    /// Bits 12-15 lie under the version nibble and read as zero.
    pub fn unix_ts_nanos(&self) -> u64 {
        (self.timestamp_field() << 16) | self.low_12_bits() as u64
    }

    /// Returns the 12-bit sub-millisecond sequence, interpreting the identifier as UUIDv7.
    pub const fn sequence(&self) -> u16 {
        self.low_12_bits()
    }

    /// Returns the low 16 bits, which hold the monotonic counter of a UUIDv7.
    pub const fn counter(&self) -> u16 {
        u16::from_be_bytes([self.0[14], self.0[15]])
    }

    const fn low_12_bits(&self) -> u16 {
        (((self.0[6] & 0x0f) as u16) << 8) | self.0[7] as u16
    }

    /// Returns the version, or [`Error::UnsupportedVersion`] if the nibble is not 4, 7, or 8.
    pub(crate) fn checked_version(&self) -> Result<Version, Error> {
        self.version()
            .ok_or(Error::UnsupportedVersion(self.version_nibble()))
    }

    /// Returns the time at which a time-ordered identifier was created.
    ///
    /// UUIDv7 carries millisecond precision. UUIDv8 carries the nanoseconds reported by the host
    /// clock less the four bits hidden under the version nibble.
    pub fn creation_time(&self) -> Result<time::SystemTime, Error> {
        let since_epoch = match self.checked_version()? {
            Version::V4 => return Err(Error::NotTimeOrdered),
            Version::V7 => time::Duration::from_millis(self.unix_ts_ms()),
            Version::V8 => time::Duration::from_nanos(self.unix_ts_nanos()),
        };
        Ok(time::UNIX_EPOCH + since_epoch)
    }

    /// Compares two time-ordered identifiers of the same version by creation order.
    ///
    /// UUIDv7 compares the millisecond, then the sequence, then the counter. UUIDv8 compares the
    /// nanosecond timestamp.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uuid478::{Error, Uuid};
    ///
    /// let a: Uuid = "01915146-80e1-741e-a983-6cbdd7c69015".parse()?;
    /// let b: Uuid = "01915146-80e1-741e-9c21-09f3aa11c0de".parse()?;
    /// assert!(b.after(&a)?);
    ///
    /// let v4: Uuid = "2ca4b2ce-6c13-40d4-bccf-37d222820f6f".parse()?;
    /// assert!(matches!(v4.after(&a), Err(Error::VersionMismatch { .. })));
    /// # Ok::<(), uuid478::Error>(())
    /// ```
    pub fn cmp_time(&self, other: &Self) -> Result<cmp::Ordering, Error> {
        let (left, right) = (self.checked_version()?, other.checked_version()?);
        if left != right {
            return Err(Error::VersionMismatch { left, right });
        }

        match left {
            Version::V4 => Err(Error::NotTimeOrdered),
            Version::V7 => Ok(self.v7_order_key().cmp(&other.v7_order_key())),
            Version::V8 => Ok(self.unix_ts_nanos().cmp(&other.unix_ts_nanos())),
        }
    }

    /// Returns true if `self` was created after `other`.
    pub fn after(&self, other: &Self) -> Result<bool, Error> {
        Ok(self.cmp_time(other)? == cmp::Ordering::Greater)
    }

    /// Returns true if `self` was created before `other`.
    pub fn before(&self, other: &Self) -> Result<bool, Error> {
        Ok(self.cmp_time(other)? == cmp::Ordering::Less)
    }

    fn v7_order_key(&self) -> (u64, u16, u16) {
        (self.unix_ts_ms(), self.sequence(), self.counter())
    }
}

/// Moves the 48-bit timestamp packed into bytes 0-5 down to bytes 2-7, zeroing bytes 0-1, so the
/// buffer reads as a big-endian `u64`.
///
/// Works in place from the last byte backwards; the order of the assignments matters.
pub(crate) fn right_align_timestamp(mut buf: [u8; 8]) -> [u8; 8] {
    for i in (2..8).rev() {
        buf[i] = buf[i - 2];
    }
    buf[1] = 0;
    buf[0] = 0;
    buf
}

impl fmt::Display for Uuid {
    /// Returns the 8-4-4-4-12 canonical hexadecimal string representation.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl str::FromStr for Uuid {
    type Err = Error;

    /// Creates an object from the 8-4-4-4-12 hexadecimal string representation.
    fn from_str(src: &str) -> Result<Self, Self::Err> {
        Self::decode_text(src)
    }
}

impl TryFrom<&str> for Uuid {
    type Error = Error;

    fn try_from(src: &str) -> Result<Self, Self::Error> {
        Self::decode_text(src)
    }
}

impl TryFrom<String> for Uuid {
    type Error = Error;

    fn try_from(src: String) -> Result<Self, Self::Error> {
        Self::decode_text(&src)
    }
}

impl From<Uuid> for String {
    fn from(src: Uuid) -> Self {
        src.to_string()
    }
}

impl From<Uuid> for [u8; 16] {
    fn from(src: Uuid) -> Self {
        src.0
    }
}

impl From<[u8; 16]> for Uuid {
    fn from(src: [u8; 16]) -> Self {
        Self(src)
    }
}

impl AsRef<[u8]> for Uuid {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl From<Uuid> for u128 {
    fn from(src: Uuid) -> Self {
        Self::from_be_bytes(src.0)
    }
}

impl From<u128> for Uuid {
    fn from(src: u128) -> Self {
        Self(src.to_be_bytes())
    }
}

#[cfg(feature = "uuid")]
#[cfg_attr(docsrs, doc(cfg(feature = "uuid")))]
mod uuid_support {
    use super::Uuid;

    impl From<Uuid> for uuid::Uuid {
        fn from(src: Uuid) -> Self {
            uuid::Uuid::from_bytes(src.0)
        }
    }

    impl From<uuid::Uuid> for Uuid {
        fn from(src: uuid::Uuid) -> Self {
            Self(src.into_bytes())
        }
    }
}

#[cfg(feature = "serde")]
#[cfg_attr(docsrs, doc(cfg(feature = "serde")))]
mod serde_support {
    use super::{fmt, Uuid};
    use serde::{de, Deserializer, Serializer};

    impl serde::Serialize for Uuid {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            if serializer.is_human_readable() {
                serializer.serialize_str(&self.encode())
            } else {
                serializer.serialize_bytes(self.as_bytes())
            }
        }
    }

    impl<'de> serde::Deserialize<'de> for Uuid {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            if deserializer.is_human_readable() {
                deserializer.deserialize_str(UuidVisitor)
            } else {
                deserializer.deserialize_bytes(UuidVisitor)
            }
        }
    }

    struct UuidVisitor;

    impl<'de> de::Visitor<'de> for UuidVisitor {
        type Value = Uuid;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(formatter, "a UUID representation")
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
            Uuid::decode_text(value).map_err(de::Error::custom)
        }

        fn visit_bytes<E: de::Error>(self, value: &[u8]) -> Result<Self::Value, E> {
            <[u8; 16]>::try_from(value)
                .map(Uuid::from)
                .map_err(|_| de::Error::invalid_length(value.len(), &self))
        }
    }

}
