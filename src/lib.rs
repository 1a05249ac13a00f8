//! UUID versions 4, 7, and 8 with monotonic ordering and validation
//!
//! ```rust
//! let uuid = uuid478::uuid7();
//! println!("{}", uuid); // e.g. "01915146-80e1-741e-a983-6cbdd7c69015"
//! println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
//!
//! assert_eq!(uuid478::validate_str(&uuid.encode()), Ok(()));
//! ```
//!
//! See [RFC 9562](https://www.rfc-editor.org/rfc/rfc9562).
//!
//! # Field and bit layout
//!
//! UUIDv7 identifiers produced by this crate have the following bit layout:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                          unix_ts_ms                           |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          unix_ts_ms           |  ver  |       sequence        |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |var|                        rand                               |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |             rand              |            counter            |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! Where:
//!
//! - The 48-bit `unix_ts_ms` field is dedicated to the Unix timestamp in
//!   milliseconds.
//! - The 4-bit `ver` field is set at `0111`.
//! - The 12-bit `sequence` field holds the fraction of the millisecond elapsed, in
//!   units of 1/4096 ms.
//! - The 2-bit `var` field is set at `10`.
//! - The 46-bit `rand` field is filled with a cryptographically strong random number
//!   and is never all zero.
//! - The 16-bit `counter` field is randomly initialized (below `0x8000`) whenever the
//!   `unix_ts_ms` or `sequence` advances, and incremented by one for each further
//!   identifier generated while the clock reads an earlier or equal value.
//!
//! When the `counter` wraps around, it carries into `sequence`, and from a full
//! `sequence` into `unix_ts_ms`; only then may `unix_ts_ms` run ahead of the
//! real-time clock. A clock that moves back by up to one second keeps the last
//! timestamp and continues the counter, so identifiers from one thread are ordered by
//! [`Uuid::cmp_time()`] in call order. If the clock moves back further, this library
//! restarts from the clock reading so that no timestamp lies in the future, and the
//! monotonic order breaks at that point.
//!
//! UUIDv8 identifiers carry the Unix timestamp in nanoseconds in bytes 0-7 (the
//! version nibble `1000` replaces its bits 12-15) and 62 bits from a fast
//! xoshiro256++ generator behind the `10` variant.
//!
//! # Other features
//!
//! This library also supports the generation of UUID version 4 and 8, and a
//! process-wide default version:
//!
//! ```rust
//! use uuid478::{uuid4, uuid8, Version};
//!
//! println!("{}", uuid4()); // e.g. "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
//! println!("{}", uuid8()); // e.g. "17ef3a6b-5c42-8def-9f3c-1d0a77e2b6c4"
//!
//! uuid478::set_version(8)?;
//! assert_eq!(uuid478::new_uuid().version(), Some(Version::V8));
//! # Ok::<(), uuid478::Error>(())
//! ```
//!
//! # Crate features
//!
//! - `serde` enables the serialization and deserialization of [`Uuid`] objects.
//! - `uuid` enables the lossless conversion between [`Uuid`] and `uuid::Uuid`.

#![cfg_attr(docsrs, feature(doc_cfg))]

mod error;
pub use error::{Error, TextError};

mod id;
pub use id::{Uuid, Variant};

mod version;
pub use version::Version;

pub mod generator;
#[doc(inline)]
pub use generator::{Generator, RandSource, StdSystemTime, TimeSource};

mod global_gen;
pub use global_gen::{default_version, new_uuid, set_version, uuid4, uuid7, uuid8};

pub mod monotonic;

pub mod prng;

mod validate;
pub use validate::{validate, validate_str, validate_str_with, validate_with};
