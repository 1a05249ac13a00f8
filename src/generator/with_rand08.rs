//! Integration with `rand` (v0.8) crate.

use super::{Generator, RandSource};
use crate::Uuid;
use rand::RngCore;

/// An adapter that implements [`RandSource`] for [`RngCore`] types.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Adapter<T>(/** The wrapped [`RngCore`] type. */ pub T);

impl<T: RngCore> RandSource for Adapter<T> {
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }
}

impl<C: super::TimeSource> Generator<C> {
    /// Generates a new UUIDv7 object drawing random bits from any [`RngCore`] of `rand` (v0.8).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use uuid478::{Generator, StdSystemTime};
    ///
    /// let g = Generator::new(StdSystemTime);
    /// println!("{}", g.new_v7_with_rand08(rand::rngs::OsRng));
    /// ```
    pub fn new_v7_with_rand08<T: RngCore>(&self, rng: T) -> Uuid {
        self.new_v7_with(&mut Adapter(rng))
    }
}
