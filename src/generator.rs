//! Generator type, random source and clock interfaces.

use std::sync::atomic::{AtomicU8, Ordering};
use std::time;

use crate::monotonic::{MonotonicState, Stamp};
use crate::{Error, Uuid, Version};

pub mod with_rand08;

/// A trait that defines the minimum random number generator interface for [`Generator`].
pub trait RandSource {
    /// Returns the next random `u64`.
    fn next_u64(&mut self) -> u64;

    /// Fills `dest` with random data.
    fn fill_bytes(&mut self, dest: &mut [u8]);
}

/// A trait that defines the wall clock interface for [`Generator`] and the validator.
pub trait TimeSource {
    /// Returns the time elapsed since the Unix epoch.
    fn now(&self) -> time::Duration;
}

/// [`TimeSource`] reading [`std::time::SystemTime`].
#[derive(Copy, Clone, Eq, PartialEq, Debug, Default)]
pub struct StdSystemTime;

impl TimeSource for StdSystemTime {
    fn now(&self) -> time::Duration {
        time::SystemTime::now()
            .duration_since(time::UNIX_EPOCH)
            .expect("clock may have gone backwards")
    }
}

impl<T: TimeSource + ?Sized> TimeSource for &T {
    fn now(&self) -> time::Duration {
        (**self).now()
    }
}

/// Represents a UUID generator that owns the UUIDv7 monotonicity state and the default-version
/// selector.
///
/// All methods take `&self`, so one instance can be shared across threads. The free functions
/// of this crate ([`uuid7()`](crate::uuid7) and friends) use a process-wide instance; a separate
/// instance has its own ordering state, which is what tests and embedders that need isolation
/// want.
///
/// # Examples
///
/// ```rust
/// use uuid478::{Generator, StdSystemTime, Version};
///
/// let g = Generator::new(StdSystemTime);
/// let a = g.new_v7();
/// let b = g.new_v7();
/// assert!(b.after(&a)?);
///
/// g.set_default_version(8)?;
/// assert_eq!(g.generate().version(), Some(Version::V8));
/// # Ok::<(), uuid478::Error>(())
/// ```
#[derive(Debug)]
pub struct Generator<C> {
    state: MonotonicState,
    default_version: AtomicU8,
    clock: C,
}

impl<C> Generator<C> {
    /// Creates a generator instance reading time from `clock`.
    pub const fn new(clock: C) -> Self {
        Self {
            state: MonotonicState::new(),
            default_version: AtomicU8::new(Version::V7.as_u8()),
            clock,
        }
    }

    /// Returns the version [`Generator::generate()`] currently produces.
    pub fn default_version(&self) -> Version {
        Version::from_nibble(self.default_version.load(Ordering::Acquire)).unwrap_or_default()
    }

    /// Selects the version [`Generator::generate()`] produces from now on, for every caller.
    ///
    /// Anything but 4, 7, or 8 is rejected with [`Error::UnsupportedVersion`] and leaves the
    /// selection unchanged.
    pub fn set_default_version(&self, version: u8) -> Result<(), Error> {
        let version = Version::try_from(version).inspect_err(|_| {
            log::debug!("rejected default uuid version {version}");
        })?;
        let prev = self
            .default_version
            .swap(version.as_u8(), Ordering::AcqRel);
        if prev != version.as_u8() {
            log::debug!("default uuid version set to {version}");
        }
        Ok(())
    }
}

impl<C: Default> Default for Generator<C> {
    fn default() -> Self {
        Self::new(C::default())
    }
}

impl<C: TimeSource> Generator<C> {
    /// Generates a new UUIDv4 object from 16 bytes of `rng`.
    pub fn new_v4_with<R: RandSource + ?Sized>(&self, rng: &mut R) -> Uuid {
        let mut bytes = [0u8; 16];
        rng.fill_bytes(&mut bytes);
        Uuid::from_random_v4(bytes)
    }

    /// Generates a new UUIDv7 object from the current time, drawing its random bits from `rng`.
    ///
    /// The result compares after every UUIDv7 previously generated by this instance on the same
    /// thread (see [`Uuid::cmp_time()`]), unless the clock has since moved back by more than
    /// [`ROLLBACK_ALLOWANCE_MS`](crate::monotonic::ROLLBACK_ALLOWANCE_MS).
    pub fn new_v7_with<R: RandSource + ?Sized>(&self, rng: &mut R) -> Uuid {
        const NANOS_PER_MILLI: u64 = 1_000_000;

        let now = self.clock.now();
        let unix_ts_ms = now.as_millis() as u64;
        let sub_ms_nanos = (now.subsec_nanos() as u64) % NANOS_PER_MILLI;
        let sequence = ((sub_ms_nanos << 12) / NANOS_PER_MILLI) as u16;

        // the 46 bits above the counter must not all be zero
        let rand_b = loop {
            let r = rng.next_u64() >> 2;
            if r >> 16 != 0 {
                break r;
            }
        };

        let stamp = self.state.advance(Stamp {
            unix_ts_ms,
            sequence,
            counter: (rand_b & 0x7fff) as u16,
        });

        Uuid::from_fields_v7(
            stamp.unix_ts_ms,
            stamp.sequence,
            (rand_b & !0xffff) | stamp.counter as u64,
        )
    }

    /// Generates a new UUIDv8 object from the current time, drawing its random bits from `rng`.
    ///
    /// No ordering state is consulted; two calls that read the same nanosecond from a coarse
    /// clock are ordered by nothing but chance.
    pub fn new_v8_with<R: RandSource + ?Sized>(&self, rng: &mut R) -> Uuid {
        let unix_ts_nanos = self.clock.now().as_nanos() as u64;

        // the 62 bits below the variant must not all be zero
        let rand = loop {
            let r = rng.next_u64();
            if r & (u64::MAX >> 2) != 0 {
                break r;
            }
        };

        Uuid::from_fields_v8(unix_ts_nanos, rand)
    }

    /// Generates a new object of the default version, using `crypto` for UUIDv4 and UUIDv7 and
    /// `fast` for UUIDv8.
    pub fn generate_with<R1, R2>(&self, crypto: &mut R1, fast: &mut R2) -> Uuid
    where
        R1: RandSource + ?Sized,
        R2: RandSource + ?Sized,
    {
        match self.default_version() {
            Version::V4 => self.new_v4_with(crypto),
            Version::V7 => self.new_v7_with(crypto),
            Version::V8 => self.new_v8_with(fast),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{with_rand08::Adapter, Generator, TimeSource};
    use crate::{Error, Version};
    use rand::{rngs::StdRng, SeedableRng};
    use std::{sync::atomic, time::Duration};

    /// A clock that advances by `step` nanoseconds on every read.
    struct SteppingClock {
        nanos: atomic::AtomicU64,
        step: u64,
    }

    impl SteppingClock {
        fn new(start: u64, step: u64) -> Self {
            Self {
                nanos: atomic::AtomicU64::new(start),
                step,
            }
        }

        fn set(&self, nanos: u64) {
            self.nanos.store(nanos, atomic::Ordering::Relaxed);
        }
    }

    impl TimeSource for SteppingClock {
        fn now(&self) -> Duration {
            Duration::from_nanos(self.nanos.fetch_add(self.step, atomic::Ordering::Relaxed))
        }
    }

    const START: u64 = 1_723_000_000_123_456_789;

    fn seeded_rng() -> Adapter<StdRng> {
        Adapter(StdRng::seed_from_u64(0x5eed))
    }

    /// Packs millisecond and sequence fraction
    #[test]
    fn packs_millisecond_and_sequence_fraction() {
        let g = Generator::new(SteppingClock::new(START, 0));
        let e = g.new_v7_with(&mut seeded_rng());
        assert_eq!(e.version(), Some(Version::V7));
        assert_eq!(e.variant_bits(), 0b10);
        assert_eq!(e.unix_ts_ms(), START / 1_000_000);
        // 456_789 ns into the millisecond
        assert_eq!(e.sequence(), (456_789u64 * 4096 / 1_000_000) as u16);
        assert!(e.counter() < 0x8000);
    }

    /// Generates increasing UUIDs even with constant timestamp
    #[test]
    fn generates_increasing_uuids_even_with_constant_timestamp() {
        let g = Generator::new(SteppingClock::new(START, 0));
        let mut rng = seeded_rng();
        let mut prev = g.new_v7_with(&mut rng);
        // fewer calls than the counter headroom of one bucket
        for _ in 0..30_000 {
            let curr = g.new_v7_with(&mut rng);
            assert_eq!(curr.after(&prev), Ok(true));
            assert_eq!(curr.unix_ts_ms(), prev.unix_ts_ms());
            assert_eq!(curr.sequence(), prev.sequence());
            prev = curr;
        }
    }

    /// Generates increasing UUIDs with sub-millisecond clock steps
    #[test]
    fn generates_increasing_uuids_with_sub_millisecond_clock_steps() {
        let g = Generator::new(SteppingClock::new(START, 97));
        let mut rng = seeded_rng();
        let mut prev = g.new_v7_with(&mut rng);
        for _ in 0..100_000 {
            let curr = g.new_v7_with(&mut rng);
            assert_eq!(curr.after(&prev), Ok(true));
            prev = curr;
        }
        assert_eq!(prev.unix_ts_ms(), (START + 97 * 100_000) / 1_000_000);
    }

    /// Keeps each thread's UUIDs increasing on shared generator
    #[test]
    fn keeps_each_threads_uuids_increasing_on_shared_generator() {
        use std::thread;

        let g = Generator::new(SteppingClock::new(START, 50));
        thread::scope(|scope| {
            for i in 0..8 {
                let g = &g;
                scope.spawn(move || {
                    let mut rng = Adapter(StdRng::seed_from_u64(i));
                    let mut prev = g.new_v7_with(&mut rng);
                    for _ in 0..20_000 {
                        let curr = g.new_v7_with(&mut rng);
                        assert_eq!(curr.after(&prev), Ok(true), "{prev} then {curr}");
                        prev = curr;
                    }
                });
            }
        });
    }

    /// Follows clock stepped far back and stays valid
    #[test]
    fn follows_clock_stepped_far_back_and_stays_valid() {
        const HOUR: u64 = 3_600 * 1_000_000_000;

        let g = Generator::new(SteppingClock::new(START, 0));
        let mut rng = seeded_rng();
        let a = g.new_v7_with(&mut rng);
        assert_eq!(crate::validate_with(a.as_bytes(), &g.clock), Ok(()));

        g.clock.set(START - HOUR);
        let b = g.new_v7_with(&mut rng);
        assert_eq!(b.unix_ts_ms(), (START - HOUR) / 1_000_000);
        assert_eq!(crate::validate_with(b.as_bytes(), &g.clock), Ok(()));

        let c = g.new_v7_with(&mut rng);
        assert_eq!(c.after(&b), Ok(true));
    }

    /// Starts with v7 as default version
    #[test]
    fn starts_with_v7_as_default_version() {
        let g = Generator::<crate::StdSystemTime>::default();
        assert_eq!(g.default_version.load(atomic::Ordering::Relaxed), 7);
        assert_eq!(g.default_version(), Version::V7);
    }

    /// Stamps nanosecond timestamp into v8
    #[test]
    fn stamps_nanosecond_timestamp_into_v8() {
        let g = Generator::new(SteppingClock::new(START, 0));
        let e = g.new_v8_with(&mut seeded_rng());
        assert_eq!(e.version(), Some(Version::V8));
        assert_eq!(e.variant_bits(), 0b10);
        assert_eq!(e.unix_ts_nanos(), START & !0xf000);
    }

    /// Dispatches to selected default version
    #[test]
    fn dispatches_to_selected_default_version() {
        let g = Generator::new(SteppingClock::new(START, 1));
        let (mut crypto, mut fast) = (seeded_rng(), seeded_rng());
        assert_eq!(g.default_version(), Version::V7);
        assert_eq!(g.generate_with(&mut crypto, &mut fast).version(), Some(Version::V7));

        for (n, version) in [(4, Version::V4), (8, Version::V8), (7, Version::V7)] {
            assert_eq!(g.set_default_version(n), Ok(()));
            assert_eq!(g.default_version(), version);
            assert_eq!(g.generate_with(&mut crypto, &mut fast).version(), Some(version));
        }
    }

    /// Rejects unsupported default version
    #[test]
    fn rejects_unsupported_default_version() {
        let g = Generator::new(SteppingClock::new(START, 1));
        g.set_default_version(8).unwrap();
        for n in [0u8, 1, 5, 6, 9, 16] {
            assert_eq!(g.set_default_version(n), Err(Error::UnsupportedVersion(n)));
            assert_eq!(g.default_version(), Version::V8);
        }
    }
}
