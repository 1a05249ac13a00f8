//! Default generator, per-thread random sources, and entry point functions.

use std::cell::RefCell;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

use rand::rngs::{adapter::ReseedingRng, OsRng};
use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha12Core;

use crate::generator::{RandSource, StdSystemTime, TimeSource};
use crate::prng::{SplitMix64, Xoshiro256PlusPlus};
use crate::{Error, Generator, Uuid, Version};

/// The process-wide generator behind the entry point functions.
static GLOBAL_GEN: Generator<StdSystemTime> = Generator::new(StdSystemTime);

thread_local! {
    static CRYPTO_RNG: RefCell<CryptoRng> = RefCell::new(CryptoRng::new());
    static FAST_RNG: RefCell<FastRng> = RefCell::new(FastRng::new());
}

/// Generates a UUIDv4 object.
///
/// # Examples
///
/// ```rust
/// let uuid = uuid478::uuid4();
/// println!("{uuid}"); // e.g., "2ca4b2ce-6c13-40d4-bccf-37d222820f6f"
/// ```
pub fn uuid4() -> Uuid {
    GLOBAL_GEN.new_v4()
}

/// Generates a UUIDv7 object.
///
/// This function employs the process-wide generator; identifiers generated by one thread
/// compare in call order under [`Uuid::cmp_time()`], even within the same millisecond.
///
/// # Examples
///
/// ```rust
/// let uuid = uuid478::uuid7();
/// println!("{uuid}"); // e.g., "01915146-80e1-741e-a983-6cbdd7c69015"
/// println!("{:?}", uuid.as_bytes()); // as 16-byte big-endian array
///
/// let uuid_string: String = uuid478::uuid7().to_string();
/// ```
pub fn uuid7() -> Uuid {
    GLOBAL_GEN.new_v7()
}

/// Generates a UUIDv8 object carrying a nanosecond timestamp and fast pseudo-random bits.
///
/// The random half is not cryptographically unpredictable.
///
/// # Examples
///
/// ```rust
/// let uuid = uuid478::uuid8();
/// assert_eq!(uuid.version(), Some(uuid478::Version::V8));
/// ```
pub fn uuid8() -> Uuid {
    GLOBAL_GEN.new_v8()
}

/// Generates a UUID of the version currently selected by [`set_version()`] (UUIDv7 unless
/// changed).
pub fn new_uuid() -> Uuid {
    GLOBAL_GEN.generate()
}

/// Selects the version [`new_uuid()`] produces from now on, for every caller in the process.
///
/// # Examples
///
/// ```rust
/// use uuid478::{Error, Version};
///
/// uuid478::set_version(4)?;
/// assert_eq!(uuid478::new_uuid().version(), Some(Version::V4));
/// assert_eq!(uuid478::set_version(6), Err(Error::UnsupportedVersion(6)));
/// assert_eq!(uuid478::default_version(), Version::V4);
/// # uuid478::set_version(7)?;
/// # Ok::<(), Error>(())
/// ```
pub fn set_version(version: u8) -> Result<(), Error> {
    GLOBAL_GEN.set_default_version(version)
}

/// Returns the version [`new_uuid()`] currently produces.
pub fn default_version() -> Version {
    GLOBAL_GEN.default_version()
}

impl<C: TimeSource> Generator<C> {
    /// Generates a new UUIDv4 object using the per-thread cryptographically strong generator.
    pub fn new_v4(&self) -> Uuid {
        with_crypto_rng(|rng| self.new_v4_with(rng))
    }

    /// Generates a new UUIDv7 object using the per-thread cryptographically strong generator.
    pub fn new_v7(&self) -> Uuid {
        with_crypto_rng(|rng| self.new_v7_with(rng))
    }

    /// Generates a new UUIDv8 object using the per-thread fast generator.
    pub fn new_v8(&self) -> Uuid {
        with_fast_rng(|rng| self.new_v8_with(rng))
    }

    /// Generates a new object of the default version using the per-thread generators.
    pub fn generate(&self) -> Uuid {
        with_crypto_rng(|crypto| with_fast_rng(|fast| self.generate_with(crypto, fast)))
    }
}

fn with_crypto_rng<T>(f: impl FnOnce(&mut CryptoRng) -> T) -> T {
    unix_fork_safety::reseed_upon_pid_change();
    CRYPTO_RNG.with(|rng| f(&mut rng.borrow_mut()))
}

fn with_fast_rng<T>(f: impl FnOnce(&mut FastRng) -> T) -> T {
    unix_fork_safety::reseed_upon_pid_change();
    FAST_RNG.with(|rng| f(&mut rng.borrow_mut()))
}

/// The cryptographically strong random source.
///
/// Employs [`ChaCha12Core`] with [`ReseedingRng`] wrapper, reseeded from [`OsRng`] every 64 KiB,
/// to emulate the strategy used by [`rand::rngs::ThreadRng`].
struct CryptoRng(ReseedingRng<ChaCha12Core, OsRng>);

impl CryptoRng {
    fn new() -> Self {
        let core = ChaCha12Core::from_rng(OsRng)
            .expect("uuid478: could not seed random number generator from operating system");
        Self(ReseedingRng::new(core, 1024 * 64, OsRng))
    }
}

impl RandSource for CryptoRng {
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.0.fill_bytes(dest)
    }
}

/// The fast random source, one [`Xoshiro256PlusPlus`] per thread.
struct FastRng(Xoshiro256PlusPlus);

impl FastRng {
    /// Seeds a new instance with four successive words of the process-wide SplitMix64 stream.
    fn new() -> Self {
        Self(Xoshiro256PlusPlus::from_state([
            next_seed_word(),
            next_seed_word(),
            next_seed_word(),
            next_seed_word(),
        ]))
    }
}

impl RandSource for FastRng {
    fn next_u64(&mut self) -> u64 {
        self.0.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        RngCore::fill_bytes(&mut self.0, dest)
    }
}

/// Returns the next word of the process-wide SplitMix64 stream.
///
/// The stream starts from an operating system random word, drawn again in a forked child.
fn next_seed_word() -> u64 {
    static STATE: AtomicU64 = AtomicU64::new(0);
    static OWNER_PID: AtomicU32 = AtomicU32::new(0);

    let pid = std::process::id();
    if OWNER_PID.load(Ordering::Acquire) != pid {
        STATE.store(OsRng.next_u64(), Ordering::Relaxed);
        OWNER_PID.store(pid, Ordering::Release);
    }

    let state = STATE
        .fetch_add(SplitMix64::INCREMENT, Ordering::Relaxed)
        .wrapping_add(SplitMix64::INCREMENT);
    SplitMix64::mix(state)
}

#[cfg(unix)]
mod unix_fork_safety {
    use super::{CryptoRng, FastRng, CRYPTO_RNG, FAST_RNG};
    use std::{cell::Cell, process};

    thread_local! {
        static PID: Cell<u32> = Cell::new(process::id());
    }

    /// Replaces the per-thread random sources when the process ID changes (i.e. upon process
    /// forks) so that parent and child do not share random streams.
    pub fn reseed_upon_pid_change() {
        let changed = PID.with(|last_pid| {
            let pid = process::id();
            pid != last_pid.replace(pid)
        });
        if changed {
            log::debug!("process id changed; reseeding per-thread random sources");
            CRYPTO_RNG.with(|rng| rng.replace(CryptoRng::new()));
            FAST_RNG.with(|rng| rng.replace(FastRng::new()));
        }
    }
}

#[cfg(not(unix))]
mod unix_fork_safety {
    pub const fn reseed_upon_pid_change() {}
}

#[cfg(test)]
mod tests_v7 {
    use super::uuid7;
    use crate::{validate, Variant, Version};

    const N_SAMPLES: usize = 100_000;
    thread_local!(static SAMPLES: Vec<String> = (0..N_SAMPLES).map(|_| uuid7().into()).collect());

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        let pattern = r"^[0-9a-f]{8}-[0-9a-f]{4}-7[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";
        let re = regex::Regex::new(pattern).unwrap();
        SAMPLES.with(|samples| {
            for e in samples {
                assert!(re.is_match(e));
            }
        });
    }

    /// Generates 100k identifiers without collision
    #[test]
    fn generates_100k_identifiers_without_collision() {
        use std::collections::HashSet;
        SAMPLES.with(|samples| {
            let s: HashSet<&String> = samples.iter().collect();
            assert_eq!(s.len(), N_SAMPLES);
        });
    }

    /// Encodes up-to-date timestamp
    #[test]
    fn encodes_up_to_date_timestamp() {
        use std::time;
        for _ in 0..10_000 {
            let ts_now = (time::SystemTime::now()
                .duration_since(time::UNIX_EPOCH)
                .expect("clock may have gone backwards")
                .as_millis()) as i64;
            let timestamp = uuid7().unix_ts_ms() as i64;
            assert!((ts_now - timestamp).abs() < 16);
        }
    }

    /// Sets constant bits and random bits properly
    #[test]
    fn sets_constant_bits_and_random_bits_properly() {
        let bins = SAMPLES.with(|samples| super::tests_common::count_bits(samples));

        // test if constant bits are all set to 1 or 0
        let n = N_SAMPLES as u32;
        assert_eq!(bins[48], 0, "version bit 48");
        assert_eq!(bins[49], n, "version bit 49");
        assert_eq!(bins[50], n, "version bit 50");
        assert_eq!(bins[51], n, "version bit 51");
        assert_eq!(bins[64], n, "variant bit 64");
        assert_eq!(bins[65], 0, "variant bit 65");

        // test if random bits are set to 1 at ~50% probability
        // set margin based on binom dist 99.999% confidence interval
        let margin = 4.417173 * (0.5 * 0.5 / N_SAMPLES as f64).sqrt();
        for i in 66..112 {
            let p = bins[i] as f64 / N_SAMPLES as f64;
            assert!((p - 0.5).abs() < margin, "random bit {i}: {p}");
        }
    }

    /// Sets correct variant and version bits
    #[test]
    fn sets_correct_variant_and_version_bits() {
        for _ in 0..1_000 {
            let e = uuid7();
            assert_eq!(e.variant(), Variant::Var10);
            assert_eq!(e.version(), Some(Version::V7));
            assert_eq!(validate(e.as_bytes()), Ok(()));
        }
    }

    /// Generates no IDs sharing same timestamp, sequence, and counter under multithreading
    #[test]
    fn generates_no_ids_sharing_same_timestamp_sequence_and_counter_under_multithreading(
    ) -> Result<(), Box<dyn std::error::Error>> {
        use std::{collections::HashSet, sync::mpsc, thread};

        let (tx, rx) = mpsc::channel();
        for _ in 0..4 {
            let tx = tx.clone();
            thread::Builder::new()
                .spawn(move || {
                    for _ in 0..10_000 {
                        tx.send(uuid7()).unwrap();
                    }
                })
                .map_err(|err| format!("failed to spawn thread: {:?}", err))?;
        }
        drop(tx);

        let mut s = HashSet::new();
        while let Ok(e) = rx.recv() {
            s.insert(e);
        }

        assert_eq!(s.len(), 4 * 10_000);
        Ok(())
    }
}

#[cfg(test)]
mod tests_v4 {
    use super::uuid4;
    use crate::{validate, Variant, Version};

    const N_SAMPLES: usize = 100_000;
    thread_local!(static SAMPLES: Vec<String> = (0..N_SAMPLES).map(|_| uuid4().into()).collect());

    /// Generates canonical string
    #[test]
    fn generates_canonical_string() {
        let pattern = r"^[0-9a-f]{8}-[0-9a-f]{4}-4[0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}$";
        let re = regex::Regex::new(pattern).unwrap();
        SAMPLES.with(|samples| {
            for e in samples {
                assert!(re.is_match(e));
            }
        });
    }

    /// Generates 100k identifiers without collision
    #[test]
    fn generates_100k_identifiers_without_collision() {
        use std::collections::HashSet;
        SAMPLES.with(|samples| {
            let s: HashSet<&String> = samples.iter().collect();
            assert_eq!(s.len(), N_SAMPLES);
        });
    }

    /// Sets constant bits and random bits properly
    #[test]
    fn sets_constant_bits_and_random_bits_properly() {
        let bins = SAMPLES.with(|samples| super::tests_common::count_bits(samples));

        // test if constant bits are all set to 1 or 0
        let n = N_SAMPLES as u32;
        assert_eq!(bins[48], 0, "version bit 48");
        assert_eq!(bins[49], n, "version bit 49");
        assert_eq!(bins[50], 0, "version bit 50");
        assert_eq!(bins[51], 0, "version bit 51");
        assert_eq!(bins[64], n, "variant bit 64");
        assert_eq!(bins[65], 0, "variant bit 65");

        // test if random bits are set to 1 at ~50% probability
        // set margin based on binom dist 99.999% confidence interval
        let margin = 4.417173 * (0.5 * 0.5 / N_SAMPLES as f64).sqrt();
        for i in (0..48).chain(52..64).chain(66..128) {
            let p = bins[i] as f64 / N_SAMPLES as f64;
            assert!((p - 0.5).abs() < margin, "random bit {i}: {p}");
        }
    }

    /// Sets correct variant and version bits
    #[test]
    fn sets_correct_variant_and_version_bits() {
        for _ in 0..1_000 {
            let e = uuid4();
            assert_eq!(e.variant(), Variant::Var10);
            assert_eq!(e.version(), Some(Version::V4));
            assert_eq!(validate(e.as_bytes()), Ok(()));
        }
    }
}
