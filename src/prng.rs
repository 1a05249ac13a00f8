//! Non-cryptographic pseudo-random number generators.
//!
//! [`Xoshiro256PlusPlus`] fills the random half of UUIDv8, where throughput matters more than
//! unpredictability. Its four state words are expanded from a single seed by [`SplitMix64`].

/// The SplitMix64 seed-expansion generator, holding one 64-bit word of state.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    /// The additive increment (the 64-bit golden ratio).
    pub const INCREMENT: u64 = 0x9e37_79b9_7f4a_7c15;

    /// Creates a generator with the given initial state.
    pub const fn new(state: u64) -> Self {
        Self { state }
    }

    /// Advances the state and returns the next value.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(Self::INCREMENT);
        Self::mix(self.state)
    }

    /// Output function applied to the freshly incremented state.
    ///
    /// Exposed so that a state shared through an atomic `fetch_add` can produce the same stream.
    pub const fn mix(mut z: u64) -> u64 {
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }
}

/// The xoshiro256++ generator.
///
/// An all-zero state is accepted but degenerate: the generator then returns zero forever. Such a
/// seed is well-defined, not meaningful.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct Xoshiro256PlusPlus {
    s: [u64; 4],
}

impl Xoshiro256PlusPlus {
    /// Creates a generator from four raw state words.
    pub const fn from_state(s: [u64; 4]) -> Self {
        Self { s }
    }

    /// Creates a generator from four successive outputs of `seeder`.
    pub fn from_splitmix(seeder: &mut SplitMix64) -> Self {
        Self::from_state([
            seeder.next_u64(),
            seeder.next_u64(),
            seeder.next_u64(),
            seeder.next_u64(),
        ])
    }

    /// Advances the state by one step and returns the next value.
    pub fn next_u64(&mut self) -> u64 {
        let s = &mut self.s;
        let result = s[0].wrapping_add(s[3]).rotate_left(23).wrapping_add(s[0]);

        let t = s[1] << 17;

        s[2] ^= s[0];
        s[3] ^= s[1];
        s[1] ^= s[2];
        s[0] ^= s[3];

        s[2] ^= t;

        s[3] = s[3].rotate_left(45);

        result
    }
}

impl rand::RngCore for Xoshiro256PlusPlus {
    fn next_u32(&mut self) -> u32 {
        (Xoshiro256PlusPlus::next_u64(self) >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        Xoshiro256PlusPlus::next_u64(self)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        let mut chunks = dest.chunks_exact_mut(8);
        for chunk in &mut chunks {
            chunk.copy_from_slice(&Xoshiro256PlusPlus::next_u64(self).to_le_bytes());
        }
        let rest = chunks.into_remainder();
        if !rest.is_empty() {
            let bytes = Xoshiro256PlusPlus::next_u64(self).to_le_bytes();
            rest.copy_from_slice(&bytes[..rest.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SplitMix64, Xoshiro256PlusPlus};

    /// Reproduces reference SplitMix64 outputs
    #[test]
    fn reproduces_reference_splitmix64_outputs() {
        // https://rosettacode.org/wiki/Pseudo-random_numbers/Splitmix64
        let mut g = SplitMix64::new(1234567);
        assert_eq!(g.next_u64(), 6457827717110365317);
        assert_eq!(g.next_u64(), 3203168211198807973);
        assert_eq!(g.next_u64(), 9817491932198370423);
        assert_eq!(g.next_u64(), 4593380528125082431);
        assert_eq!(g.next_u64(), 16408922859458223821);
    }

    /// Follows the xoshiro256++ recurrence
    #[test]
    fn follows_the_xoshiro256pp_recurrence() {
        let mut g = Xoshiro256PlusPlus::from_state([1, 2, 3, 4]);
        // result = rotl(1 + 4, 23) + 1
        assert_eq!(g.next_u64(), (5u64 << 23) + 1);
        // state after one step: s2 = 3^1 ^ (2<<17), s3 = rotl(4^2, 45), s1 = 2^(3^1), s0 = 1^(4^2)
        assert_eq!(
            g,
            Xoshiro256PlusPlus::from_state([
                1 ^ 4 ^ 2,
                2 ^ 3 ^ 1,
                3 ^ 1 ^ (2 << 17),
                (4u64 ^ 2).rotate_left(45),
            ])
        );
    }

    /// Keeps returning zero from all-zero state
    #[test]
    fn keeps_returning_zero_from_all_zero_state() {
        let mut g = Xoshiro256PlusPlus::default();
        for _ in 0..100 {
            assert_eq!(g.next_u64(), 0);
        }
    }

    /// Sets output bits to 1 at ~50% probability
    #[test]
    fn sets_output_bits_to_1_at_50_percent_probability() {
        const N_SAMPLES: usize = 100_000;
        let mut g = Xoshiro256PlusPlus::from_splitmix(&mut SplitMix64::new(42));

        let mut bins = [0u32; 64];
        for _ in 0..N_SAMPLES {
            let mut num = g.next_u64();
            for bin in bins.iter_mut() {
                *bin += (num & 1) as u32;
                num >>= 1;
            }
        }

        // set margin based on binom dist 99.999% confidence interval
        let margin = 4.417173 * (0.5 * 0.5 / N_SAMPLES as f64).sqrt();
        for (i, bin) in bins.iter().enumerate() {
            let p = *bin as f64 / N_SAMPLES as f64;
            assert!((p - 0.5).abs() < margin, "random bit {i}: {p}");
        }
    }

    /// Fills byte slices of any length
    #[test]
    fn fills_byte_slices_of_any_length() {
        use rand::RngCore;
        let mut g = Xoshiro256PlusPlus::from_splitmix(&mut SplitMix64::new(7));
        for len in [0usize, 1, 7, 8, 9, 16, 31] {
            let mut buf = vec![0u8; len];
            g.fill_bytes(&mut buf);
            if len >= 8 {
                assert!(buf.iter().any(|&b| b != 0));
            }
        }
    }
}
