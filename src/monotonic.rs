//! Shared ordering state consulted by every UUIDv7 generation.

use std::sync::atomic::{AtomicU64, Ordering};

const SEQUENCE_BITS: u32 = 12;
const COUNTER_BITS: u32 = 16;
const MAX_SEQUENCE: u16 = (1 << SEQUENCE_BITS) - 1;

/// Low millisecond bits kept in the state word; the rest are restored from the clock reading.
const MS_LOW_BITS: u32 = u64::BITS - SEQUENCE_BITS - COUNTER_BITS;
const MS_LOW_MASK: u64 = (1 << MS_LOW_BITS) - 1;

/// Clock rollback (in milliseconds) absorbed by continuing from the last stamp.
///
/// A clock reading further behind than this resets the state to the reading.
pub const ROLLBACK_ALLOWANCE_MS: u64 = 1_000;

/// The ordering-relevant fields of a UUIDv7.
#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default)]
pub struct Stamp {
    /// Unix timestamp in milliseconds (48 bits).
    pub unix_ts_ms: u64,

    /// Sub-millisecond sequence fraction (12 bits).
    pub sequence: u16,

    /// Low 16 bits of the identifier.
    pub counter: u16,
}

impl Stamp {
    const fn pack(&self) -> u64 {
        ((self.unix_ts_ms & MS_LOW_MASK) << (SEQUENCE_BITS + COUNTER_BITS))
            | (self.sequence as u64) << COUNTER_BITS
            | self.counter as u64
    }

    /// Unpacks `word`, taking the millisecond closest to `near` that matches the packed bits.
    const fn unpack(word: u64, near: u64) -> Self {
        let low = word >> (SEQUENCE_BITS + COUNTER_BITS);
        let behind = near.wrapping_sub(low) & MS_LOW_MASK;
        let unix_ts_ms = if behind < 1 << (MS_LOW_BITS - 1) {
            near.wrapping_sub(behind)
        } else {
            near.wrapping_add((1 << MS_LOW_BITS) - behind)
        };
        Self {
            unix_ts_ms,
            sequence: ((word >> COUNTER_BITS) & MAX_SEQUENCE as u64) as u16,
            counter: word as u16,
        }
    }
}

/// How [`MonotonicState::advance()`] derived its result.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
enum Step {
    Fresh,
    Reset { behind: u64 },
    Reuse { behind: u64 },
    Carry,
}

/// Last issued millisecond, sequence, and counter, packed into one word and replaced only by
/// compare-and-swap.
///
/// Every successful swap installs the stamp it returns, so the stamps issued to any one thread
/// are a subsequence of the stamps the state has held. Those only increase until the clock
/// falls more than [`ROLLBACK_ALLOWANCE_MS`] behind, which resets the state.
#[derive(Debug, Default)]
pub struct MonotonicState {
    last: AtomicU64,
}

impl MonotonicState {
    /// Creates a state that has seen nothing.
    pub const fn new() -> Self {
        Self {
            last: AtomicU64::new(0),
        }
    }

    /// Takes the fields read from the clock (with a random counter) and returns the fields to
    /// encode.
    ///
    /// A newer millisecond or a greater sequence passes through unchanged. Otherwise the last
    /// millisecond and sequence are reused and the counter continues from the previous
    /// identifier's low 16 bits. A counter that wraps around carries into the sequence, and from
    /// the last sequence into the millisecond.
    pub fn advance(&self, fresh: Stamp) -> Stamp {
        let mut word = self.last.load(Ordering::Acquire);
        loop {
            let (next, step) = Self::step(word, fresh);
            match self.last.compare_exchange_weak(
                word,
                next.pack(),
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => {
                    log_step(&next, step);
                    return next;
                }
                Err(actual) => word = actual,
            }
        }
    }

    fn step(word: u64, fresh: Stamp) -> (Stamp, Step) {
        // an empty state
        if word == 0 {
            return (fresh, Step::Fresh);
        }

        let prev = Stamp::unpack(word, fresh.unix_ts_ms);
        if (fresh.unix_ts_ms, fresh.sequence) > (prev.unix_ts_ms, prev.sequence) {
            return (fresh, Step::Fresh);
        }

        let behind = prev.unix_ts_ms - fresh.unix_ts_ms;
        if behind > ROLLBACK_ALLOWANCE_MS {
            return (fresh, Step::Reset { behind });
        }

        if let Some(counter) = prev.counter.checked_add(1) {
            return (Stamp { counter, ..prev }, Step::Reuse { behind });
        }

        let next = if prev.sequence < MAX_SEQUENCE {
            Stamp {
                sequence: prev.sequence + 1,
                counter: 0,
                ..prev
            }
        } else {
            Stamp {
                unix_ts_ms: prev.unix_ts_ms + 1,
                sequence: 0,
                counter: 0,
            }
        };
        (next, Step::Carry)
    }
}

fn log_step(next: &Stamp, step: Step) {
    match step {
        Step::Fresh => {}
        Step::Reset { behind } => log::warn!(
            "clock moved back {behind} ms; uuid ordering restarts at {} ms",
            next.unix_ts_ms
        ),
        Step::Reuse { behind } => {
            if behind > 0 {
                log::debug!("clock is {behind} ms behind the last issued uuid; reusing its timestamp");
            }
            log::trace!(
                "sequence {} of {} ms reused with counter {}",
                next.sequence,
                next.unix_ts_ms,
                next.counter
            );
        }
        Step::Carry => log::debug!(
            "counter exhausted; carried into sequence {} of {} ms",
            next.sequence,
            next.unix_ts_ms
        ),
    }
}
