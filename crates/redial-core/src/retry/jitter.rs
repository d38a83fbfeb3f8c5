//! Jitter strategies and the randomness they draw from.
//!
//! - [`JitterStrategy::FloorAnchored`]: uniform in `[minimum, delay)` (default)
//! - [`JitterStrategy::HalfRange`]: uniform in `[delay/2, delay)`
//!
//! Randomness comes from a [`JitterSource`]. The default [`ThreadRngSource`]
//! is seeded from OS entropy, so separate processes never share a sequence.
//! Tests swap in a [`SeededSource`] to make the draws reproducible without
//! touching any global state.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Range;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// How a jittered delay is drawn from the deterministic exponential value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JitterStrategy {
    /// Uniform in `[delay/2, delay)`.
    ///
    /// Keeps on average 75% of the exponential delay, but at small delays the
    /// result may fall below the configured minimum.
    HalfRange,

    /// Uniform in `[minimum, delay)`.
    ///
    /// Never drops below the configured minimum. At zero failures the range is
    /// empty and the result is exactly `minimum`.
    #[default]
    FloorAnchored,
}

impl JitterStrategy {
    /// Randomize `delay` according to this strategy.
    ///
    /// `minimum` is the policy's floor; only [`JitterStrategy::FloorAnchored`]
    /// uses it. When the drawn range is empty, the lower bound is returned.
    pub fn apply(&self, minimum: Duration, delay: Duration, source: &dyn JitterSource) -> Duration {
        let high = as_nanos_u64(delay);
        let low = match self {
            JitterStrategy::HalfRange => high / 2,
            JitterStrategy::FloorAnchored => as_nanos_u64(minimum).min(high),
        };

        if low >= high {
            return Duration::from_nanos(low);
        }

        Duration::from_nanos(source.sample(low..high))
    }
}

/// Source of uniform random numbers for jitter.
///
/// Does not need to be cryptographically secure. Implementations must be safe
/// to share between threads; every draw is independent.
pub trait JitterSource: Send + Sync + fmt::Debug {
    /// Draw uniformly from the half-open `range`. Callers never pass an
    /// empty range.
    fn sample(&self, range: Range<u64>) -> u64;
}

/// Default source: the thread-local generator from `rand`, seeded from OS
/// entropy.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadRngSource;

impl JitterSource for ThreadRngSource {
    fn sample(&self, range: Range<u64>) -> u64 {
        rand::thread_rng().gen_range(range)
    }
}

/// Deterministic source seeded with a fixed value.
///
/// # Examples
///
/// ```rust
/// use redial_core::retry::{JitterSource, SeededSource};
///
/// let a = SeededSource::new(1);
/// let b = SeededSource::new(1);
/// assert_eq!(a.sample(0..1_000), b.sample(0..1_000));
/// ```
#[derive(Debug)]
pub struct SeededSource {
    rng: Mutex<StdRng>,
}

impl SeededSource {
    /// Create a source whose sequence is fully determined by `seed`.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl JitterSource for SeededSource {
    fn sample(&self, range: Range<u64>) -> u64 {
        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        rng.gen_range(range)
    }
}

/// Saturating `Duration` to whole nanoseconds.
pub(crate) fn as_nanos_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}
