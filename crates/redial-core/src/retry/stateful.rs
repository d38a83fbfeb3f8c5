//! Backoff with an instance-owned failure counter.

use super::policy::BackoffPolicy;
use std::future::Future;
use std::time::Duration;

/// A [`BackoffPolicy`] paired with the failure count of one retry sequence.
///
/// Every [`next_delay`](Self::next_delay) call returns the delay for the
/// current count and then bumps it, so successive calls walk the exponential
/// curve. The count survives across calls until [`reset`](Self::reset).
///
/// All mutating methods take `&mut self`: sharing one `Backoff` between
/// concurrent sequences requires the caller to wrap it in a lock. Prefer one
/// `Backoff` per sequence, or the stack-local counter of
/// [`BackoffPolicy::execute`].
///
/// # Examples
///
/// ```rust
/// use redial_core::retry::{Backoff, BackoffPolicy};
/// use std::time::Duration;
///
/// let mut backoff = Backoff::new(BackoffPolicy::new(Duration::from_millis(100), 5));
/// assert_eq!(backoff.next_delay(), Duration::from_millis(100));
/// assert_eq!(backoff.next_delay(), Duration::from_millis(200));
/// assert_eq!(backoff.failures(), 2);
///
/// backoff.reset();
/// assert_eq!(backoff.next_delay(), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: BackoffPolicy,
    failures: u32,
}

impl Backoff {
    /// Start a fresh sequence with zero failures.
    pub fn new(policy: BackoffPolicy) -> Self {
        Self {
            policy,
            failures: 0,
        }
    }

    /// Failures recorded since construction or the last reset.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// The underlying policy.
    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Mutable access to the underlying policy, e.g. to toggle jitter.
    pub fn policy_mut(&mut self) -> &mut BackoffPolicy {
        &mut self.policy
    }

    /// Delay for the current failure count, then record one more failure.
    pub fn next_delay(&mut self) -> Duration {
        let delay = self.policy.delay(self.failures);
        self.failures = self.failures.saturating_add(1);
        delay
    }

    /// Zero the failure count so the instance can start a new sequence.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Whether recording one more failure would reach the policy's budget.
    fn exhausted_after_failure(&self) -> bool {
        self.failures.saturating_add(1) >= self.policy.max_failures
    }

    /// Bounded retry that charges failures to this instance.
    ///
    /// Unlike [`BackoffPolicy::execute`], failures from earlier calls count
    /// against the budget until [`reset`](Self::reset), and the first sleep
    /// is `delay(failures)` for the current count (so `minimum` on a fresh
    /// instance). A success leaves the counter untouched.
    pub async fn execute<F, Fut, T, E>(&mut self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if self.exhausted_after_failure() => {
                    self.failures = self.failures.saturating_add(1);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(failures = self.failures, "retry budget exhausted");
                    return Err(err);
                }
                Err(_) => {
                    let delay = self.next_delay();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(failures = self.failures, ?delay, "attempt failed, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Blocking form of [`execute`](Self::execute).
    pub fn execute_blocking<F, T, E>(&mut self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) if self.exhausted_after_failure() => {
                    self.failures = self.failures.saturating_add(1);
                    #[cfg(feature = "tracing")]
                    tracing::warn!(failures = self.failures, "retry budget exhausted");
                    return Err(err);
                }
                Err(_) => {
                    let delay = self.next_delay();
                    #[cfg(feature = "tracing")]
                    tracing::debug!(failures = self.failures, ?delay, "attempt failed, backing off");
                    std::thread::sleep(delay);
                }
            }
        }
    }
}

impl From<BackoffPolicy> for Backoff {
    fn from(policy: BackoffPolicy) -> Self {
        Self::new(policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn backoff(minimum_ms: u64, max_failures: u32) -> Backoff {
        Backoff::new(BackoffPolicy::new(
            Duration::from_millis(minimum_ms),
            max_failures,
        ))
    }

    #[test]
    fn test_next_delay_sequence() {
        let mut b = backoff(100, 5);

        assert_eq!(b.next_delay(), Duration::from_millis(100));
        assert_eq!(b.next_delay(), Duration::from_millis(200));
        assert_eq!(b.next_delay(), Duration::from_millis(400));
        assert_eq!(b.next_delay(), Duration::from_millis(800));
        assert_eq!(b.failures(), 4);
    }

    #[test]
    fn test_reset() {
        let mut b = backoff(100, 5);
        for _ in 0..7 {
            b.next_delay();
        }
        assert_eq!(b.failures(), 7);

        b.reset();
        assert_eq!(b.failures(), 0);
        assert_eq!(b.next_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_next_delay_with_jitter_stays_in_bounds() {
        let mut b = backoff(100, 5);
        b.policy_mut().jitter = true;

        assert_eq!(b.next_delay(), Duration::from_millis(100));
        for n in 1..10u32 {
            let d = b.next_delay();
            let upper = Duration::from_millis(100) * 2u32.pow(n);
            assert!(d >= Duration::from_millis(100));
            assert!(d < upper, "n={}: {:?} >= {:?}", n, d, upper);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_charges_instance() {
        let mut b = backoff(10, 5);
        let attempts = AtomicU32::new(0);
        let start = Instant::now();

        let result = b
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("down") }
            })
            .await;

        assert_eq!(result, Err("down"));
        assert_eq!(attempts.load(Ordering::SeqCst), 5);
        assert_eq!(b.failures(), 5);

        // Sleeps for counts 0..=3: 10 + 20 + 40 + 80 ms.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_millis(150), "{:?}", elapsed);
        assert!(elapsed < Duration::from_millis(160), "{:?}", elapsed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_carries_over_until_reset() {
        let mut b = backoff(1, 4);

        let first = b
            .execute(|| async { Err::<(), _>("down") })
            .await;
        assert!(first.is_err());
        assert_eq!(b.failures(), 4);

        // Budget already spent: one attempt, no sleep.
        let attempts = AtomicU32::new(0);
        let start = Instant::now();
        let second = b
            .execute(|| {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err::<(), _>("down") }
            })
            .await;
        assert!(second.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);

        b.reset();
        let attempts = AtomicU32::new(0);
        let third = b
            .execute(|| {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move { if n < 2 { Err("down") } else { Ok(n) } }
            })
            .await;
        assert_eq!(third, Ok(2));
        assert_eq!(b.failures(), 2);
    }

    #[test]
    fn test_execute_blocking_single_attempt() {
        let mut b = backoff(100, 1);
        let mut attempts = 0;

        let result: Result<(), &str> = b.execute_blocking(|| {
            attempts += 1;
            Err("down")
        });

        assert_eq!(result, Err("down"));
        assert_eq!(attempts, 1);
        assert_eq!(b.failures(), 1);
    }
}
