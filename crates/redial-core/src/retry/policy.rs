//! Exponential backoff policy.

use super::jitter::{JitterSource, JitterStrategy, ThreadRngSource, as_nanos_u64};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Exponential backoff policy with optional jitter.
///
/// The delay after `n` failures is `minimum * 2^n`, optionally capped at
/// `max_delay`, then randomized with the configured [`JitterStrategy`] when
/// `jitter` is set.
///
/// # Mathematical Formula
///
/// ```text
/// base   = min(minimum * 2^n, max_delay)       // truncated to whole ns
/// delay  = base                                 // jitter off
/// delay  = uniform[minimum, base)               // FloorAnchored
/// delay  = uniform[base / 2, base)              // HalfRange
/// ```
///
/// The policy itself holds no failure count. [`BackoffPolicy::execute`] keeps
/// its counter on the stack, so one policy can drive any number of concurrent
/// retry loops. For a counter owned by the object see
/// [`Backoff`](super::Backoff).
///
/// # Examples
///
/// ```rust
/// use redial_core::retry::BackoffPolicy;
/// use std::time::Duration;
///
/// let policy = BackoffPolicy::new(Duration::from_millis(100), 5);
/// assert_eq!(policy.delay(0), Duration::from_millis(100));
/// assert_eq!(policy.delay(3), Duration::from_millis(800));
/// ```
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    /// Smallest delay unit; the delay at zero failures.
    pub minimum: Duration,

    /// Attempt budget for bounded retries. Zero behaves like one.
    pub max_failures: u32,

    /// Randomize computed delays.
    pub jitter: bool,

    /// How delays are randomized when `jitter` is set.
    pub strategy: JitterStrategy,

    /// Optional cap on the deterministic delay.
    pub max_delay: Option<Duration>,

    source: Arc<dyn JitterSource>,
}

impl BackoffPolicy {
    /// Create a policy with the given minimum delay and failure budget.
    ///
    /// Jitter is off, there is no cap, and jitter draws (once enabled) come
    /// from [`ThreadRngSource`].
    pub fn new(minimum: Duration, max_failures: u32) -> Self {
        Self {
            minimum,
            max_failures,
            jitter: false,
            strategy: JitterStrategy::default(),
            max_delay: None,
            source: Arc::new(ThreadRngSource),
        }
    }

    /// Create a new builder for configuring a policy.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use redial_core::retry::{BackoffPolicy, JitterStrategy};
    /// use std::time::Duration;
    ///
    /// let policy = BackoffPolicy::builder()
    ///     .minimum(Duration::from_millis(50))
    ///     .max_failures(8)
    ///     .jitter(true)
    ///     .strategy(JitterStrategy::HalfRange)
    ///     .build();
    /// assert!(policy.jitter);
    /// ```
    pub fn builder() -> BackoffPolicyBuilder {
        BackoffPolicyBuilder::default()
    }

    /// Replace the randomness source used for jitter.
    pub fn set_jitter_source(&mut self, source: Arc<dyn JitterSource>) {
        self.source = source;
    }

    /// The randomness source used for jitter.
    pub fn jitter_source(&self) -> &Arc<dyn JitterSource> {
        &self.source
    }

    /// The deterministic delay after `failures` failures, before jitter.
    pub fn base_delay(&self, failures: u32) -> Duration {
        let nanos = as_nanos_u64(self.minimum) as f64 * 2f64.powf(f64::from(failures));
        // `as` saturates: anything past u64::MAX (including +inf) clamps.
        let base = Duration::from_nanos(nanos as u64);

        match self.max_delay {
            Some(cap) => base.min(cap),
            None => base,
        }
    }

    /// The delay to wait after `failures` failures.
    ///
    /// Pure with respect to the policy: no counter is touched. With jitter
    /// enabled each call draws a fresh value from the jitter source.
    pub fn delay(&self, failures: u32) -> Duration {
        let base = self.base_delay(failures);
        if !self.jitter {
            return base;
        }
        self.strategy.apply(self.minimum, base, self.source.as_ref())
    }

    /// Run `operation` until it succeeds or the failure budget is spent.
    ///
    /// The first attempt runs immediately. After the `n`th failure, if `n`
    /// is still below `max_failures`, the loop sleeps for
    /// [`delay(n)`](Self::delay) on the tokio timer and tries again. Once the
    /// budget is reached the last error is returned as-is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use redial_core::retry::BackoffPolicy;
    /// use std::time::Duration;
    ///
    /// # async fn example() -> Result<(), std::io::Error> {
    /// let policy = BackoffPolicy::new(Duration::from_millis(10), 3);
    /// let value = policy.execute(|| async { Ok::<_, std::io::Error>(42) }).await?;
    /// assert_eq!(value, 42);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut failures: u32 = 0;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    failures = failures.saturating_add(1);
                    if failures >= self.max_failures {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(failures, "retry budget exhausted");
                        return Err(err);
                    }
                    let delay = self.delay(failures);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(failures, ?delay, "attempt failed, backing off");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Blocking form of [`execute`](Self::execute).
    ///
    /// Sleeps the calling thread between attempts. Do not call from inside an
    /// async runtime worker.
    pub fn execute_blocking<F, T, E>(&self, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Result<T, E>,
    {
        let mut failures: u32 = 0;
        loop {
            match operation() {
                Ok(value) => return Ok(value),
                Err(err) => {
                    failures = failures.saturating_add(1);
                    if failures >= self.max_failures {
                        #[cfg(feature = "tracing")]
                        tracing::warn!(failures, "retry budget exhausted");
                        return Err(err);
                    }
                    let delay = self.delay(failures);
                    #[cfg(feature = "tracing")]
                    tracing::debug!(failures, ?delay, "attempt failed, backing off");
                    std::thread::sleep(delay);
                }
            }
        }
    }
}

impl Default for BackoffPolicy {
    /// Defaults:
    /// - `minimum`: 100ms
    /// - `max_failures`: 5
    /// - `jitter`: off
    fn default() -> Self {
        Self::new(Duration::from_millis(100), 5)
    }
}

/// Builder for configuring a [`BackoffPolicy`].
///
/// Unset parameters fall back to [`BackoffPolicy::default`].
#[derive(Debug, Default)]
pub struct BackoffPolicyBuilder {
    minimum: Option<Duration>,
    max_failures: Option<u32>,
    jitter: Option<bool>,
    strategy: Option<JitterStrategy>,
    max_delay: Option<Duration>,
    source: Option<Arc<dyn JitterSource>>,
}

impl BackoffPolicyBuilder {
    /// Set the minimum delay.
    ///
    /// Default: 100ms
    pub fn minimum(mut self, minimum: Duration) -> Self {
        self.minimum = Some(minimum);
        self
    }

    /// Set the failure budget for bounded retries.
    ///
    /// Default: 5
    pub fn max_failures(mut self, max_failures: u32) -> Self {
        self.max_failures = Some(max_failures);
        self
    }

    /// Enable or disable jitter.
    ///
    /// Default: off
    pub fn jitter(mut self, jitter: bool) -> Self {
        self.jitter = Some(jitter);
        self
    }

    /// Set the jitter strategy.
    ///
    /// Default: [`JitterStrategy::FloorAnchored`]
    pub fn strategy(mut self, strategy: JitterStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    /// Cap the deterministic delay.
    pub fn max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = Some(max_delay);
        self
    }

    /// Use a custom randomness source, e.g. a
    /// [`SeededSource`](super::SeededSource) in tests.
    pub fn jitter_source(mut self, source: Arc<dyn JitterSource>) -> Self {
        self.source = Some(source);
        self
    }

    /// Build the [`BackoffPolicy`].
    pub fn build(self) -> BackoffPolicy {
        let mut policy = BackoffPolicy::default();
        if let Some(minimum) = self.minimum {
            policy.minimum = minimum;
        }
        if let Some(max_failures) = self.max_failures {
            policy.max_failures = max_failures;
        }
        policy.jitter = self.jitter.unwrap_or(false);
        policy.strategy = self.strategy.unwrap_or_default();
        policy.max_delay = self.max_delay;
        if let Some(source) = self.source {
            policy.source = source;
        }
        policy
    }
}
