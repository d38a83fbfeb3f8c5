//! Exponential backoff and retry execution.
//!
//! # Key Types
//!
//! - [`BackoffPolicy`] - delay calculation and bounded retry with a
//!   stack-local failure counter, safe to share between concurrent loops
//! - [`Backoff`] - the same policy with an instance-owned counter and an
//!   explicit [`Backoff::reset`]
//! - [`JitterStrategy`] / [`JitterSource`] - how delays are randomized and
//!   where the randomness comes from
//!
//! # Examples
//!
//! ```rust
//! use redial_core::retry::BackoffPolicy;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), std::io::Error> {
//! let policy = BackoffPolicy::builder()
//!     .minimum(Duration::from_millis(100))
//!     .max_failures(5)
//!     .jitter(true)
//!     .build();
//!
//! let result = policy.execute(|| async {
//!     // Your operation here
//!     Ok::<_, std::io::Error>(42)
//! }).await?;
//! # Ok(())
//! # }
//! ```

mod jitter;
mod policy;
mod stateful;

pub use jitter::{JitterSource, JitterStrategy, SeededSource, ThreadRngSource};
pub use policy::{BackoffPolicy, BackoffPolicyBuilder};
pub use stateful::Backoff;
