#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Exponential backoff for retrying fallible operations.
//!
//! This crate computes growing, optionally jittered delays between attempts
//! and runs retry loops on top of them:
//!
//! - **Delay calculation** via [`BackoffPolicy::delay`]: `minimum * 2^n`,
//!   with half-range or floor-anchored jitter
//! - **Bounded retry** via [`BackoffPolicy::execute`] (tokio timer) and
//!   [`BackoffPolicy::execute_blocking`] (thread sleep), with the failure
//!   counter kept on the call stack
//! - **Stateful backoff** via [`Backoff`], which owns its failure counter
//!   until an explicit [`Backoff::reset`]
//! - **Configuration** via [`BackoffConfig`], from TOML/serde or the
//!   environment
//!
//! Errors from the retried operation are never wrapped: when the budget runs
//! out the last error comes back exactly as the operation produced it.
//!
//! With the `tracing` feature enabled, retry loops emit `debug!` events per
//! failed attempt and a `warn!` on exhaustion.
//!
//! # Examples
//!
//! Using the prelude for convenient imports:
//!
//! ```rust
//! use redial_core::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let policy = BackoffPolicy::builder()
//!     .max_failures(3)
//!     .minimum(Duration::from_millis(100))
//!     .build();
//!
//! let result = policy.execute(|| async {
//!     Ok::<_, std::io::Error>(42)
//! }).await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`BackoffPolicy::delay`]: retry::BackoffPolicy::delay
//! [`BackoffPolicy::execute`]: retry::BackoffPolicy::execute
//! [`BackoffPolicy::execute_blocking`]: retry::BackoffPolicy::execute_blocking
//! [`Backoff`]: retry::Backoff
//! [`Backoff::reset`]: retry::Backoff::reset
//! [`BackoffConfig`]: config::BackoffConfig

pub mod config;
pub mod error;
pub mod retry;

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use redial_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::BackoffConfig;
    pub use crate::error::ConfigError;
    pub use crate::retry::{
        Backoff, BackoffPolicy, BackoffPolicyBuilder, JitterSource, JitterStrategy, SeededSource,
        ThreadRngSource,
    };
}
