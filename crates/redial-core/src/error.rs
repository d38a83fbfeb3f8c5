//! Configuration errors.
//!
//! Retry operations never produce errors of their own: the caller's error is
//! handed back unchanged. Only building a policy from configuration can fail.

use thiserror::Error;

/// Errors raised while validating or loading a [`BackoffConfig`](crate::config::BackoffConfig).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// `minimum_ms` was zero, which would make every delay zero.
    #[error("minimum delay must be greater than zero")]
    ZeroMinimum,

    /// `max_failures` was zero.
    #[error("max_failures must be at least 1")]
    ZeroMaxFailures,

    /// `max_delay_ms` was set below `minimum_ms`.
    #[error("max delay ({max_delay_ms}ms) is below the minimum delay ({minimum_ms}ms)")]
    MaxDelayBelowMinimum {
        /// Configured minimum delay in milliseconds.
        minimum_ms: u64,
        /// Configured cap in milliseconds.
        max_delay_ms: u64,
    },

    /// An environment variable held a value that could not be parsed.
    #[error("invalid value {value:?} for {var}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value found in the environment.
        value: String,
    },
}

/// Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;
