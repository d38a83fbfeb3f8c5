//! Backoff configuration.
//!
//! [`BackoffConfig`] is the serializable form of a [`BackoffPolicy`]. It can be
//! embedded in an application's own config file or read from the environment.
//!
//! ```rust
//! use redial_core::config::BackoffConfig;
//! use redial_core::retry::BackoffPolicy;
//! use std::time::Duration;
//!
//! let config = BackoffConfig {
//!     minimum_ms: 250,
//!     ..Default::default()
//! };
//! let policy = BackoffPolicy::try_from(config).unwrap();
//! assert_eq!(policy.minimum, Duration::from_millis(250));
//! ```

use crate::error::{ConfigError, Result};
use crate::retry::{BackoffPolicy, JitterStrategy};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;

/// Environment variable for [`BackoffConfig::minimum_ms`].
pub const ENV_MINIMUM_MS: &str = "REDIAL_MINIMUM_MS";
/// Environment variable for [`BackoffConfig::max_failures`].
pub const ENV_MAX_FAILURES: &str = "REDIAL_MAX_FAILURES";
/// Environment variable for [`BackoffConfig::jitter`].
pub const ENV_JITTER: &str = "REDIAL_JITTER";
/// Environment variable for [`BackoffConfig::jitter_strategy`].
pub const ENV_JITTER_STRATEGY: &str = "REDIAL_JITTER_STRATEGY";
/// Environment variable for [`BackoffConfig::max_delay_ms`].
pub const ENV_MAX_DELAY_MS: &str = "REDIAL_MAX_DELAY_MS";

/// Serializable backoff settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Minimum delay in milliseconds.
    pub minimum_ms: u64,

    /// Attempt budget for bounded retries.
    pub max_failures: u32,

    /// Randomize delays.
    pub jitter: bool,

    /// Jitter strategy (`floor_anchored` or `half_range`).
    pub jitter_strategy: JitterStrategy,

    /// Optional cap on the deterministic delay, in milliseconds.
    pub max_delay_ms: Option<u64>,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            minimum_ms: 100,
            max_failures: 5,
            jitter: false,
            jitter_strategy: JitterStrategy::FloorAnchored,
            max_delay_ms: None,
        }
    }
}

impl BackoffConfig {
    /// Load configuration from environment variables on top of the defaults.
    ///
    /// This will look for:
    /// - `REDIAL_MINIMUM_MS` minimum delay in milliseconds
    /// - `REDIAL_MAX_FAILURES` attempt budget
    /// - `REDIAL_JITTER` `true`/`false`/`1`/`0`
    /// - `REDIAL_JITTER_STRATEGY` `floor_anchored` or `half_range`
    /// - `REDIAL_MAX_DELAY_MS` delay cap in milliseconds
    ///
    /// Unset variables keep their defaults; set but unparsable ones are an
    /// error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(minimum_ms) = env_parse(ENV_MINIMUM_MS)? {
            config.minimum_ms = minimum_ms;
        }
        if let Some(max_failures) = env_parse(ENV_MAX_FAILURES)? {
            config.max_failures = max_failures;
        }
        if let Some(raw) = env_var(ENV_JITTER) {
            config.jitter = parse_bool(&raw).ok_or(ConfigError::InvalidEnv {
                var: ENV_JITTER,
                value: raw,
            })?;
        }
        if let Some(strategy) = env_parse(ENV_JITTER_STRATEGY)? {
            config.jitter_strategy = strategy;
        }
        if let Some(max_delay_ms) = env_parse(ENV_MAX_DELAY_MS)? {
            config.max_delay_ms = Some(max_delay_ms);
        }

        Ok(config)
    }

    /// Check the settings describe a usable policy.
    pub fn validate(&self) -> Result<()> {
        if self.minimum_ms == 0 {
            return Err(ConfigError::ZeroMinimum);
        }
        if self.max_failures == 0 {
            return Err(ConfigError::ZeroMaxFailures);
        }
        if let Some(max_delay_ms) = self.max_delay_ms
            && max_delay_ms < self.minimum_ms
        {
            return Err(ConfigError::MaxDelayBelowMinimum {
                minimum_ms: self.minimum_ms,
                max_delay_ms,
            });
        }
        Ok(())
    }
}

impl TryFrom<BackoffConfig> for BackoffPolicy {
    type Error = ConfigError;

    fn try_from(config: BackoffConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = BackoffPolicy::builder()
            .minimum(Duration::from_millis(config.minimum_ms))
            .max_failures(config.max_failures)
            .jitter(config.jitter)
            .strategy(config.jitter_strategy);
        if let Some(max_delay_ms) = config.max_delay_ms {
            builder = builder.max_delay(Duration::from_millis(max_delay_ms));
        }
        Ok(builder.build())
    }
}

impl FromStr for JitterStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "floor_anchored" | "floor" => Ok(JitterStrategy::FloorAnchored),
            "half_range" | "half" => Ok(JitterStrategy::HalfRange),
            other => Err(format!("unknown jitter strategy: {}", other)),
        }
    }
}

fn env_var(var: &'static str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: FromStr>(var: &'static str) -> Result<Option<T>> {
    match env_var(var) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv { var, value: raw }),
        None => Ok(None),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
