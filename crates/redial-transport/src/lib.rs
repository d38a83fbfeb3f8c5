//! Connection dialing with exponential backoff
//!
//! Applies a [`redial_core`] backoff policy to connection establishment.
//!
//! # Architecture
//!
//! - **Connector trait**: one connection attempt, no retries
//! - **NetConnector**: TCP/UDP over `tokio::net`

#![deny(unsafe_code)]
#![warn(missing_docs)]
//! - **Dialer**: retries a connector forever, until cancelled, or within a
//!   failure budget
//! - **Error handling**: connector errors pass through unchanged; only
//!   cancellation adds its own error type
//!
//! # Usage
//!
//! ```no_run
//! use redial_core::retry::BackoffPolicy;
//! use redial_transport::{Dialer, NetConnector};
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let dialer = Dialer::new(
//!     NetConnector::new(),
//!     BackoffPolicy::new(Duration::from_millis(100), 5),
//! );
//!
//! let shutdown = CancellationToken::new();
//! let conn = dialer.dial_until("tcp", "127.0.0.1:6379", &shutdown).await?;
//! # Ok(())
//! # }
//! ```

pub mod dialer;
pub mod error;
pub mod net;
pub mod traits;

// Re-export commonly used types
pub use dialer::Dialer;
pub use error::{ConnectError, DialCancelled, Result};
pub use net::{NetConnection, NetConnector, Network};
pub use traits::Connector;
