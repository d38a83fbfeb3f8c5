//! Connector trait
//!
//! The dialer never opens sockets itself. It drives a [`Connector`], which
//! makes exactly one connection attempt per call.

use async_trait::async_trait;

/// A single-shot connection-establishment primitive
///
/// `network` and `address` are passed through untouched from the dialer, so
/// their meaning is up to the implementation. [`NetConnector`] understands
/// `tcp`/`udp` style names and `host:port` addresses.
///
/// [`NetConnector`]: crate::net::NetConnector
#[async_trait]
pub trait Connector: Send + Sync {
    /// Handle for an established connection
    type Connection: Send;

    /// Error for a failed attempt
    type Error: std::error::Error + Send + Sync + 'static;

    /// Make one connection attempt
    async fn connect(&self, network: &str, address: &str)
    -> Result<Self::Connection, Self::Error>;
}
