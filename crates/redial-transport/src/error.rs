//! Transport error types

use crate::net::Network;
use std::time::Duration;
use thiserror::Error;

/// Result type for connection attempts made by [`NetConnector`](crate::net::NetConnector)
pub type Result<T> = std::result::Result<T, ConnectError>;

/// Errors from a single connection attempt
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The network name is not one of `tcp`, `tcp4`, `tcp6`, `udp`, `udp4`, `udp6`
    #[error("unsupported network: {0}")]
    UnsupportedNetwork(String),

    /// The address resolved, but not to any address of the requested family
    #[error("no {network} address found for {address}")]
    NoAddress {
        /// Requested network
        network: Network,
        /// Address as given by the caller
        address: String,
    },

    /// The attempt did not finish within the connector's timeout
    #[error("connect to {address} timed out after {timeout:?}")]
    Timeout {
        /// Address being connected to
        address: String,
        /// Configured per-attempt timeout
        timeout: Duration,
    },

    /// Resolution or connection failed at the socket layer
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Returned by [`Dialer::dial_until`](crate::Dialer::dial_until) when the
/// cancellation token fires before a connection is established
#[derive(Debug, Error)]
#[error("dial {network} {address} cancelled after {attempts} attempt(s)")]
pub struct DialCancelled<E> {
    /// Network passed to the dialer
    pub network: String,
    /// Address passed to the dialer
    pub address: String,
    /// Connection attempts started, including one interrupted by cancellation
    pub attempts: u32,
    /// Error from the last attempt that completed, if any
    pub last_error: Option<E>,
}
