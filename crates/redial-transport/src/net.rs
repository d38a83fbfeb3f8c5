//! TCP and UDP connector on `tokio::net`
//!
//! Supported networks:
//! - `tcp`, `udp`: any address family
//! - `tcp4`, `udp4`: IPv4 only
//! - `tcp6`, `udp6`: IPv6 only
//!
//! Addresses are `host:port` and go through the system resolver. Every
//! resolved address of the right family is tried in order; the error from the
//! last one is returned if none connect.

use crate::error::{ConnectError, Result};
use crate::traits::Connector;
use async_trait::async_trait;
use std::fmt;
use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use tokio::net::{TcpStream, UdpSocket, lookup_host};

/// Network name understood by [`NetConnector`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Network {
    /// TCP over IPv4 or IPv6
    Tcp,
    /// TCP over IPv4
    Tcp4,
    /// TCP over IPv6
    Tcp6,
    /// UDP over IPv4 or IPv6
    Udp,
    /// UDP over IPv4
    Udp4,
    /// UDP over IPv6
    Udp6,
}

impl Network {
    /// Whether this is a datagram network
    pub fn is_udp(&self) -> bool {
        matches!(self, Network::Udp | Network::Udp4 | Network::Udp6)
    }

    /// Whether `addr` belongs to this network's address family
    pub fn accepts(&self, addr: &SocketAddr) -> bool {
        match self {
            Network::Tcp | Network::Udp => true,
            Network::Tcp4 | Network::Udp4 => addr.is_ipv4(),
            Network::Tcp6 | Network::Udp6 => addr.is_ipv6(),
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Network::Tcp => "tcp",
            Network::Tcp4 => "tcp4",
            Network::Tcp6 => "tcp6",
            Network::Udp => "udp",
            Network::Udp4 => "udp4",
            Network::Udp6 => "udp6",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = ConnectError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "tcp" => Ok(Network::Tcp),
            "tcp4" => Ok(Network::Tcp4),
            "tcp6" => Ok(Network::Tcp6),
            "udp" => Ok(Network::Udp),
            "udp4" => Ok(Network::Udp4),
            "udp6" => Ok(Network::Udp6),
            other => Err(ConnectError::UnsupportedNetwork(other.to_string())),
        }
    }
}

/// An established connection
#[derive(Debug)]
pub enum NetConnection {
    /// Connected TCP stream
    Tcp(TcpStream),
    /// UDP socket connected to a single peer
    Udp(UdpSocket),
}

impl NetConnection {
    /// Remote address
    pub fn peer_addr(&self) -> io::Result<SocketAddr> {
        match self {
            NetConnection::Tcp(stream) => stream.peer_addr(),
            NetConnection::Udp(socket) => socket.peer_addr(),
        }
    }

    /// Local address
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        match self {
            NetConnection::Tcp(stream) => stream.local_addr(),
            NetConnection::Udp(socket) => socket.local_addr(),
        }
    }

    /// The TCP stream, if this is a TCP connection
    pub fn into_tcp(self) -> Option<TcpStream> {
        match self {
            NetConnection::Tcp(stream) => Some(stream),
            NetConnection::Udp(_) => None,
        }
    }

    /// The UDP socket, if this is a UDP connection
    pub fn into_udp(self) -> Option<UdpSocket> {
        match self {
            NetConnection::Udp(socket) => Some(socket),
            NetConnection::Tcp(_) => None,
        }
    }
}

/// [`Connector`] backed by the operating system's sockets
///
/// # Examples
///
/// ```rust,no_run
/// use redial_transport::{Connector, NetConnector};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let connector = NetConnector::new().with_connect_timeout(Duration::from_secs(2));
/// let conn = connector.connect("tcp", "example.org:80").await?;
/// println!("connected to {}", conn.peer_addr()?);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct NetConnector {
    connect_timeout: Option<Duration>,
}

impl NetConnector {
    /// Create a connector with no per-attempt timeout
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound each connection attempt (per resolved address) by `timeout`
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Per-attempt timeout, if any
    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    async fn connect_addr(&self, network: Network, addr: SocketAddr) -> Result<NetConnection> {
        match self.connect_timeout {
            Some(timeout) => tokio::time::timeout(timeout, open(network, addr))
                .await
                .map_err(|_| ConnectError::Timeout {
                    address: addr.to_string(),
                    timeout,
                })?
                .map_err(ConnectError::from),
            None => open(network, addr).await.map_err(ConnectError::from),
        }
    }
}

async fn open(network: Network, addr: SocketAddr) -> io::Result<NetConnection> {
    if !network.is_udp() {
        return Ok(NetConnection::Tcp(TcpStream::connect(addr).await?));
    }

    let local: SocketAddr = if addr.is_ipv4() {
        (Ipv4Addr::UNSPECIFIED, 0).into()
    } else {
        (Ipv6Addr::UNSPECIFIED, 0).into()
    };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(addr).await?;
    Ok(NetConnection::Udp(socket))
}

#[async_trait]
impl Connector for NetConnector {
    type Connection = NetConnection;
    type Error = ConnectError;

    async fn connect(&self, network: &str, address: &str) -> Result<NetConnection> {
        let network: Network = network.parse()?;

        let mut last_error = None;
        for addr in lookup_host(address).await? {
            if !network.accepts(&addr) {
                continue;
            }
            match self.connect_addr(network, addr).await {
                Ok(conn) => return Ok(conn),
                Err(err) => {
                    tracing::trace!(%network, %addr, error = %err, "candidate address failed");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ConnectError::NoAddress {
            network,
            address: address.to_string(),
        }))
    }
}
