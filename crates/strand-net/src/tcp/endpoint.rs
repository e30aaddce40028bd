//! Remote peer addressing.

use std::fmt;
use std::io;
use std::net::{SocketAddr, ToSocketAddrs};

use crate::error::{NetworkError, Result};

/// Host/port pair identifying the peer of a client.
///
/// The host is kept as given (name or literal address); resolution happens on
/// the event loop thread each time a connection is opened.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RemoteEndpoint {
    host: String,
    port: u16,
}

impl RemoteEndpoint {
    /// Create an endpoint from a host and port.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Build an endpoint from user-entered text.
    ///
    /// Both fields are trimmed. An empty host or a port that is not a number
    /// in `1..=65535` is rejected.
    pub fn parse(host: &str, port: &str) -> Result<Self> {
        let host = host.trim();
        if host.is_empty() {
            return Err(NetworkError::InvalidEndpoint("host is empty".into()));
        }

        let port = port.trim();
        let port: u16 = port
            .parse()
            .map_err(|_| NetworkError::InvalidEndpoint(format!("port '{port}' is not a number")))?;
        if port == 0 {
            return Err(NetworkError::InvalidEndpoint("port must not be 0".into()));
        }

        Ok(Self::new(host, port))
    }

    /// The host this endpoint points at.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The port this endpoint points at.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Resolve to the first socket address for this host and port.
    ///
    /// This may block on DNS; it is only called from the event loop thread.
    pub fn resolve(&self) -> io::Result<SocketAddr> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no address found for {self}"),
                )
            })
    }
}

impl fmt::Display for RemoteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl From<SocketAddr> for RemoteEndpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}
