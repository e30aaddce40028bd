//! Error types for the networking module.

use std::io;

use thiserror::Error;

use crate::tcp::RemoteEndpoint;

/// Network-specific errors.
///
/// The first four variants are the ways an event loop run can end. They all
/// lead through the same teardown to `Disconnected`; none of them reconnects.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The asynchronous connect did not complete (refused, unreachable,
    /// unresolvable host).
    #[error("Connection to {endpoint} failed: {source}")]
    Connect {
        /// The peer that could not be reached.
        endpoint: RemoteEndpoint,
        /// The underlying transport error.
        #[source]
        source: io::Error,
    },
    /// A read returned no data (peer closed) or failed.
    #[error("Read from {endpoint} failed: {source}")]
    Read {
        /// The peer being read from.
        endpoint: RemoteEndpoint,
        /// The underlying transport error.
        #[source]
        source: io::Error,
    },
    /// A write raised a transport error.
    #[error("Write to {endpoint} failed: {source}")]
    Write {
        /// The peer being written to.
        endpoint: RemoteEndpoint,
        /// The underlying transport error.
        #[source]
        source: io::Error,
    },
    /// The connection was closed by the caller.
    #[error("Connection was cancelled")]
    Cancelled,
    /// Host or port text could not be turned into an endpoint.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// I/O error outside of a connection (poller, waker, thread spawn).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl NetworkError {
    /// Whether this is a transport failure rather than a caller-requested stop.
    pub fn is_failure(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }

    /// Whether the listener is told about this error through `on_send_failed`.
    ///
    /// Connect and write failures are reported; a read failure (including a
    /// peer close) only ends the connection.
    pub fn notifies_send_failed(&self) -> bool {
        matches!(self, Self::Connect { .. } | Self::Write { .. })
    }
}

/// A specialized Result type for network operations.
pub type Result<T> = std::result::Result<T, NetworkError>;
