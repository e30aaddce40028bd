//! Networking module for Strand.
//!
//! This crate provides a single-connection TCP client driven by a dedicated
//! readiness event loop:
//!
//! - **TcpClient**: connect, queue outbound bytes from any thread, close
//! - **ClientListener**: payload callbacks (received, sent, send failed)
//! - **State notifications**: a [`Signal`](strand_core::Signal) carrying every
//!   connection state transition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use bytes::Bytes;
//! use strand_net::tcp::{ClientListener, RemoteEndpoint, TcpClient, TcpClientConfig};
//!
//! struct Printer;
//!
//! impl ClientListener for Printer {
//!     fn on_received(&self, endpoint: &RemoteEndpoint, chunk: Bytes) {
//!         println!("{endpoint}: {} bytes", chunk.len());
//!     }
//! }
//!
//! let client = TcpClient::with_listener(
//!     TcpClientConfig::new("127.0.0.1", 9000),
//!     Arc::new(Printer),
//! );
//!
//! client.state_changed.connect(|change| {
//!     println!("{} is now {}", change.endpoint, change.state);
//! });
//!
//! // Queued until the connection is up, then written in order.
//! client.send("hello")?;
//! # Ok::<(), strand_net::NetworkError>(())
//! ```
//!
//! There is no framing: bytes are delivered to the listener in chunks of at
//! most the configured read buffer size, exactly as they come off the socket.

mod error;
pub mod tcp;

pub use error::{NetworkError, Result};

// Re-export commonly used types at the crate root
pub use tcp::{
    ClientListener, ConnectionState, RemoteEndpoint, StateChange, TcpClient, TcpClientConfig,
    TcpSocketConfig, WritePolicy,
};
