//! Single-connection TCP client on a readiness event loop.
//!
//! Each [`TcpClient`] owns at most one connection at a time. While connected,
//! a dedicated thread multiplexes connect completion, reads and writes for the
//! socket through a `mio` poller. Callers interact only through the facade:
//!
//! - [`TcpClient::send`] queues bytes from any thread and connects on demand
//! - [`TcpClient::close`] cancels the loop and discards unsent data
//! - [`ClientListener`] receives chunks and write results on the loop thread
//! - [`TcpClient::state_changed`] publishes every [`ConnectionState`] change
//!
//! # Example
//!
//! ```ignore
//! use strand_net::tcp::{TcpClient, TcpClientConfig, WritePolicy};
//!
//! let config = TcpClientConfig::new("127.0.0.1", 8080)
//!     .no_delay(true)
//!     .write_policy(WritePolicy::Complete);
//!
//! let client = TcpClient::new(config);
//!
//! client.state_changed.connect(|change| {
//!     println!("{}: {}", change.endpoint, change.state);
//! });
//!
//! client.connect()?;
//! client.send(&b"Hello, Server!"[..])?;
//! ```
//!
//! There is no retry policy: a failed or dropped connection ends in
//! `Disconnected`, and the next `send` or `connect` starts a fresh one.

mod client;
mod config;
mod endpoint;
mod event_loop;
mod handlers;
mod listener;
mod queue;
mod state;

pub use client::TcpClient;
pub use config::{
    DEFAULT_EVENT_CAPACITY, DEFAULT_READ_BUFFER_SIZE, TcpClientConfig, TcpSocketConfig,
    WritePolicy,
};
pub use endpoint::RemoteEndpoint;
pub use listener::ClientListener;
pub use state::{ConnectionState, StateChange};
