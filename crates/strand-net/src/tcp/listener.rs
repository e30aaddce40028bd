//! Payload callbacks.

use bytes::Bytes;

use super::endpoint::RemoteEndpoint;

/// Receives payload events from a [`TcpClient`](super::TcpClient).
///
/// All callbacks run synchronously on the event loop thread, so they should
/// return quickly. Every method has a no-op default.
pub trait ClientListener: Send + Sync {
    /// A chunk of bytes arrived. Chunks carry no framing and are at most the
    /// configured read buffer size.
    ///
    /// The socket is drained on every readiness event, so one event may
    /// deliver several chunks back to back when more data is waiting than
    /// fits in the read buffer.
    fn on_received(&self, endpoint: &RemoteEndpoint, chunk: Bytes) {
        let _ = (endpoint, chunk);
    }

    /// A write call accepted `count` bytes.
    fn on_sent(&self, endpoint: &RemoteEndpoint, count: usize) {
        let _ = (endpoint, count);
    }

    /// Connecting or writing failed; the connection is being torn down.
    fn on_send_failed(&self, endpoint: &RemoteEndpoint) {
        let _ = endpoint;
    }
}

/// Listener used when the caller does not supply one.
pub(crate) struct NoopListener;

impl ClientListener for NoopListener {}
