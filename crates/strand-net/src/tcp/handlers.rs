//! Read and write handlers run by the event loop on readiness.
//!
//! Both are generic over `Read`/`Write` so they can be exercised against
//! scripted sources in tests. Readiness is edge-triggered, so each handler
//! keeps going until the socket reports `WouldBlock`.

use std::io::{self, Read, Write};

use bytes::Bytes;
use strand_core::logging::targets;
use strand_core::{CancellationToken, HexDump};
use tracing::{trace, warn};

use super::config::WritePolicy;
use super::endpoint::RemoteEndpoint;
use super::listener::ClientListener;
use super::queue::SendQueue;
use crate::error::{NetworkError, Result};

/// What a handler needs to report events and notice a close.
pub(crate) struct HandlerContext<'a> {
    pub(crate) endpoint: &'a RemoteEndpoint,
    pub(crate) listener: &'a dyn ClientListener,
    pub(crate) cancel: &'a CancellationToken,
}

impl HandlerContext<'_> {
    fn read_error(&self, source: io::Error) -> NetworkError {
        NetworkError::Read {
            endpoint: self.endpoint.clone(),
            source,
        }
    }

    fn write_error(&self, source: io::Error) -> NetworkError {
        NetworkError::Write {
            endpoint: self.endpoint.clone(),
            source,
        }
    }
}

/// Where the write handler stopped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WriteProgress {
    /// Queue and remainder are empty.
    Drained,
    /// The socket would block; the head buffer is parked in `pending`.
    Blocked,
}

/// Read until the source would block, delivering one chunk per read.
///
/// A single call can therefore hand several chunks to the listener.
///
/// A zero-length read means the peer closed its side and is reported as a
/// read failure.
pub(crate) fn drain_reads<R: Read>(
    source: &mut R,
    scratch: &mut [u8],
    ctx: &HandlerContext<'_>,
) -> Result<()> {
    loop {
        if ctx.cancel.is_cancelled() {
            return Err(NetworkError::Cancelled);
        }

        match source.read(scratch) {
            Ok(0) => {
                return Err(ctx.read_error(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed by peer",
                )));
            }
            Ok(n) => {
                let chunk = Bytes::copy_from_slice(&scratch[..n]);
                trace!(
                    target: targets::EVENT_LOOP,
                    endpoint = %ctx.endpoint,
                    len = n,
                    data = %HexDump(&chunk),
                    "received"
                );
                ctx.listener.on_received(ctx.endpoint, chunk);
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(ctx.read_error(e)),
        }
    }
}

/// Write queued buffers until the queue is empty or the sink would block.
///
/// `pending` holds a buffer that must go out before anything else in the
/// queue: one that hit `WouldBlock`, or the remainder of a short write under
/// [`WritePolicy::Complete`].
pub(crate) fn drain_writes<W: Write>(
    sink: &mut W,
    queue: &SendQueue,
    pending: &mut Option<Bytes>,
    policy: WritePolicy,
    ctx: &HandlerContext<'_>,
) -> Result<WriteProgress> {
    loop {
        if ctx.cancel.is_cancelled() {
            return Err(NetworkError::Cancelled);
        }

        let Some(buf) = pending.take().or_else(|| queue.pop()) else {
            return Ok(WriteProgress::Drained);
        };

        match sink.write(&buf) {
            Ok(0) if !buf.is_empty() => {
                return Err(ctx.write_error(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "socket accepted no bytes",
                )));
            }
            Ok(n) => {
                trace!(
                    target: targets::EVENT_LOOP,
                    endpoint = %ctx.endpoint,
                    len = n,
                    data = %HexDump(&buf[..n]),
                    "sent"
                );
                ctx.listener.on_sent(ctx.endpoint, n);

                if n < buf.len() {
                    match policy {
                        WritePolicy::SingleWrite => warn!(
                            target: targets::EVENT_LOOP,
                            endpoint = %ctx.endpoint,
                            written = n,
                            dropped = buf.len() - n,
                            "short write, remainder discarded"
                        ),
                        WritePolicy::Complete => *pending = Some(buf.slice(n..)),
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                *pending = Some(buf);
                return Ok(WriteProgress::Blocked);
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {
                *pending = Some(buf);
            }
            Err(e) => return Err(ctx.write_error(e)),
        }
    }
}
