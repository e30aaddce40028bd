//! Outbound send queue.

use bytes::Bytes;
use crossbeam_channel::{Receiver, Sender, unbounded};

/// Multi-producer FIFO of outbound buffers.
///
/// Any thread may push; only the event loop pops. The queue outlives
/// individual connections so data sent before `connect()` is kept.
pub(crate) struct SendQueue {
    tx: Sender<Bytes>,
    rx: Receiver<Bytes>,
}

impl SendQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    pub(crate) fn push(&self, data: Bytes) {
        // Both ends live in `self`, so the channel cannot be disconnected.
        let _ = self.tx.send(data);
    }

    pub(crate) fn pop(&self) -> Option<Bytes> {
        self.rx.try_recv().ok()
    }

    pub(crate) fn len(&self) -> usize {
        self.rx.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }

    /// Drop everything queued, returning how many buffers were discarded.
    pub(crate) fn clear(&self) -> usize {
        self.rx.try_iter().count()
    }
}
