//! The per-connection readiness loop.

use std::io;
use std::sync::Arc;

use bytes::Bytes;
use mio::net::TcpStream;
use mio::{Events, Interest, Poll, Token};
use strand_core::CancellationToken;
use strand_core::logging::targets;
use tracing::{debug, info, warn};

use super::client::ClientShared;
use super::handlers::{self, HandlerContext, WriteProgress};
use super::state::ConnectionState;
use crate::error::{NetworkError, Result};

pub(crate) const SOCKET: Token = Token(0);
pub(crate) const WAKER: Token = Token(1);

/// Owns the socket and poller of one connection attempt.
///
/// Runs on its own thread from `connect()` until the connection ends, then
/// tears everything down. Nothing else touches the socket.
pub(crate) struct EventLoop {
    shared: Arc<ClientShared>,
    cancel: CancellationToken,
    epoch: u64,
    poll: Poll,
    events: Events,
    stream: Option<TcpStream>,
    interest: Interest,
    scratch: Box<[u8]>,
    pending: Option<Bytes>,
    connected: bool,
}

impl EventLoop {
    pub(crate) fn new(
        shared: Arc<ClientShared>,
        cancel: CancellationToken,
        epoch: u64,
        poll: Poll,
    ) -> Self {
        let events = Events::with_capacity(shared.config.event_capacity);
        let scratch = vec![0u8; shared.config.socket.read_buffer_size].into_boxed_slice();
        Self {
            shared,
            cancel,
            epoch,
            poll,
            events,
            stream: None,
            interest: Interest::WRITABLE,
            scratch,
            pending: None,
            connected: false,
        }
    }

    pub(crate) fn run(mut self) {
        let shared = self.shared.clone();
        let endpoint = shared.endpoint();
        let _span = tracing::info_span!(
            target: targets::EVENT_LOOP,
            "tcp_event_loop",
            %endpoint,
            epoch = self.epoch
        )
        .entered();

        if shared.is_current(self.epoch) {
            shared.publish(ConnectionState::Connecting);
        }

        match self.drive() {
            Ok(()) | Err(NetworkError::Cancelled) => {
                debug!(target: targets::EVENT_LOOP, "event loop stopped");
            }
            Err(e) => {
                warn!(target: targets::EVENT_LOOP, error = %e, "connection ended");
                if e.notifies_send_failed() {
                    shared.listener.on_send_failed(endpoint);
                }
            }
        }

        self.teardown();
    }

    fn drive(&mut self) -> Result<()> {
        let endpoint = self.shared.endpoint().clone();
        let connect_error = |source: io::Error| NetworkError::Connect {
            endpoint: endpoint.clone(),
            source,
        };

        let addr = endpoint.resolve().map_err(connect_error)?;
        let mut stream = TcpStream::connect(addr).map_err(connect_error)?;
        self.poll
            .registry()
            .register(&mut stream, SOCKET, Interest::WRITABLE)?;
        self.stream = Some(stream);
        debug!(target: targets::EVENT_LOOP, %addr, "connect in flight");

        while self.shared.is_active(self.epoch) {
            if let Err(e) = self.poll.poll(&mut self.events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e.into());
            }

            if self.cancel.is_cancelled() {
                return Err(NetworkError::Cancelled);
            }

            let mut readable = false;
            let mut writable = false;
            for event in self.events.iter() {
                if event.token() == SOCKET {
                    readable |= event.is_readable() || event.is_read_closed() || event.is_error();
                    writable |= event.is_writable() || event.is_write_closed() || event.is_error();
                }
            }

            let mut progress = None;
            if !self.connected {
                if readable || writable {
                    self.on_connect_ready()?;
                }
            } else {
                // Writes go first: while data is outbound, a transport error
                // surfaces as a write failure.
                if writable {
                    progress = Some(self.on_writable()?);
                }
                if readable {
                    self.on_readable()?;
                }
            }

            self.update_interest(progress)?;
        }

        Ok(())
    }

    fn on_connect_ready(&mut self) -> Result<()> {
        let endpoint = self.shared.endpoint();
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        let connect_error = |source: io::Error| NetworkError::Connect {
            endpoint: endpoint.clone(),
            source,
        };

        match stream.take_error() {
            Ok(Some(e)) | Err(e) => return Err(connect_error(e)),
            Ok(None) => {}
        }

        let peer = match stream.peer_addr() {
            Ok(peer) => peer,
            Err(e) if e.kind() == io::ErrorKind::NotConnected => return Ok(()),
            Err(e) => return Err(connect_error(e)),
        };

        if self.shared.config.socket.no_delay
            && let Err(e) = stream.set_nodelay(true)
        {
            warn!(target: targets::EVENT_LOOP, error = %e, "failed to set TCP_NODELAY");
        }

        self.poll
            .registry()
            .reregister(stream, SOCKET, Interest::READABLE)?;
        self.interest = Interest::READABLE;
        self.connected = true;

        if !self.shared.transition(
            self.epoch,
            ConnectionState::Connecting,
            ConnectionState::Connected,
        ) {
            return Err(NetworkError::Cancelled);
        }

        info!(target: targets::EVENT_LOOP, %peer, "connected");
        self.shared.publish(ConnectionState::Connected);
        Ok(())
    }

    fn on_readable(&mut self) -> Result<()> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };
        let ctx = HandlerContext {
            endpoint: self.shared.endpoint(),
            listener: self.shared.listener.as_ref(),
            cancel: &self.cancel,
        };
        handlers::drain_reads(stream, &mut self.scratch, &ctx)
    }

    fn on_writable(&mut self) -> Result<WriteProgress> {
        let Some(stream) = self.stream.as_mut() else {
            return Ok(WriteProgress::Drained);
        };
        let ctx = HandlerContext {
            endpoint: self.shared.endpoint(),
            listener: self.shared.listener.as_ref(),
            cancel: &self.cancel,
        };
        handlers::drain_writes(
            stream,
            &self.shared.queue,
            &mut self.pending,
            self.shared.config.socket.write_policy,
            &ctx,
        )
    }

    /// Ask for writable readiness only while there is something to write.
    fn update_interest(&mut self, progress: Option<WriteProgress>) -> Result<()> {
        if !self.connected {
            return Ok(());
        }
        let Some(stream) = self.stream.as_mut() else {
            return Ok(());
        };

        let outbound = match progress {
            Some(WriteProgress::Blocked) => true,
            _ => self.pending.is_some() || !self.shared.queue.is_empty(),
        };
        let wanted = if outbound {
            Interest::READABLE | Interest::WRITABLE
        } else {
            Interest::READABLE
        };

        if wanted != self.interest {
            self.poll.registry().reregister(stream, SOCKET, wanted)?;
            self.interest = wanted;
        }
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = self.poll.registry().deregister(&mut stream) {
                debug!(target: targets::EVENT_LOOP, error = %e, "deregister failed");
            }
        }
        self.pending = None;

        match self.shared.finish_run(self.epoch) {
            Some(discarded) => {
                if discarded > 0 {
                    debug!(target: targets::EVENT_LOOP, discarded, "dropped unsent data");
                }
                self.shared.publish(ConnectionState::Disconnected);
            }
            None => {
                debug!(target: targets::EVENT_LOOP, "run superseded, leaving state alone");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tcp::config::TcpClientConfig;
    use crate::tcp::listener::NoopListener;
    use crate::tcp::state::StateChange;
    use parking_lot::Mutex;
    use strand_core::Signal;

    fn shared_with_log() -> (Arc<ClientShared>, Arc<Mutex<Vec<ConnectionState>>>) {
        let signal = Arc::new(Signal::<StateChange>::new());
        let log = Arc::new(Mutex::new(Vec::new()));
        let log_clone = log.clone();
        signal.connect(move |change| log_clone.lock().push(change.state));

        let shared = Arc::new(ClientShared::new(
            TcpClientConfig::new("127.0.0.1", 9),
            Arc::new(NoopListener),
            signal,
        ));
        (shared, log)
    }

    fn event_loop_for(shared: &Arc<ClientShared>, epoch: u64) -> EventLoop {
        EventLoop::new(
            shared.clone(),
            CancellationToken::new(),
            epoch,
            Poll::new().unwrap(),
        )
    }

    #[test]
    fn test_teardown_discards_queue_and_publishes() {
        let (shared, log) = shared_with_log();
        shared.queue.push(Bytes::from_static(b"unsent"));
        let epoch = shared.begin_run().unwrap();

        event_loop_for(&shared, epoch).teardown();

        assert_eq!(shared.state(), ConnectionState::Disconnected);
        assert!(shared.queue.is_empty());
        assert_eq!(*log.lock(), vec![ConnectionState::Disconnected]);
    }

    #[test]
    fn test_send_after_disconnect_survives_teardown() {
        let (shared, _log) = shared_with_log();
        shared.queue.push(Bytes::from_static(b"stale"));
        let epoch = shared.begin_run().unwrap();
        let mut event_loop = event_loop_for(&shared, epoch);

        // The queue is emptied together with the state change.
        assert_eq!(shared.finish_run(epoch), Some(1));
        assert_eq!(shared.state(), ConnectionState::Disconnected);

        // A caller that saw Disconnected queues data while the old loop unwinds.
        shared.queue.push(Bytes::from_static(b"marker"));
        event_loop.teardown();

        assert_eq!(shared.queue.len(), 1);
        assert_eq!(shared.queue.pop().as_deref(), Some(&b"marker"[..]));
    }

    #[test]
    fn test_superseded_teardown_leaves_new_run_alone() {
        let (shared, log) = shared_with_log();
        let old_epoch = shared.begin_run().unwrap();
        let mut old_loop = event_loop_for(&shared, old_epoch);
        assert_eq!(shared.finish_run(old_epoch), Some(0));

        let new_epoch = shared.begin_run().unwrap();
        assert_ne!(new_epoch, old_epoch);
        shared.queue.push(Bytes::from_static(b"next"));

        old_loop.teardown();

        assert_eq!(shared.state(), ConnectionState::Connecting);
        assert_eq!(shared.queue.len(), 1);
        assert!(log.lock().is_empty());
    }
}
