//! TCP client facade.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::{self, JoinHandle};

use bytes::Bytes;
use mio::{Poll, Waker};
use parking_lot::{Mutex, MutexGuard};
use strand_core::logging::targets;
use strand_core::{CancellationToken, Signal};
use tracing::{debug, info, trace};

use super::config::TcpClientConfig;
use super::endpoint::RemoteEndpoint;
use super::event_loop::{EventLoop, WAKER};
use super::listener::{ClientListener, NoopListener};
use super::queue::SendQueue;
use super::state::{AtomicConnectionState, ConnectionState, StateChange};
use crate::Result;

/// State shared between the facade and the event loop thread.
///
/// Each `connect()` that actually starts a loop opens a new run and tags it
/// with an epoch. State writes from a loop whose epoch is no longer current
/// are ignored, so an unwinding loop can never clobber a newer connection.
pub(crate) struct ClientShared {
    pub(crate) config: TcpClientConfig,
    pub(crate) queue: SendQueue,
    pub(crate) listener: Arc<dyn ClientListener>,
    state_changed: Arc<Signal<StateChange>>,
    state: AtomicConnectionState,
    epoch: AtomicU64,
    transition_lock: Mutex<()>,
}

impl ClientShared {
    pub(crate) fn new(
        config: TcpClientConfig,
        listener: Arc<dyn ClientListener>,
        state_changed: Arc<Signal<StateChange>>,
    ) -> Self {
        Self {
            config,
            queue: SendQueue::new(),
            listener,
            state_changed,
            state: AtomicConnectionState::default(),
            epoch: AtomicU64::new(0),
            transition_lock: Mutex::new(()),
        }
    }

    pub(crate) fn endpoint(&self) -> &RemoteEndpoint {
        &self.config.endpoint
    }

    pub(crate) fn state(&self) -> ConnectionState {
        self.state.load()
    }

    /// Claim `Connecting` for a new run. Returns the run's epoch, or `None` if
    /// the client was not disconnected.
    pub(crate) fn begin_run(&self) -> Option<u64> {
        let _guard = self.transition_lock.lock();
        if !self
            .state
            .transition(ConnectionState::Disconnected, ConnectionState::Connecting)
        {
            return None;
        }
        Some(self.epoch.fetch_add(1, Ordering::AcqRel) + 1)
    }

    /// Undo `begin_run` when the loop could not be started.
    fn abort_run(&self, epoch: u64) {
        let _guard = self.transition_lock.lock();
        if self.is_current(epoch) {
            self.state.store(ConnectionState::Disconnected);
        }
    }

    pub(crate) fn is_current(&self, epoch: u64) -> bool {
        self.epoch.load(Ordering::Acquire) == epoch
    }

    /// Whether the run tagged `epoch` should keep going.
    pub(crate) fn is_active(&self, epoch: u64) -> bool {
        self.is_current(epoch) && self.state() != ConnectionState::Disconnected
    }

    pub(crate) fn transition(
        &self,
        epoch: u64,
        from: ConnectionState,
        to: ConnectionState,
    ) -> bool {
        let _guard = self.transition_lock.lock();
        self.is_current(epoch) && self.state.transition(from, to)
    }

    /// Move an active client to `Disconnected`, discarding the send queue.
    ///
    /// The queue is cleared before the new state becomes visible, so a buffer
    /// pushed by a caller that already observed `Disconnected` is never lost.
    /// Returns the number of discarded buffers, or `None` if the client was
    /// not active.
    fn disconnect_locked(&self) -> Option<usize> {
        if self.state() == ConnectionState::Disconnected {
            return None;
        }
        let discarded = self.queue.clear();
        self.state.store(ConnectionState::Disconnected);
        Some(discarded)
    }

    /// Force `Disconnected` from the caller side.
    fn force_disconnected(&self) -> Option<usize> {
        let _guard = self.transition_lock.lock();
        self.disconnect_locked()
    }

    /// Final state write of a run.
    ///
    /// Returns `None` if the run was superseded. Otherwise returns how many
    /// queued buffers were discarded; that is zero when `close()` already
    /// ended the connection and emptied the queue.
    pub(crate) fn finish_run(&self, epoch: u64) -> Option<usize> {
        let _guard = self.transition_lock.lock();
        if !self.is_current(epoch) {
            return None;
        }
        Some(self.disconnect_locked().unwrap_or(0))
    }

    /// Notify state observers. Only the event loop thread calls this.
    pub(crate) fn publish(&self, state: ConnectionState) {
        debug!(
            target: targets::TCP_CLIENT,
            endpoint = %self.endpoint(),
            %state,
            "state changed"
        );
        self.state_changed.emit(StateChange {
            state,
            endpoint: self.endpoint().clone(),
        });
    }
}

/// Handles to the loop thread of the current (or last) run.
struct LoopHandle {
    thread: Option<JoinHandle<()>>,
    cancel: CancellationToken,
    waker: Arc<Waker>,
}

impl LoopHandle {
    fn runs_on_current_thread(&self) -> bool {
        self.thread
            .as_ref()
            .is_some_and(|thread| thread.thread().id() == thread::current().id())
    }
}

/// A single-connection TCP client.
///
/// The connection is driven by a dedicated event loop thread that is started
/// on demand by [`connect`](Self::connect) or [`send`](Self::send) and exits
/// when the connection ends. Data handed to `send` is queued and written in
/// order once the connection is up.
///
/// Payload events go to the [`ClientListener`] given at construction; state
/// transitions are published on [`state_changed`](Self::state_changed). Both
/// are invoked on the event loop thread.
///
/// # Example
///
/// ```ignore
/// let client = TcpClient::new(TcpClientConfig::new("127.0.0.1", 8080));
///
/// client.state_changed.connect(|change| {
///     println!("{} -> {}", change.endpoint, change.state);
/// });
///
/// client.send("ping")?;
/// // ...
/// client.close();
/// ```
pub struct TcpClient {
    shared: Arc<ClientShared>,
    lifecycle: Mutex<Option<LoopHandle>>,

    /// Signal emitted on every connection state transition.
    pub state_changed: Arc<Signal<StateChange>>,
}

impl TcpClient {
    /// Create a client without a payload listener.
    pub fn new(config: TcpClientConfig) -> Self {
        Self::with_listener(config, Arc::new(NoopListener))
    }

    /// Create a client that reports payload events to `listener`.
    pub fn with_listener(config: TcpClientConfig, listener: Arc<dyn ClientListener>) -> Self {
        let state_changed = Arc::new(Signal::new());
        let shared = Arc::new(ClientShared::new(config, listener, state_changed.clone()));

        Self {
            shared,
            lifecycle: Mutex::new(None),
            state_changed,
        }
    }

    /// Get the current connection state.
    pub fn state(&self) -> ConnectionState {
        self.shared.state()
    }

    /// Check if currently connected.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// The peer this client connects to.
    pub fn remote_endpoint(&self) -> &RemoteEndpoint {
        self.shared.endpoint()
    }

    /// Get the address string (host:port).
    pub fn address(&self) -> String {
        self.shared.config.address()
    }

    /// Number of buffers queued and not yet handed to the socket.
    pub fn pending_sends(&self) -> usize {
        self.shared.queue.len()
    }

    /// Start connecting if the client is disconnected.
    ///
    /// Returns immediately; progress is reported on
    /// [`state_changed`](Self::state_changed). Calling this while connecting
    /// or connected does nothing. An error means the event loop could not be
    /// started at all.
    pub fn connect(&self) -> Result<()> {
        if self.state() != ConnectionState::Disconnected {
            return Ok(());
        }

        let mut lifecycle = self.lifecycle.lock();

        if let Some(previous) = lifecycle.take() {
            previous.cancel.cancel();
            if previous.runs_on_current_thread() {
                // Called from a callback of the previous run; it exits on its own.
                trace!(target: targets::TCP_CLIENT, "detaching previous event loop");
            } else if let Some(thread) = previous.thread {
                MutexGuard::unlocked(&mut lifecycle, || {
                    let _ = thread.join();
                });
            }
        }

        let Some(epoch) = self.shared.begin_run() else {
            return Ok(());
        };

        match self.spawn_loop(epoch) {
            Ok(handle) => {
                *lifecycle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.shared.abort_run(epoch);
                Err(e)
            }
        }
    }

    fn spawn_loop(&self, epoch: u64) -> Result<LoopHandle> {
        let poll = Poll::new()?;
        let waker = Arc::new(Waker::new(poll.registry(), WAKER)?);
        let cancel = CancellationToken::new();

        let hook_waker = waker.clone();
        cancel.on_cancel(move || {
            let _ = hook_waker.wake();
        });

        let event_loop = EventLoop::new(self.shared.clone(), cancel.clone(), epoch, poll);
        let thread = thread::Builder::new()
            .name(self.shared.config.thread_name.clone())
            .spawn(move || event_loop.run())?;

        info!(
            target: targets::TCP_CLIENT,
            endpoint = %self.shared.endpoint(),
            epoch,
            "event loop started"
        );

        Ok(LoopHandle {
            thread: Some(thread),
            cancel,
            waker,
        })
    }

    /// Queue `data` for sending, connecting first if needed.
    ///
    /// The data is always queued. If the connection is already up the event
    /// loop is woken to write it; otherwise it goes out once connected.
    pub fn send(&self, data: impl Into<Bytes>) -> Result<()> {
        let data = data.into();
        trace!(
            target: targets::TCP_CLIENT,
            endpoint = %self.shared.endpoint(),
            len = data.len(),
            "queueing send"
        );
        self.shared.queue.push(data);

        self.connect()?;

        if self.state() == ConnectionState::Connected
            && let Some(handle) = self.lifecycle.lock().as_ref()
        {
            handle.waker.wake()?;
        }
        Ok(())
    }

    /// Close the connection and discard unsent data.
    ///
    /// The state becomes `Disconnected` before this returns; the event loop
    /// then tears the socket down and publishes the transition. Does nothing
    /// when already disconnected.
    pub fn close(&self) {
        if self.state() == ConnectionState::Disconnected {
            return;
        }

        let lifecycle = self.lifecycle.lock();
        if let Some(handle) = lifecycle.as_ref() {
            handle.cancel.cancel();
        }

        if let Some(discarded) = self.shared.force_disconnected() {
            info!(
                target: targets::TCP_CLIENT,
                endpoint = %self.shared.endpoint(),
                discarded,
                "connection closed"
            );
        }
    }

    /// Block until the event loop thread of the last run has exited.
    ///
    /// Returns immediately when no loop was started, or when called from the
    /// event loop thread itself.
    pub fn join(&self) {
        let thread = {
            let mut lifecycle = self.lifecycle.lock();
            match lifecycle.as_mut() {
                Some(handle) if !handle.runs_on_current_thread() => handle.thread.take(),
                _ => None,
            }
        };
        if let Some(thread) = thread {
            let _ = thread.join();
        }
    }
}

impl Drop for TcpClient {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for TcpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TcpClient")
            .field("endpoint", self.shared.endpoint())
            .field("state", &self.state())
            .field("pending_sends", &self.pending_sends())
            .finish_non_exhaustive()
    }
}
