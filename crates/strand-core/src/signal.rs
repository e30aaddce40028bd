//! Signal/slot system for Strand.
//!
//! Signals are emitted when some piece of state changes and every connected
//! slot (callback) is invoked with the emitted value. Slots always run on the
//! emitting thread, so a slot connected to a signal emitted by a worker thread
//! must be quick and must not block.
//!
//! # Key Types
//!
//! - [`Signal<Args>`] - The main signal type for emitting notifications
//! - [`ConnectionId`] - Unique identifier returned when connecting a slot
//! - [`ConnectionGuard`] - RAII guard that disconnects when dropped
//!
//! # Observer Lifetimes
//!
//! A signal never keeps its observers alive on their own behalf. Three ways
//! of ending a subscription are available:
//!
//! - [`Signal::disconnect`] with the id returned from [`Signal::connect`]
//! - dropping the [`ConnectionGuard`] returned by [`Signal::connect_scoped`]
//! - [`Signal::connect_weak`], which holds only a weak reference to an
//!   `Arc`-owned observer and turns into a no-op once the observer is gone
//!
//! # Example
//!
//! ```
//! use strand_core::Signal;
//!
//! // Create a signal that passes a string argument
//! let text_changed = Signal::<String>::new();
//!
//! // Connect a slot (closure)
//! let conn_id = text_changed.connect(|text| {
//!     println!("Text changed to: {}", text);
//! });
//!
//! // Emit the signal
//! text_changed.emit("Hello, World!".to_string());
//!
//! // Disconnect when done
//! text_changed.disconnect(conn_id);
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use slotmap::{SlotMap, new_key_type};

use crate::logging::targets;

new_key_type! {
    /// A unique identifier for a signal-slot connection.
    ///
    /// Use this ID to disconnect a specific connection via [`Signal::disconnect`].
    /// The ID remains valid until the connection is explicitly disconnected or
    /// the signal is dropped.
    pub struct ConnectionId;
}

type Slot<Args> = Arc<dyn Fn(&Args) + Send + Sync>;

/// Internal storage for a single connection.
struct Connection<Args> {
    /// The slot function to invoke (Arc-wrapped so emit can run it unlocked).
    slot: Slot<Args>,
    /// Liveness check for weak connections; `None` for strong ones.
    alive: Option<Box<dyn Fn() -> bool + Send + Sync>>,
}

impl<Args> Connection<Args> {
    fn is_alive(&self) -> bool {
        self.alive.as_ref().is_none_or(|alive| alive())
    }
}

/// A type-safe signal that can have multiple connected slots.
///
/// # Type Parameter
///
/// - `Args`: The argument type passed to connected slots. Use `()` for signals
///   with no arguments, or a tuple like `(String, i32)` for multiple arguments.
///
/// # Thread Safety
///
/// `Signal<Args>` is `Send + Sync` and can be shared between threads. Slots
/// are invoked directly on whichever thread calls [`emit`](Self::emit).
pub struct Signal<Args> {
    /// All active connections.
    connections: Mutex<SlotMap<ConnectionId, Connection<Args>>>,
    /// Whether signal emission is temporarily blocked.
    blocked: AtomicBool,
}

impl<Args: Send + 'static> Default for Signal<Args> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Args: Send + 'static> Signal<Args> {
    /// Create a new signal with no connections.
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(SlotMap::with_key()),
            blocked: AtomicBool::new(false),
        }
    }

    /// Connect a slot (closure) to this signal.
    ///
    /// Returns a `ConnectionId` that can be used to disconnect the slot later.
    ///
    /// # Example
    ///
    /// ```
    /// use strand_core::Signal;
    ///
    /// let signal = Signal::<String>::new();
    /// let id = signal.connect(|s| println!("Got: {}", s));
    /// signal.emit("Hello".to_string());
    /// ```
    pub fn connect<F>(&self, slot: F) -> ConnectionId
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        self.connections.lock().insert(Connection {
            slot: Arc::new(slot),
            alive: None,
        })
    }

    /// Connect a method of an `Arc`-owned observer without keeping it alive.
    ///
    /// The signal only stores a [`Weak`] reference. Once every strong
    /// reference to `observer` is dropped the slot does nothing, and it is
    /// removed from the signal the next time it would have been invoked.
    ///
    /// # Example
    ///
    /// ```
    /// use std::sync::Arc;
    /// use std::sync::atomic::{AtomicUsize, Ordering};
    /// use strand_core::Signal;
    ///
    /// struct Counter(AtomicUsize);
    ///
    /// let signal = Signal::<usize>::new();
    /// let counter = Arc::new(Counter(AtomicUsize::new(0)));
    /// signal.connect_weak(&counter, |c, n| {
    ///     c.0.fetch_add(*n, Ordering::SeqCst);
    /// });
    ///
    /// signal.emit(2);
    /// assert_eq!(counter.0.load(Ordering::SeqCst), 2);
    ///
    /// drop(counter);
    /// signal.emit(3); // observer is gone; nothing happens
    /// assert_eq!(signal.connection_count(), 0);
    /// ```
    pub fn connect_weak<T, F>(&self, observer: &Arc<T>, slot: F) -> ConnectionId
    where
        T: Send + Sync + 'static,
        F: Fn(&T, &Args) + Send + Sync + 'static,
    {
        let target: Weak<T> = Arc::downgrade(observer);
        let weak = target.clone();
        self.connections.lock().insert(Connection {
            slot: Arc::new(move |args: &Args| {
                if let Some(target) = target.upgrade() {
                    slot(target.as_ref(), args);
                }
            }),
            alive: Some(Box::new(move || weak.strong_count() > 0)),
        })
    }

    /// Disconnect a specific slot by its connection ID.
    ///
    /// Returns `true` if the connection was found and removed, `false` otherwise.
    pub fn disconnect(&self, id: ConnectionId) -> bool {
        self.connections.lock().remove(id).is_some()
    }

    /// Disconnect all slots from this signal.
    pub fn disconnect_all(&self) {
        self.connections.lock().clear();
    }

    /// Get the number of connected slots.
    ///
    /// Weak connections whose observer has been dropped are pruned first.
    pub fn connection_count(&self) -> usize {
        self.prune();
        self.connections.lock().len()
    }

    /// Block signal emission temporarily.
    ///
    /// While blocked, calls to `emit()` will do nothing.
    pub fn set_blocked(&self, blocked: bool) {
        self.blocked.store(blocked, Ordering::SeqCst);
    }

    /// Check if signal emission is currently blocked.
    pub fn is_blocked(&self) -> bool {
        self.blocked.load(Ordering::SeqCst)
    }

    /// Emit the signal, invoking all connected slots on the current thread.
    ///
    /// The connection table is not locked while slots run, so a slot may
    /// connect or disconnect slots (including itself) on the same signal.
    #[tracing::instrument(skip_all, target = "strand_core::signal", level = "trace")]
    pub fn emit(&self, args: Args) {
        if self.is_blocked() {
            tracing::trace!(target: targets::SIGNAL, "signal blocked, skipping emit");
            return;
        }

        let slots: Vec<Slot<Args>> = self
            .connections
            .lock()
            .values()
            .filter(|conn| conn.is_alive())
            .map(|conn| conn.slot.clone())
            .collect();
        tracing::trace!(target: targets::SIGNAL, connection_count = slots.len(), "emitting signal");

        for slot in &slots {
            slot(&args);
        }

        self.prune();
    }

    /// Drop weak connections whose observers no longer exist.
    fn prune(&self) {
        let mut connections = self.connections.lock();
        let before = connections.len();
        connections.retain(|_, conn| conn.is_alive());
        let pruned = before - connections.len();
        if pruned > 0 {
            tracing::trace!(target: targets::SIGNAL, pruned, "removed dead weak connections");
        }
    }
}

impl<Args> std::fmt::Debug for Signal<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connections.lock().len())
            .field("blocked", &self.blocked.load(Ordering::SeqCst))
            .finish()
    }
}

/// RAII guard that disconnects its slot when dropped.
///
/// Created by [`Signal::connect_scoped`]. The guard holds only a weak
/// reference to the signal, so it never extends the signal's lifetime and is
/// harmless if the signal is dropped first.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicI32, Ordering};
/// use strand_core::Signal;
///
/// let signal = Arc::new(Signal::<i32>::new());
/// let counter = Arc::new(AtomicI32::new(0));
///
/// {
///     let counter = counter.clone();
///     let _guard = signal.connect_scoped(move |&v| {
///         counter.store(v, Ordering::SeqCst);
///     });
///     signal.emit(42);
/// }
/// signal.emit(43); // Nothing happens - connection was dropped
/// assert_eq!(counter.load(Ordering::SeqCst), 42);
/// ```
#[must_use = "the slot is disconnected as soon as the guard is dropped"]
pub struct ConnectionGuard<Args: Send + 'static> {
    signal: Weak<Signal<Args>>,
    id: ConnectionId,
}

impl<Args: Send + 'static> ConnectionGuard<Args> {
    /// The id of the guarded connection.
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<Args: Send + 'static> Signal<Args> {
    /// Connect a slot with automatic disconnection when the guard is dropped.
    pub fn connect_scoped<F>(self: &Arc<Self>, slot: F) -> ConnectionGuard<Args>
    where
        F: Fn(&Args) + Send + Sync + 'static,
    {
        let id = self.connect(slot);
        ConnectionGuard {
            signal: Arc::downgrade(self),
            id,
        }
    }
}

impl<Args: Send + 'static> Drop for ConnectionGuard<Args> {
    fn drop(&mut self) {
        if let Some(signal) = self.signal.upgrade() {
            signal.disconnect(self.id);
        }
    }
}

impl<Args: Send + 'static> std::fmt::Debug for ConnectionGuard<Args> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionGuard").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_signal_connect_emit() {
        let signal = Signal::<i32>::new();
        let received = Arc::new(Mutex::new(Vec::new()));

        let received_clone = received.clone();
        signal.connect(move |&value| {
            received_clone.lock().push(value);
        });

        signal.emit(42);
        signal.emit(100);

        let values = received.lock();
        assert_eq!(*values, vec![42, 100]);
    }

    #[test]
    fn test_signal_disconnect() {
        let signal = Signal::<i32>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = counter.clone();
        let id = signal.connect(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.emit(1);
        assert!(signal.disconnect(id));
        assert!(!signal.disconnect(id));
        signal.emit(2);

        assert_eq!(counter.load(Ordering::SeqCst), 1);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_signal_blocked() {
        let signal = Signal::<()>::new();
        let counter = Arc::new(AtomicUsize::new(0));

        let counter_clone = counter.clone();
        signal.connect(move |()| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
        });

        signal.set_blocked(true);
        assert!(signal.is_blocked());
        signal.emit(());
        assert_eq!(counter.load(Ordering::SeqCst), 0);

        signal.set_blocked(false);
        signal.emit(());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_can_disconnect_during_emit() {
        let signal = Arc::new(Signal::<i32>::new());
        let counter = Arc::new(AtomicUsize::new(0));
        let own_id = Arc::new(Mutex::new(None));

        let signal_clone = signal.clone();
        let counter_clone = counter.clone();
        let own_id_clone = own_id.clone();
        let id = signal.connect(move |_| {
            counter_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(id) = *own_id_clone.lock() {
                signal_clone.disconnect(id);
            }
        });
        *own_id.lock() = Some(id);

        signal.emit(1);
        signal.emit(2);

        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scoped_connection() {
        let signal = Arc::new(Signal::<i32>::new());
        let last = Arc::new(Mutex::new(0));

        {
            let last_clone = last.clone();
            let _guard = signal.connect_scoped(move |&v| {
                *last_clone.lock() = v;
            });
            signal.emit(7);
            assert_eq!(signal.connection_count(), 1);
        }

        signal.emit(8);
        assert_eq!(*last.lock(), 7);
        assert_eq!(signal.connection_count(), 0);
    }

    #[test]
    fn test_scoped_guard_outlives_signal() {
        let signal = Arc::new(Signal::<i32>::new());
        let guard = signal.connect_scoped(|_| {});
        drop(signal);
        drop(guard);
    }

    #[test]
    fn test_weak_connection_does_not_keep_observer_alive() {
        struct Observer {
            seen: AtomicUsize,
        }

        let signal = Signal::<usize>::new();
        let observer = Arc::new(Observer {
            seen: AtomicUsize::new(0),
        });

        signal.connect_weak(&observer, |o, n| {
            o.seen.fetch_add(*n, Ordering::SeqCst);
        });
        assert_eq!(Arc::strong_count(&observer), 1);

        signal.emit(5);
        assert_eq!(observer.seen.load(Ordering::SeqCst), 5);

        drop(observer);
        signal.emit(5);
        assert_eq!(signal.connection_count(), 0);
    }
}
