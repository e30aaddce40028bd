//! Cooperative cancellation.
//!
//! A [`CancellationToken`] is shared between the party that requests a stop
//! and the worker that honours it. Workers check [`is_cancelled`] at the points
//! where stopping is safe. Workers that block in an OS wait register a wake
//! hook with [`on_cancel`] so that cancelling also interrupts the wait.
//!
//! [`is_cancelled`]: CancellationToken::is_cancelled
//! [`on_cancel`]: CancellationToken::on_cancel
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicBool, Ordering};
//! use strand_core::CancellationToken;
//!
//! let token = CancellationToken::new();
//! let woken = Arc::new(AtomicBool::new(false));
//!
//! let woken_clone = woken.clone();
//! token.on_cancel(move || woken_clone.store(true, Ordering::SeqCst));
//!
//! token.cancel();
//! assert!(token.is_cancelled());
//! assert!(woken.load(Ordering::SeqCst));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

type WakeHook = Box<dyn FnOnce() + Send>;

/// A cancellation token for cooperative task cancellation.
///
/// Cloning the token shares the underlying state; cancelling any clone
/// cancels all of them. Cancellation is one-way.
#[derive(Clone)]
pub struct CancellationToken {
    inner: Arc<CancellationState>,
}

struct CancellationState {
    cancelled: AtomicBool,
    hooks: Mutex<Vec<WakeHook>>,
}

impl CancellationToken {
    /// Create a new cancellation token.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(CancellationState {
                cancelled: AtomicBool::new(false),
                hooks: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Check if cancellation has been requested.
    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Request cancellation.
    ///
    /// Sets the cancellation flag and runs every registered wake hook once.
    /// Repeated calls are no-ops.
    pub fn cancel(&self) {
        // Hold the lock while flipping the flag so a concurrent `on_cancel`
        // either lands in the list drained here or sees the flag set.
        let hooks = {
            let mut hooks = self.inner.hooks.lock();
            if self.inner.cancelled.swap(true, Ordering::AcqRel) {
                return;
            }
            std::mem::take(&mut *hooks)
        };
        for hook in hooks {
            hook();
        }
    }

    /// Register a hook to run when the token is cancelled.
    ///
    /// If the token is already cancelled the hook runs immediately on the
    /// calling thread.
    pub fn on_cancel<F>(&self, hook: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let mut hooks = self.inner.hooks.lock();
        if self.is_cancelled() {
            drop(hooks);
            hook();
        } else {
            hooks.push(Box::new(hook));
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::thread;

    #[test]
    fn test_token_starts_uncancelled() {
        let token = CancellationToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_cancel_is_shared_between_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_hooks_run_exactly_once() {
        let token = CancellationToken::new();
        let count = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let count = count.clone();
            token.on_cancel(move || {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }

        token.cancel();
        token.cancel();
        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_hook_registered_after_cancel_runs_immediately() {
        let token = CancellationToken::new();
        token.cancel();

        let ran = Arc::new(AtomicBool::new(false));
        let ran_clone = ran.clone();
        token.on_cancel(move || ran_clone.store(true, Ordering::SeqCst));

        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_cancel_from_another_thread() {
        let token = CancellationToken::new();
        let (tx, rx) = std::sync::mpsc::channel();
        token.on_cancel(move || {
            let _ = tx.send(());
        });

        let remote = token.clone();
        thread::spawn(move || remote.cancel())
            .join()
            .unwrap();

        rx.recv_timeout(std::time::Duration::from_secs(1)).unwrap();
        assert!(token.is_cancelled());
    }
}
