//! Core systems for Strand.
//!
//! This crate provides the building blocks shared by the Strand networking
//! crates:
//!
//! - **Signal/Slot System**: Type-safe observer notifications with removable
//!   connections, RAII guards and weak subscriptions
//! - **Cancellation**: Cooperative cancellation tokens that can wake a blocked
//!   worker when cancelled
//! - **Logging**: Tracing targets and payload formatting helpers
//!
//! # Signal/Slot Example
//!
//! ```
//! use strand_core::Signal;
//!
//! // Create a signal that notifies when a value changes
//! let value_changed = Signal::<i32>::new();
//!
//! // Connect a slot to handle the signal
//! let conn_id = value_changed.connect(|value| {
//!     println!("Value changed to: {}", value);
//! });
//!
//! // Emit the signal
//! value_changed.emit(42);
//!
//! // Disconnect when done
//! value_changed.disconnect(conn_id);
//! ```
//!
//! # Cancellation Example
//!
//! ```
//! use strand_core::CancellationToken;
//!
//! let token = CancellationToken::new();
//! token.on_cancel(|| println!("woken"));
//!
//! token.cancel();
//! assert!(token.is_cancelled());
//! ```

pub mod cancellation;
pub mod logging;
pub mod signal;

pub use cancellation::CancellationToken;
pub use logging::HexDump;
pub use signal::{ConnectionGuard, ConnectionId, Signal};
