//! Connection state for the TCP client.

use std::sync::atomic::{AtomicU8, Ordering};

use super::endpoint::RemoteEndpoint;

/// Current state of a TCP connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ConnectionState {
    /// Not connected to any server.
    #[default]
    Disconnected = 0,
    /// Currently attempting to connect.
    Connecting = 1,
    /// Connected and ready to send/receive data.
    Connected = 2,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Connecting,
            2 => Self::Connected,
            _ => Self::Disconnected,
        }
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// A state transition as published to state observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StateChange {
    /// The state the client just entered.
    pub state: ConnectionState,
    /// The peer the client belongs to.
    pub endpoint: RemoteEndpoint,
}

/// Lock-free cell holding a [`ConnectionState`].
#[derive(Debug, Default)]
pub(crate) struct AtomicConnectionState(AtomicU8);

impl AtomicConnectionState {
    pub(crate) fn load(&self) -> ConnectionState {
        ConnectionState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn store(&self, state: ConnectionState) {
        self.0.store(state as u8, Ordering::Release);
    }

    /// Move from `current` to `new`; fails if the cell holds anything else.
    pub(crate) fn transition(&self, current: ConnectionState, new: ConnectionState) -> bool {
        self.0
            .compare_exchange(current as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
