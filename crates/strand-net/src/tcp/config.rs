//! Configuration types for the TCP client.

use super::endpoint::RemoteEndpoint;

/// Default size of the scratch buffer reads land in.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 2048;

/// Default number of readiness events fetched per poll.
pub const DEFAULT_EVENT_CAPACITY: usize = 16;

/// How the write handler treats a write that accepted fewer bytes than offered.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WritePolicy {
    /// One write call per queued buffer. The accepted count is reported and
    /// any unwritten remainder is dropped.
    #[default]
    SingleWrite,
    /// The unwritten remainder stays at the head of the queue and is written
    /// on the next writable edge.
    Complete,
}

/// Socket-level options for TCP connections.
#[derive(Clone, Debug)]
pub struct TcpSocketConfig {
    /// Enable TCP_NODELAY (disable Nagle's algorithm).
    pub no_delay: bool,
    /// Read buffer size in bytes; also the upper bound of a delivered chunk.
    pub read_buffer_size: usize,
    /// Short-write handling.
    pub write_policy: WritePolicy,
}

impl Default for TcpSocketConfig {
    fn default() -> Self {
        Self {
            no_delay: false,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            write_policy: WritePolicy::default(),
        }
    }
}

impl TcpSocketConfig {
    /// Create a new socket configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable TCP_NODELAY.
    pub fn no_delay(mut self, enabled: bool) -> Self {
        self.no_delay = enabled;
        self
    }

    /// Set the read buffer size. Zero is raised to one byte.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }

    /// Set the short-write policy.
    pub fn write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }
}

/// Configuration for a TCP client connection.
#[derive(Clone, Debug)]
pub struct TcpClientConfig {
    /// The peer to connect to.
    pub endpoint: RemoteEndpoint,
    /// Socket-level options.
    pub socket: TcpSocketConfig,
    /// Name given to the event loop thread.
    pub thread_name: String,
    /// Readiness events fetched per poll.
    pub event_capacity: usize,
}

impl TcpClientConfig {
    /// Create a new client configuration.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self::from_endpoint(RemoteEndpoint::new(host, port))
    }

    /// Create a configuration for an already validated endpoint.
    pub fn from_endpoint(endpoint: RemoteEndpoint) -> Self {
        Self {
            endpoint,
            socket: TcpSocketConfig::default(),
            thread_name: "strand-tcp".to_string(),
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Set socket options.
    pub fn socket_config(mut self, config: TcpSocketConfig) -> Self {
        self.socket = config;
        self
    }

    /// Enable TCP_NODELAY.
    pub fn no_delay(mut self, enabled: bool) -> Self {
        self.socket.no_delay = enabled;
        self
    }

    /// Set the read buffer size.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.socket = self.socket.read_buffer_size(size);
        self
    }

    /// Set the short-write policy.
    pub fn write_policy(mut self, policy: WritePolicy) -> Self {
        self.socket.write_policy = policy;
        self
    }

    /// Set the event loop thread name.
    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    /// Set how many readiness events a single poll may return.
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Get the address string (host:port).
    pub fn address(&self) -> String {
        self.endpoint.to_string()
    }
}
