//! Server configuration

use std::net::SocketAddr;

use crate::relay::DEFAULT_MAILBOX_CAPACITY;

/// Default frame size cap; uploads beyond this are refused
pub const DEFAULT_MAX_FRAME_BYTES: usize = 2 * 1024 * 1024;

/// Server configuration options
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Mailbox capacity for newly registered viewers
    pub mailbox_capacity: usize,

    /// Maximum accepted request body size in bytes
    pub max_frame_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:12346".parse().unwrap(),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
        }
    }
}

impl ServerConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the bind address
    pub fn bind(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    /// Set the viewer mailbox capacity
    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.mailbox_capacity = capacity.max(1);
        self
    }

    /// Set the frame size cap
    pub fn max_frame_bytes(mut self, bytes: usize) -> Self {
        self.max_frame_bytes = bytes;
        self
    }

    /// Build a config from the environment
    ///
    /// Reads `CAMHUB_BIND`, `CAMHUB_MAILBOX_CAPACITY` and
    /// `CAMHUB_MAX_FRAME_BYTES`. Unset variables keep their defaults;
    /// malformed values are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = std::env::var("CAMHUB_BIND") {
            match value.parse() {
                Ok(addr) => config.bind_addr = addr,
                Err(_) => tracing::warn!(%value, "Invalid CAMHUB_BIND, using default"),
            }
        }

        if let Ok(value) = std::env::var("CAMHUB_MAILBOX_CAPACITY") {
            match value.parse::<usize>() {
                Ok(capacity) if capacity > 0 => config.mailbox_capacity = capacity,
                _ => tracing::warn!(%value, "Invalid CAMHUB_MAILBOX_CAPACITY, using default"),
            }
        }

        if let Ok(value) = std::env::var("CAMHUB_MAX_FRAME_BYTES") {
            match value.parse::<usize>() {
                Ok(bytes) if bytes > 0 => config.max_frame_bytes = bytes,
                _ => tracing::warn!(%value, "Invalid CAMHUB_MAX_FRAME_BYTES, using default"),
            }
        }

        config
    }
}
