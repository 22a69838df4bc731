//! Dashboard connection types

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::event::WsEvent;

/// Outbound event buffer per connection. A dashboard that stops draining its
/// socket fills this up and is then evicted by the delivery timeout.
const EVENT_BUFFER: usize = 100;

/// Identity of a dashboard client, derived from its remote endpoint.
///
/// A value-typed (host, port) pair rather than a formatted string, so
/// reconnect dedup cannot be fooled by formatting collisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClientKey {
    pub host: IpAddr,
    pub port: u16,
}

impl From<SocketAddr> for ClientKey {
    fn from(addr: SocketAddr) -> Self {
        Self {
            host: addr.ip(),
            port: addr.port(),
        }
    }
}

impl fmt::Display for ClientKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Lifecycle state of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Accepted but not yet installed in the registry.
    Connecting,
    /// Installed and writable.
    Connected,
    /// Close requested; the socket task is shutting down.
    Closing,
    /// The receiving side is gone.
    Closed,
}

impl ConnectionState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ConnectionState::Connecting,
            1 => ConnectionState::Connected,
            2 => ConnectionState::Closing,
            _ => ConnectionState::Closed,
        }
    }
}

/// One live dashboard connection.
///
/// Clones share the underlying channel and state: the registry holds one
/// clone, the socket task another. Lifetime decisions are made only by the
/// registry; everything else just reports outcomes back to it.
#[derive(Debug, Clone)]
pub struct DashboardConnection {
    /// Identity in the registry.
    pub key: ClientKey,
    /// Monotonically increasing sequence number assigned at registration.
    pub connection_id: u64,
    /// When the connection was registered.
    pub connected_at: chrono::DateTime<chrono::Utc>,
    sender: mpsc::Sender<WsEvent>,
    state: Arc<AtomicU8>,
    cancel: CancellationToken,
}

impl DashboardConnection {
    pub(crate) fn new(key: ClientKey, connection_id: u64) -> (Self, mpsc::Receiver<WsEvent>) {
        let (sender, receiver) = mpsc::channel(EVENT_BUFFER);
        let connection = Self {
            key,
            connection_id,
            connected_at: chrono::Utc::now(),
            sender,
            state: Arc::new(AtomicU8::new(ConnectionState::Connecting as u8)),
            cancel: CancellationToken::new(),
        };
        (connection, receiver)
    }

    /// Current lifecycle state. A connection whose receiving side has been
    /// dropped reports `Closed` regardless of the stored state.
    pub fn state(&self) -> ConnectionState {
        if self.sender.is_closed() {
            return ConnectionState::Closed;
        }
        ConnectionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Whether this connection is currently writable.
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    pub(crate) fn mark_connected(&self) {
        self.state
            .store(ConnectionState::Connected as u8, Ordering::Release);
    }

    /// Queue an event for this connection. Returns `false` if the receiving
    /// side is gone.
    pub async fn send(&self, event: WsEvent) -> bool {
        self.sender.send(event).await.is_ok()
    }

    /// Request shutdown: marks the connection Closing and signals the socket
    /// task draining its receiver to stop.
    pub fn close(&self) {
        self.state
            .store(ConnectionState::Closing as u8, Ordering::Release);
        self.cancel.cancel();
    }

    /// Token cancelled once [`close`](Self::close) has been called. Socket
    /// tasks select on this to learn that the registry no longer wants them.
    pub fn close_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}
