//! Connection registry: the single source of truth for who is listening

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::connection::{ClientKey, DashboardConnection};
use crate::error::{Error, Result};
use crate::event::WsEvent;

/// Tracks all live dashboard connections, keyed by client endpoint.
///
/// Holds at most one connection per key: a reconnect from the same endpoint
/// closes the previous entry before installing the new one, so reconnect
/// storms from a single browser tab never accumulate entries. All lifetime
/// decisions are made here; delivery code reports failures back through
/// [`disconnect_connection`](Self::disconnect_connection).
#[derive(Clone)]
pub struct ConnectionRegistry {
    connections: Arc<DashMap<ClientKey, DashboardConnection>>,
    /// Count of connections ever accepted; the next value becomes the
    /// `connection_id` in the welcome event.
    sequence: Arc<AtomicU64>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Arc::new(DashMap::new()),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Accept a connection from `remote`.
    ///
    /// Returns the registered connection handle and the receiver its socket
    /// task drains. The handle is already installed in the registry and has
    /// a personal welcome event queued; if the welcome cannot be queued, the
    /// entry is rolled back and [`Error::Accept`] is returned.
    pub async fn register(
        &self,
        remote: SocketAddr,
    ) -> Result<(DashboardConnection, mpsc::Receiver<WsEvent>)> {
        let key = ClientKey::from(remote);

        // Last connection from a given endpoint wins: close the previous
        // entry best-effort before installing the new one.
        if let Some((_, old)) = self.connections.remove(&key) {
            old.close();
            info!(
                client = %key,
                replaced_id = old.connection_id,
                "replaced existing connection"
            );
        }

        let connection_id = self.sequence.fetch_add(1, Ordering::Relaxed) + 1;
        let (connection, receiver) = DashboardConnection::new(key, connection_id);
        connection.mark_connected();
        self.connections.insert(key, connection.clone());

        if !connection.send(WsEvent::connected(connection_id)).await {
            self.disconnect_connection(&connection);
            return Err(Error::Accept(key));
        }

        info!(
            client = %key,
            connection_id,
            total_connections = self.connections.len(),
            "dashboard connected"
        );

        Ok((connection, receiver))
    }

    /// Remove the entry for `key`, closing its connection. Removing an
    /// absent key is a no-op.
    pub fn disconnect(&self, key: &ClientKey) {
        if let Some((_, connection)) = self.connections.remove(key) {
            connection.close();
            info!(
                client = %key,
                remaining_connections = self.connections.len(),
                "dashboard disconnected"
            );
        }
    }

    /// Remove `connection` only if it is still the registered entry for its
    /// key. A socket task cleaning up after itself, or a delivery pass
    /// evicting a failed recipient, must not remove a replacement that
    /// arrived in the meantime.
    pub fn disconnect_connection(&self, connection: &DashboardConnection) {
        let removed = self.connections.remove_if(&connection.key, |_, current| {
            current.connection_id == connection.connection_id
        });
        if let Some((key, current)) = removed {
            current.close();
            debug!(
                client = %key,
                connection_id = current.connection_id,
                remaining_connections = self.connections.len(),
                "connection removed"
            );
        }
    }

    /// Number of tracked connections. Never blocks.
    pub fn count(&self) -> usize {
        self.connections.len()
    }

    /// Stable snapshot of the current entries, for iteration that must not
    /// be perturbed by concurrent connect/disconnect.
    pub fn snapshot(&self) -> Vec<DashboardConnection> {
        self.connections.iter().map(|e| e.value().clone()).collect()
    }

    /// Drop every entry whose connection no longer reports Connected.
    /// Periodic hygiene, independent of send-failure eviction.
    pub fn sweep(&self) {
        let dead: Vec<DashboardConnection> = self
            .connections
            .iter()
            .filter(|e| !e.value().is_connected())
            .map(|e| e.value().clone())
            .collect();

        if dead.is_empty() {
            return;
        }

        for connection in &dead {
            self.disconnect_connection(connection);
        }
        info!(
            cleaned = dead.len(),
            remaining_connections = self.connections.len(),
            "swept dead connections"
        );
    }

    /// Close and remove every tracked connection. Used at shutdown.
    pub fn close_all(&self) {
        let all = self.snapshot();
        for connection in &all {
            self.disconnect_connection(connection);
        }
        if !all.is_empty() {
            info!(closed = all.len(), "closed all connections");
        }
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
