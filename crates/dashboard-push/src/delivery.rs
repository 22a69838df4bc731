//! Delivery engine: one send, or best-effort fan-out with failure isolation

use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::connection::DashboardConnection;
use crate::event::WsEvent;
use crate::registry::ConnectionRegistry;

/// Bound on how long a single recipient may stall a delivery attempt.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a single delivery attempt failed.
///
/// Never propagates past the engine: every variant resolves to removal of
/// the recipient from the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("connection is not in the connected state")]
    NotConnected,
    #[error("connection channel is closed")]
    Closed,
    #[error("send timed out")]
    TimedOut,
}

/// Delivers events to registered connections.
///
/// Sends are best-effort and at-most-once per currently registered client:
/// no retry, no buffering, no queue. A recipient that fails in any way is
/// evicted from the registry so the next broadcast does not pay for it
/// again; the client recovers by reconnecting.
#[derive(Clone)]
pub struct DeliveryEngine {
    registry: ConnectionRegistry,
    send_timeout: Duration,
}

impl DeliveryEngine {
    pub fn new(registry: ConnectionRegistry) -> Self {
        Self {
            registry,
            send_timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    /// Override the per-recipient send timeout.
    pub fn with_send_timeout(mut self, send_timeout: Duration) -> Self {
        self.send_timeout = send_timeout;
        self
    }

    /// Deliver one event to one connection, evicting it on any failure.
    pub async fn send_to(
        &self,
        connection: &DashboardConnection,
        event: WsEvent,
    ) -> std::result::Result<(), DeliveryError> {
        match self.try_send(connection, event).await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    client = %connection.key,
                    error = %err,
                    "delivery failed, removing connection"
                );
                self.registry.disconnect_connection(connection);
                Err(err)
            }
        }
    }

    /// Fan one event out to every registered connection.
    ///
    /// Iterates a stable snapshot, so connect/disconnect during the pass can
    /// neither skip nor duplicate a recipient. Failed recipients are
    /// collected and removed in a single pass after iteration completes; a
    /// failure on one entry never perturbs delivery to the next. Returns the
    /// number of successful deliveries.
    pub async fn broadcast(&self, event: &WsEvent) -> usize {
        let snapshot = self.registry.snapshot();
        if snapshot.is_empty() {
            debug!(kind = event.kind(), "no dashboard connections to broadcast to");
            return 0;
        }

        debug!(
            kind = event.kind(),
            recipients = snapshot.len(),
            "broadcasting"
        );

        let mut failed = Vec::new();
        let mut sent = 0;
        for connection in &snapshot {
            match self.try_send(connection, event.clone()).await {
                Ok(()) => sent += 1,
                Err(err) => {
                    warn!(
                        client = %connection.key,
                        error = %err,
                        "broadcast delivery failed"
                    );
                    failed.push(connection.clone());
                }
            }
        }

        for connection in &failed {
            self.registry.disconnect_connection(connection);
        }

        debug!(
            kind = event.kind(),
            sent,
            failed = failed.len(),
            "broadcast complete"
        );
        sent
    }

    /// Attempt one bounded send without touching the registry.
    async fn try_send(
        &self,
        connection: &DashboardConnection,
        event: WsEvent,
    ) -> std::result::Result<(), DeliveryError> {
        if !connection.is_connected() {
            return Err(DeliveryError::NotConnected);
        }
        match timeout(self.send_timeout, connection.send(event)).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(DeliveryError::Closed),
            Err(_) => Err(DeliveryError::TimedOut),
        }
    }
}
