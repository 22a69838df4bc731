//! # Dashboard Push
//!
//! Real-time WebSocket push core for appointment dashboards.
//!
//! ## Features
//!
//! - **Connection Registry**: at most one live connection per client
//!   endpoint, with reconnect dedup ("last connection wins") and a personal
//!   welcome event carrying a monotonic connection number
//! - **Delivery Engine**: bounded per-recipient sends, per-recipient failure
//!   isolation, and eviction of dead connections
//! - **Event Broadcaster**: typed booking / cancellation / system events in
//!   the dashboard wire format
//!
//! The core is transport agnostic: a connection is a bounded channel plus a
//! close signal. The enclosing server drains each channel into actual
//! WebSocket frames, so one slow socket can never stall delivery to others.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dashboard_push::{ConnectionRegistry, DeliveryEngine, EventBroadcaster, Severity};
//!
//! #[tokio::main]
//! async fn main() {
//!     let registry = ConnectionRegistry::new();
//!     let broadcaster = EventBroadcaster::new(DeliveryEngine::new(registry.clone()));
//!
//!     // Socket tasks call registry.register(remote_addr) and drain the
//!     // returned receiver; mutation handlers fire notifications:
//!     broadcaster
//!         .notify_new_booking("Jane Doe", "March 20, 2026 at 2:30 PM", "Checkup", 42, None)
//!         .await;
//!     broadcaster.notify_system("dashboard online", Severity::Info).await;
//!
//!     println!("{} dashboards connected", registry.count());
//! }
//! ```

mod broadcaster;
mod connection;
mod delivery;
mod error;
mod event;
mod registry;

// Re-exports
pub use broadcaster::EventBroadcaster;
pub use connection::{ClientKey, ConnectionState, DashboardConnection};
pub use delivery::{DeliveryEngine, DeliveryError, DEFAULT_SEND_TIMEOUT};
pub use error::{Error, Result};
pub use event::{
    BookingData, BookingStatus, CancellationData, Severity, SystemData, WsEvent, WELCOME_MESSAGE,
};
pub use registry::ConnectionRegistry;

// Re-export commonly used types from dependencies
pub use tokio_util::sync::CancellationToken;
