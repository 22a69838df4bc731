use std::time::Duration;

use dashboard_push::{ConnectionRegistry, DeliveryEngine, EventBroadcaster};

use crate::config::AppConfig;

/// Process-wide state, constructed once at startup and injected into
/// handlers via Axum state.
#[derive(Clone)]
pub struct AppState {
    pub registry: ConnectionRegistry,
    pub delivery: DeliveryEngine,
    pub broadcaster: EventBroadcaster,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let registry = ConnectionRegistry::new();
        let delivery = DeliveryEngine::new(registry.clone())
            .with_send_timeout(Duration::from_millis(config.broadcast.send_timeout_ms));
        let broadcaster = EventBroadcaster::new(delivery.clone());
        Self {
            registry,
            delivery,
            broadcaster,
        }
    }
}
