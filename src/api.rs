//! HTTP surface: connection stats and notification triggers
//!
//! The notify endpoints stand in for the appointment mutation handlers: the
//! scheduler calls them after its persistence step commits. They always
//! succeed; `notified` only reports how many dashboards were reachable.

use axum::extract::State;
use axum::Json;
use dashboard_push::Severity;
use serde::{Deserialize, Serialize};

use crate::state::AppState;

#[derive(Serialize)]
pub struct StatsResponse {
    pub total_connections: usize,
    pub connections: Vec<ConnectionStats>,
}

#[derive(Serialize)]
pub struct ConnectionStats {
    pub client: String,
    pub connection_id: u64,
    pub connected_at: String,
    pub state: String,
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Json<StatsResponse> {
    let connections: Vec<ConnectionStats> = state
        .registry
        .snapshot()
        .into_iter()
        .map(|c| ConnectionStats {
            client: c.key.to_string(),
            connection_id: c.connection_id,
            connected_at: c.connected_at.to_rfc3339(),
            state: format!("{:?}", c.state()),
        })
        .collect();

    Json(StatsResponse {
        total_connections: connections.len(),
        connections,
    })
}

#[derive(Deserialize)]
pub struct BookingNotification {
    pub patient_name: String,
    pub appointment_time: String,
    pub reason: String,
    pub appointment_id: i64,
    #[serde(default)]
    pub phone_number: Option<String>,
}

#[derive(Deserialize)]
pub struct CancellationNotification {
    pub patient_name: String,
    pub appointment_time: String,
    pub appointment_id: i64,
    pub canceled_count: u32,
}

#[derive(Deserialize)]
pub struct SystemNotification {
    pub message: String,
    #[serde(default = "default_level")]
    pub level: Severity,
}

fn default_level() -> Severity {
    Severity::Info
}

#[derive(Serialize)]
pub struct NotifyResponse {
    pub success: bool,
    pub notified: usize,
}

/// POST /api/notify/booking
pub async fn notify_booking(
    State(state): State<AppState>,
    Json(req): Json<BookingNotification>,
) -> Json<NotifyResponse> {
    let notified = state
        .broadcaster
        .notify_new_booking(
            &req.patient_name,
            &req.appointment_time,
            &req.reason,
            req.appointment_id,
            req.phone_number.as_deref(),
        )
        .await;
    Json(NotifyResponse {
        success: true,
        notified,
    })
}

/// POST /api/notify/cancellation
pub async fn notify_cancellation(
    State(state): State<AppState>,
    Json(req): Json<CancellationNotification>,
) -> Json<NotifyResponse> {
    let notified = state
        .broadcaster
        .notify_cancellation(
            &req.patient_name,
            &req.appointment_time,
            req.appointment_id,
            req.canceled_count,
        )
        .await;
    Json(NotifyResponse {
        success: true,
        notified,
    })
}

/// POST /api/notify/system
pub async fn notify_system(
    State(state): State<AppState>,
    Json(req): Json<SystemNotification>,
) -> Json<NotifyResponse> {
    let notified = state.broadcaster.notify_system(&req.message, req.level).await;
    Json(NotifyResponse {
        success: true,
        notified,
    })
}
