//! Wire events pushed to dashboard clients
//!
//! One JSON object per WebSocket text frame, tagged by `event`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Severity of a system message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// Status marker carried by booking events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Canceled,
}

/// Payload of a `new_booking` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingData {
    pub id: i64,
    pub patient: String,
    pub time: String,
    pub reason: String,
    /// `null` on the wire when the patient gave no phone number.
    pub phone: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub status: BookingStatus,
}

/// Payload of a `booking_canceled` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancellationData {
    pub id: i64,
    pub patient: String,
    pub time: String,
    pub canceled_count: u32,
    pub timestamp: DateTime<Utc>,
    pub status: BookingStatus,
}

/// Payload of a `system_message` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemData {
    pub message: String,
    pub level: Severity,
    pub timestamp: DateTime<Utc>,
}

/// Welcome text sent to every freshly registered dashboard.
pub const WELCOME_MESSAGE: &str = "Connected to Smart Care Medical Center";

/// An event pushed to dashboard clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WsEvent {
    /// Personal welcome, sent once per registration.
    Connected {
        message: String,
        timestamp: DateTime<Utc>,
        connection_id: u64,
    },
    /// Reply to a client `"ping"` liveness probe.
    Pong { timestamp: DateTime<Utc> },
    NewBooking { data: BookingData },
    BookingCanceled { data: CancellationData },
    SystemMessage { data: SystemData },
}

impl WsEvent {
    pub fn connected(connection_id: u64) -> Self {
        WsEvent::Connected {
            message: WELCOME_MESSAGE.to_string(),
            timestamp: Utc::now(),
            connection_id,
        }
    }

    pub fn pong() -> Self {
        WsEvent::Pong {
            timestamp: Utc::now(),
        }
    }

    pub fn new_booking(
        appointment_id: i64,
        patient_name: &str,
        appointment_time: &str,
        reason: &str,
        phone_number: Option<&str>,
    ) -> Self {
        WsEvent::NewBooking {
            data: BookingData {
                id: appointment_id,
                patient: patient_name.to_string(),
                time: appointment_time.to_string(),
                reason: reason.to_string(),
                phone: phone_number.map(str::to_string),
                timestamp: Utc::now(),
                status: BookingStatus::Confirmed,
            },
        }
    }

    pub fn booking_canceled(
        appointment_id: i64,
        patient_name: &str,
        appointment_time: &str,
        canceled_count: u32,
    ) -> Self {
        WsEvent::BookingCanceled {
            data: CancellationData {
                id: appointment_id,
                patient: patient_name.to_string(),
                time: appointment_time.to_string(),
                canceled_count,
                timestamp: Utc::now(),
                status: BookingStatus::Canceled,
            },
        }
    }

    pub fn system_message(text: &str, level: Severity) -> Self {
        WsEvent::SystemMessage {
            data: SystemData {
                message: text.to_string(),
                level,
                timestamp: Utc::now(),
            },
        }
    }

    /// Event tag as it appears on the wire, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            WsEvent::Connected { .. } => "connected",
            WsEvent::Pong { .. } => "pong",
            WsEvent::NewBooking { .. } => "new_booking",
            WsEvent::BookingCanceled { .. } => "booking_canceled",
            WsEvent::SystemMessage { .. } => "system_message",
        }
    }
}
