//! Event broadcaster: appointment domain facts in, wire events out

use tracing::info;

use crate::delivery::DeliveryEngine;
use crate::event::{Severity, WsEvent};

/// Translates appointment domain facts into wire events and hands them to
/// the delivery engine.
///
/// Every notify call completes without error from the caller's point of
/// view: per-recipient failures are absorbed below this boundary, so the
/// appointment mutation handlers can treat notification as fire-and-forget.
/// Sequential calls reach the delivery engine in call order, so dashboards
/// observe events in the order the mutations were committed.
#[derive(Clone)]
pub struct EventBroadcaster {
    delivery: DeliveryEngine,
}

impl EventBroadcaster {
    pub fn new(delivery: DeliveryEngine) -> Self {
        Self { delivery }
    }

    /// Announce a freshly booked appointment to every dashboard. Returns the
    /// number of dashboards that received it.
    pub async fn notify_new_booking(
        &self,
        patient_name: &str,
        appointment_time: &str,
        reason: &str,
        appointment_id: i64,
        phone_number: Option<&str>,
    ) -> usize {
        let event = WsEvent::new_booking(
            appointment_id,
            patient_name,
            appointment_time,
            reason,
            phone_number,
        );
        let sent = self.delivery.broadcast(&event).await;
        info!(
            appointment_id,
            patient = patient_name,
            notified = sent,
            "new booking broadcast"
        );
        sent
    }

    /// Announce a cancellation to every dashboard.
    pub async fn notify_cancellation(
        &self,
        patient_name: &str,
        appointment_time: &str,
        appointment_id: i64,
        canceled_count: u32,
    ) -> usize {
        let event = WsEvent::booking_canceled(
            appointment_id,
            patient_name,
            appointment_time,
            canceled_count,
        );
        let sent = self.delivery.broadcast(&event).await;
        info!(
            appointment_id,
            canceled_count,
            notified = sent,
            "cancellation broadcast"
        );
        sent
    }

    /// Push an operational notice to every dashboard.
    pub async fn notify_system(&self, text: &str, level: Severity) -> usize {
        let event = WsEvent::system_message(text, level);
        let sent = self.delivery.broadcast(&event).await;
        info!(?level, notified = sent, "system message broadcast");
        sent
    }
}
