//! Unit tests for dashboard-push

use std::net::SocketAddr;
use std::time::Duration;

use dashboard_push::{
    ClientKey, ConnectionRegistry, ConnectionState, DeliveryEngine, DeliveryError,
    EventBroadcaster, Severity, WsEvent, WELCOME_MESSAGE,
};

fn addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

// ============== ClientKey Tests ==============

#[test]
fn test_client_key_from_socket_addr() {
    let key = ClientKey::from(addr(4100));
    assert_eq!(key.host, "127.0.0.1".parse::<std::net::IpAddr>().unwrap());
    assert_eq!(key.port, 4100);
    assert_eq!(key.to_string(), "127.0.0.1:4100");
}

#[test]
fn test_client_key_dedups_same_endpoint() {
    assert_eq!(ClientKey::from(addr(4100)), ClientKey::from(addr(4100)));
    assert_ne!(ClientKey::from(addr(4100)), ClientKey::from(addr(4101)));
}

// ============== WsEvent Wire Shape Tests ==============

#[test]
fn test_connected_event_wire_shape() {
    let value = serde_json::to_value(WsEvent::connected(7)).unwrap();
    assert_eq!(value["event"], "connected");
    assert_eq!(value["message"], WELCOME_MESSAGE);
    assert_eq!(value["connection_id"], 7);
    assert!(value["timestamp"].is_string());
}

#[test]
fn test_pong_event_wire_shape() {
    let value = serde_json::to_value(WsEvent::pong()).unwrap();
    assert_eq!(value["event"], "pong");
    assert!(value["timestamp"].is_string());
}

#[test]
fn test_new_booking_event_wire_shape() {
    let event = WsEvent::new_booking(
        42,
        "Jane Doe",
        "March 20, 2026 at 2:30 PM",
        "Checkup",
        Some("+10000000000"),
    );
    let value = serde_json::to_value(event).unwrap();
    assert_eq!(value["event"], "new_booking");
    assert_eq!(value["data"]["id"], 42);
    assert_eq!(value["data"]["patient"], "Jane Doe");
    assert_eq!(value["data"]["time"], "March 20, 2026 at 2:30 PM");
    assert_eq!(value["data"]["reason"], "Checkup");
    assert_eq!(value["data"]["phone"], "+10000000000");
    assert_eq!(value["data"]["status"], "confirmed");
    assert!(value["data"]["timestamp"].is_string());
}

#[test]
fn test_new_booking_without_phone_serializes_null() {
    let event = WsEvent::new_booking(1, "John Roe", "April 2, 2026 at 9:00 AM", "Follow-up", None);
    let value = serde_json::to_value(event).unwrap();
    assert!(value["data"]["phone"].is_null());
}

#[test]
fn test_booking_canceled_event_wire_shape() {
    let event = WsEvent::booking_canceled(42, "Jane Doe", "March 20, 2026 at 2:30 PM", 1);
    let value = serde_json::to_value(event).unwrap();
    assert_eq!(value["event"], "booking_canceled");
    assert_eq!(value["data"]["id"], 42);
    assert_eq!(value["data"]["canceled_count"], 1);
    assert_eq!(value["data"]["status"], "canceled");
}

#[test]
fn test_system_message_event_wire_shape() {
    let event = WsEvent::system_message("maintenance at noon", Severity::Warning);
    let value = serde_json::to_value(event).unwrap();
    assert_eq!(value["event"], "system_message");
    assert_eq!(value["data"]["message"], "maintenance at noon");
    assert_eq!(value["data"]["level"], "warning");
}

#[test]
fn test_event_kind_tags() {
    assert_eq!(WsEvent::connected(1).kind(), "connected");
    assert_eq!(WsEvent::pong().kind(), "pong");
    assert_eq!(
        WsEvent::system_message("x", Severity::Info).kind(),
        "system_message"
    );
}

// ============== ConnectionRegistry Tests ==============

#[tokio::test]
async fn test_register_sends_welcome_with_monotonic_ids() {
    let registry = ConnectionRegistry::new();

    let (_conn1, mut rx1) = registry.register(addr(5001)).await.unwrap();
    let (_conn2, mut rx2) = registry.register(addr(5002)).await.unwrap();
    assert_eq!(registry.count(), 2);

    match rx1.recv().await.unwrap() {
        WsEvent::Connected {
            message,
            connection_id,
            ..
        } => {
            assert_eq!(message, WELCOME_MESSAGE);
            assert_eq!(connection_id, 1);
        }
        other => panic!("expected connected event, got {:?}", other),
    }
    match rx2.recv().await.unwrap() {
        WsEvent::Connected { connection_id, .. } => assert_eq!(connection_id, 2),
        other => panic!("expected connected event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_reconnect_replaces_previous_connection() {
    let registry = ConnectionRegistry::new();

    let (first_a, _rx_a1) = registry.register(addr(5010)).await.unwrap();
    let (_second_a, _rx_a2) = registry.register(addr(5010)).await.unwrap();
    let (_b, _rx_b) = registry.register(addr(5011)).await.unwrap();

    // {a, a, b} ends with exactly two entries, and the second `a` closed the
    // first `a` connection object.
    assert_eq!(registry.count(), 2);
    assert!(!first_a.is_connected());
    assert_eq!(first_a.state(), ConnectionState::Closing);

    let entry_for_a = registry
        .snapshot()
        .into_iter()
        .find(|c| c.key == ClientKey::from(addr(5010)))
        .unwrap();
    assert_eq!(entry_for_a.connection_id, 2);
}

#[tokio::test]
async fn test_disconnect_absent_key_is_noop() {
    let registry = ConnectionRegistry::new();
    let (_conn, _rx) = registry.register(addr(5020)).await.unwrap();

    registry.disconnect(&ClientKey::from(addr(5999)));
    assert_eq!(registry.count(), 1);
}

#[tokio::test]
async fn test_disconnect_closes_connection() {
    let registry = ConnectionRegistry::new();
    let (conn, _rx) = registry.register(addr(5030)).await.unwrap();

    registry.disconnect(&conn.key);
    assert_eq!(registry.count(), 0);
    assert!(!conn.is_connected());
}

#[tokio::test]
async fn test_count_after_connects_and_disconnects() {
    let registry = ConnectionRegistry::new();

    let mut receivers = Vec::new();
    for port in 5040..5045 {
        let (_conn, rx) = registry.register(addr(port)).await.unwrap();
        receivers.push(rx);
    }
    assert_eq!(registry.count(), 5);

    registry.disconnect(&ClientKey::from(addr(5040)));
    registry.disconnect(&ClientKey::from(addr(5041)));
    assert_eq!(registry.count(), 3);
}

#[tokio::test]
async fn test_sweep_removes_dead_connections() {
    let registry = ConnectionRegistry::new();

    let (_conn1, _rx1) = registry.register(addr(5050)).await.unwrap();
    let (_conn2, rx2) = registry.register(addr(5051)).await.unwrap();
    let (_conn3, _rx3) = registry.register(addr(5052)).await.unwrap();

    // Dropping the receiver makes the connection report Closed.
    drop(rx2);
    registry.sweep();

    assert_eq!(registry.count(), 2);
    assert!(registry
        .snapshot()
        .iter()
        .all(|c| c.key != ClientKey::from(addr(5051))));
}

#[tokio::test]
async fn test_close_all_tears_down_registry() {
    let registry = ConnectionRegistry::new();

    let (conn1, _rx1) = registry.register(addr(5060)).await.unwrap();
    let (conn2, _rx2) = registry.register(addr(5061)).await.unwrap();

    registry.close_all();
    assert_eq!(registry.count(), 0);
    assert!(!conn1.is_connected());
    assert!(!conn2.is_connected());
}

// ============== DeliveryEngine Tests ==============

#[tokio::test]
async fn test_broadcast_on_empty_registry_is_noop() {
    let registry = ConnectionRegistry::new();
    let delivery = DeliveryEngine::new(registry.clone());

    let sent = delivery.broadcast(&WsEvent::pong()).await;
    assert_eq!(sent, 0);
    assert_eq!(registry.count(), 0);
}

#[tokio::test]
async fn test_broadcast_isolates_failed_recipient() {
    let registry = ConnectionRegistry::new();
    let delivery = DeliveryEngine::new(registry.clone());

    let (_conn1, mut rx1) = registry.register(addr(5070)).await.unwrap();
    let (_conn2, rx2) = registry.register(addr(5071)).await.unwrap();
    let (_conn3, mut rx3) = registry.register(addr(5072)).await.unwrap();

    // Drain welcomes, then kill the 2nd recipient.
    let _ = rx1.recv().await.unwrap();
    let _ = rx3.recv().await.unwrap();
    drop(rx2);

    let sent = delivery
        .broadcast(&WsEvent::system_message("clinic opening", Severity::Info))
        .await;

    // 1st and 3rd delivered; only the 2nd was removed.
    assert_eq!(sent, 2);
    assert_eq!(registry.count(), 2);
    assert!(matches!(
        rx1.recv().await.unwrap(),
        WsEvent::SystemMessage { .. }
    ));
    assert!(matches!(
        rx3.recv().await.unwrap(),
        WsEvent::SystemMessage { .. }
    ));
}

#[tokio::test]
async fn test_send_to_delivers_personal_event() {
    let registry = ConnectionRegistry::new();
    let delivery = DeliveryEngine::new(registry.clone());

    let (conn, mut rx) = registry.register(addr(5080)).await.unwrap();
    let _ = rx.recv().await.unwrap();

    delivery.send_to(&conn, WsEvent::pong()).await.unwrap();
    assert!(matches!(rx.recv().await.unwrap(), WsEvent::Pong { .. }));
    assert_eq!(registry.count(), 1);
}

#[tokio::test]
async fn test_send_to_dead_connection_evicts_without_sending() {
    let registry = ConnectionRegistry::new();
    let delivery = DeliveryEngine::new(registry.clone());

    let (conn, rx) = registry.register(addr(5090)).await.unwrap();
    drop(rx);

    let result = delivery.send_to(&conn, WsEvent::pong()).await;
    assert_eq!(result, Err(DeliveryError::NotConnected));
    assert_eq!(registry.count(), 0);
}

#[tokio::test]
async fn test_send_timeout_evicts_stalled_consumer() {
    let registry = ConnectionRegistry::new();
    let delivery =
        DeliveryEngine::new(registry.clone()).with_send_timeout(Duration::from_millis(50));

    let (conn, _rx) = registry.register(addr(5100)).await.unwrap();

    // Fill the connection's event buffer (the welcome already occupies one
    // slot) so the next delivery cannot make progress.
    for _ in 0..99 {
        assert!(conn.send(WsEvent::pong()).await);
    }

    let result = delivery.send_to(&conn, WsEvent::pong()).await;
    assert_eq!(result, Err(DeliveryError::TimedOut));
    assert_eq!(registry.count(), 0);
}

// ============== EventBroadcaster Tests ==============

#[tokio::test]
async fn test_welcome_ping_booking_scenario() {
    let registry = ConnectionRegistry::new();
    let delivery = DeliveryEngine::new(registry.clone());
    let broadcaster = EventBroadcaster::new(delivery.clone());

    // Connect client X: receives {event:"connected", connection_id:1}.
    let (conn, mut rx) = registry.register(addr(5110)).await.unwrap();
    match rx.recv().await.unwrap() {
        WsEvent::Connected { connection_id, .. } => assert_eq!(connection_id, 1),
        other => panic!("expected connected event, got {:?}", other),
    }

    // X sends "ping": receives {event:"pong"}.
    delivery.send_to(&conn, WsEvent::pong()).await.unwrap();
    assert!(matches!(rx.recv().await.unwrap(), WsEvent::Pong { .. }));

    // A booking is committed: X receives the new_booking event.
    let notified = broadcaster
        .notify_new_booking(
            "Jane Doe",
            "March 20, 2026 at 2:30 PM",
            "Checkup",
            42,
            Some("+10000000000"),
        )
        .await;
    assert_eq!(notified, 1);

    match rx.recv().await.unwrap() {
        WsEvent::NewBooking { data } => {
            assert_eq!(data.id, 42);
            assert_eq!(data.patient, "Jane Doe");
            assert_eq!(data.reason, "Checkup");
            assert_eq!(data.phone.as_deref(), Some("+10000000000"));
            assert_eq!(serde_json::to_value(data.status).unwrap(), "confirmed");
        }
        other => panic!("expected new_booking event, got {:?}", other),
    }
}

#[tokio::test]
async fn test_cancellation_reaches_all_clients_identically() {
    let registry = ConnectionRegistry::new();
    let broadcaster = EventBroadcaster::new(DeliveryEngine::new(registry.clone()));

    let (_conn1, mut rx1) = registry.register(addr(5120)).await.unwrap();
    let (_conn2, mut rx2) = registry.register(addr(5121)).await.unwrap();
    let _ = rx1.recv().await.unwrap();
    let _ = rx2.recv().await.unwrap();

    let notified = broadcaster
        .notify_cancellation("Jane Doe", "March 20, 2026 at 2:30 PM", 42, 1)
        .await;
    assert_eq!(notified, 2);

    let first = serde_json::to_value(rx1.recv().await.unwrap()).unwrap();
    let second = serde_json::to_value(rx2.recv().await.unwrap()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first["event"], "booking_canceled");
    assert_eq!(first["data"]["canceled_count"], 1);
}

#[tokio::test]
async fn test_sequential_notifications_preserve_order() {
    let registry = ConnectionRegistry::new();
    let broadcaster = EventBroadcaster::new(DeliveryEngine::new(registry.clone()));

    let (_conn, mut rx) = registry.register(addr(5130)).await.unwrap();
    let _ = rx.recv().await.unwrap();

    broadcaster
        .notify_new_booking("Jane Doe", "March 20, 2026 at 2:30 PM", "Checkup", 42, None)
        .await;
    broadcaster
        .notify_cancellation("Jane Doe", "March 20, 2026 at 2:30 PM", 42, 1)
        .await;

    assert!(matches!(rx.recv().await.unwrap(), WsEvent::NewBooking { .. }));
    assert!(matches!(
        rx.recv().await.unwrap(),
        WsEvent::BookingCanceled { .. }
    ));
}

#[tokio::test]
async fn test_notify_with_no_dashboards_is_silent() {
    let registry = ConnectionRegistry::new();
    let broadcaster = EventBroadcaster::new(DeliveryEngine::new(registry));

    let notified = broadcaster
        .notify_system("no one is watching", Severity::Error)
        .await;
    assert_eq!(notified, 0);
}
