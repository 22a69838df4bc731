//! WebSocket endpoint for dashboard clients

use std::net::SocketAddr;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use dashboard_push::WsEvent;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::state::AppState;

/// GET /ws
///
/// Upgrade endpoint for dashboard clients. Clients are pre-authorized by the
/// enclosing network boundary; there is no per-connection auth here.
pub async fn ws_upgrade(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, remote))
}

/// One task pair per dashboard: a writer draining the registry channel into
/// the socket, and this reader loop watching for liveness probes and close.
async fn handle_socket(socket: WebSocket, state: AppState, remote: SocketAddr) {
    let (connection, receiver) = match state.registry.register(remote).await {
        Ok(pair) => pair,
        Err(err) => {
            tracing::warn!(%remote, error = %err, "Rejected dashboard connection");
            return;
        }
    };

    let (ws_sender, mut ws_receiver) = socket.split();
    let writer = tokio::spawn(write_events(ws_sender, receiver));
    let close_signal = connection.close_token();

    loop {
        tokio::select! {
            _ = close_signal.cancelled() => {
                tracing::debug!(client = %connection.key, "Connection closed by registry");
                break;
            }
            frame = ws_receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    if text.as_str() == "ping" {
                        // Liveness probe: answer with a personal pong. A
                        // failed pong evicts the connection like any other
                        // delivery failure.
                        let _ = state.delivery.send_to(&connection, WsEvent::pong()).await;
                    } else {
                        // Reserved for future client commands.
                        tracing::debug!(client = %connection.key, "Ignoring client frame");
                    }
                }
                Some(Ok(Message::Close(_))) => {
                    tracing::info!(client = %connection.key, "Client closed connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(err)) => {
                    tracing::warn!(
                        client = %connection.key,
                        error = %err,
                        "WebSocket receive error"
                    );
                    break;
                }
                None => break,
            }
        }
    }

    writer.abort();
    state.registry.disconnect_connection(&connection);
}

/// Writer half: serializes each queued event into one JSON text frame. When
/// the channel ends a close frame is sent best-effort.
async fn write_events(
    mut ws_sender: futures::stream::SplitSink<WebSocket, Message>,
    mut receiver: mpsc::Receiver<WsEvent>,
) {
    while let Some(event) = receiver.recv().await {
        let frame = match serde_json::to_string(&event) {
            Ok(json) => Message::Text(json.into()),
            Err(err) => {
                tracing::error!(error = %err, "Failed to serialize event");
                continue;
            }
        };
        if ws_sender.send(frame).await.is_err() {
            break;
        }
    }
    let _ = ws_sender.send(Message::Close(None)).await;
}
