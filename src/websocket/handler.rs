//! WebSocket endpoint for live queue updates.
//!
//! Viewers are receive-only: every connection subscribes to the event hub
//! and gets each event as a JSON text frame. A viewer that falls behind the
//! broadcast buffer loses the oldest events and is expected to refetch via
//! the HTTP API; stored state is the source of truth.

use std::time::Duration;

use axum::{
    body::Bytes,
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast;

use crate::server::AppState;

/// WebSocket upgrade handler
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an established viewer connection
async fn handle_socket(socket: WebSocket, state: AppState) {
    let mut events = state.hub.subscribe();
    tracing::info!(viewers = state.hub.viewer_count(), "Viewer connected");

    let (mut sender, mut receiver) = socket.split();
    let mut heartbeat =
        tokio::time::interval(Duration::from_secs(state.settings.websocket.heartbeat));
    // First tick completes immediately
    heartbeat.tick().await;

    loop {
        tokio::select! {
            event = events.recv() => match event {
                Ok(event) => {
                    let text = match serde_json::to_string(&event) {
                        Ok(text) => text,
                        Err(e) => {
                            tracing::error!(error = %e, "Failed to serialize event");
                            continue;
                        }
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(missed, "Viewer lagging, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            msg = receiver.next() => match msg {
                Some(Ok(Message::Ping(payload))) => {
                    if sender.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                // Viewers are receive-only; ignore any other frames
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "WebSocket receive error");
                    break;
                }
            },
            _ = heartbeat.tick() => {
                if sender.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    tracing::info!(viewers = state.hub.viewer_count(), "Viewer disconnected");
}
