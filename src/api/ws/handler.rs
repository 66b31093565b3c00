//! WebSocket handler for real-time dispatch-tree updates.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::api::routes::AppState;
use crate::model::{CommandStatus, Id};

/// Dispatch-tree mutation events pushed to connected dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WsEvent {
    #[serde(rename = "node_created")]
    NodeCreated { node_id: Id },

    #[serde(rename = "node_status_changed")]
    NodeStatusChanged { node_id: Id, status: CommandStatus },

    #[serde(rename = "command_bound")]
    CommandBound { command_id: Id, render_node_id: Id },

    #[serde(rename = "render_node_registered")]
    RenderNodeRegistered { render_node_id: Id },

    #[serde(rename = "error")]
    Error { message: String },
}

/// WebSocket broadcast state, shared via `AppState`.
#[derive(Clone)]
pub struct BroadcastState {
    pub tx: broadcast::Sender<WsEvent>,
}

impl BroadcastState {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(256);
        Self { tx }
    }

    pub async fn broadcast(&self, event: WsEvent) {
        let _ = self.tx.send(event);
    }
}

impl Default for BroadcastState {
    fn default() -> Self {
        Self::new()
    }
}

/// `GET /ws`: upgrades to a WebSocket that streams every event broadcast
/// on `AppState::broadcast` as JSON text frames until the client disconnects.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_events(socket, state.broadcast.tx.subscribe()))
}

async fn stream_events(socket: WebSocket, mut events: broadcast::Receiver<WsEvent>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            event = events.recv() => {
                let event = match event {
                    Ok(event) => event,
                    Err(broadcast::error::RecvError::Lagged(_)) => continue,
                    Err(broadcast::error::RecvError::Closed) => break,
                };
                let Ok(text) = serde_json::to_string(&event) else { continue };
                if sender.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_status_changed_serializes_with_tag() {
        let event = WsEvent::NodeStatusChanged { node_id: 7, status: CommandStatus::Running };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("node_status_changed"));
        assert!(json.contains('7'));
    }

    #[test]
    fn broadcast_state_starts_with_no_subscribers() {
        let state = BroadcastState::new();
        assert_eq!(state.tx.receiver_count(), 0);
    }
}
