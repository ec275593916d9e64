//! WebSocket endpoint for real-time dashboard updates
//!
//! `/ws/dashboard` sends a `connected` greeting, then one text frame per
//! published snapshot. A slow client only ever loses older snapshots.

use axum::extract::ws::{Message, WebSocket};
use axum::{
    extract::{State, WebSocketUpgrade},
    response::IntoResponse,
};
use futures::{SinkExt, StreamExt};
use tracing::{debug, warn};

use crate::events::SnapshotHub;
use crate::AppState;

/// WebSocket upgrade handler for dashboard snapshots
pub async fn dashboard_ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state.hub.clone()))
}

async fn handle_socket(socket: WebSocket, hub: SnapshotHub) {
    let (mut sender, mut receiver) = socket.split();
    let mut observer = hub.subscribe();

    debug!(observer_id = observer.id(), "Dashboard WebSocket client connected");

    let welcome = serde_json::json!({
        "type": "connected",
        "message": "Dashboard WebSocket connected"
    });
    if let Err(e) = sender.send(Message::Text(welcome.to_string().into())).await {
        warn!("Failed to send welcome message: {}", e);
        return;
    }

    // Incoming frames are only watched for close/errors
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    warn!("WebSocket receive error: {}", e);
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut recv_task => {
                debug!(observer_id = observer.id(), "Dashboard WebSocket client disconnected");
                break;
            }
            snapshot = observer.recv() => {
                let Some(snapshot) = snapshot else {
                    debug!("Snapshot hub closed");
                    let _ = sender.send(Message::Close(None)).await;
                    break;
                };
                let json = match serde_json::to_string(&*snapshot) {
                    Ok(j) => j,
                    Err(e) => {
                        warn!("Failed to serialize snapshot: {}", e);
                        continue;
                    }
                };
                if let Err(e) = sender.send(Message::Text(json.into())).await {
                    warn!("Failed to send snapshot: {}", e);
                    break;
                }
            }
        }
    }

    recv_task.abort();
}
