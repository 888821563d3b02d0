//! WebSocket handler for viewer connections.

use axum::{
    extract::{
        Query, State, WebSocketUpgrade,
        ws::{Message, WebSocket},
    },
    response::Response,
};
use futures::StreamExt;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::api::{ApiError, ApiResult, AppState};
use crate::config::HubConfig;

use super::client::{Client, Frame, run_writer};
use super::hub::RoomHub;
use super::types::RoomEvent;

#[derive(Debug, Default, Deserialize)]
pub struct WsQuery {
    #[serde(rename = "roomId")]
    pub room_id: Option<String>,
}

/// WebSocket upgrade handler.
///
/// GET /ws?roomId={presentation_id}
pub async fn ws_handler(
    State(state): State<AppState>,
    Query(query): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> ApiResult<Response> {
    let room_id = query
        .room_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::bad_request("roomId query parameter is required"))?;

    info!("WebSocket upgrade request for room {}", room_id);

    let hub = state.hub.clone();
    let config = state.hub_config.clone();
    Ok(ws.on_upgrade(move |socket| handle_socket(socket, hub, room_id, config)))
}

/// Run one viewer connection until either side goes away.
async fn handle_socket(socket: WebSocket, hub: RoomHub, room_id: String, config: HubConfig) {
    let (client, outbox) = Client::new(room_id.clone(), config.client_queue_capacity);
    let client_id = client.id;

    // Queued before registration so it is always the first frame out.
    let connected = match (RoomEvent::Connected {
        room_id: room_id.clone(),
    })
    .to_json()
    {
        Ok(json) => json,
        Err(e) => {
            warn!("Failed to encode connected event: {}", e);
            return;
        }
    };
    if client.try_push(Frame::from(connected)).is_err() {
        return;
    }

    if hub.register(client).await.is_err() {
        warn!("Room hub unavailable, dropping connection for room {}", room_id);
        return;
    }

    let (sink, mut stream) = socket.split();
    let mut writer = tokio::spawn(run_writer(outbox, sink, config.ping_interval()));

    let reader = async {
        while let Some(message) = stream.next().await {
            match message {
                Ok(Message::Text(text)) => {
                    debug!("Ignoring {} byte text frame from {}", text.as_str().len(), client_id);
                }
                Ok(Message::Close(_)) => {
                    debug!("Client {} closed the connection", client_id);
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    debug!("WebSocket error for client {}: {}", client_id, e);
                    break;
                }
            }
        }
    };

    tokio::select! {
        _ = reader => writer.abort(),
        exit = &mut writer => debug!("Writer for client {} finished: {:?}", client_id, exit),
    }

    let _ = hub.unregister(&room_id, client_id).await;
    info!("WebSocket connection closed for client {} in room {}", client_id, room_id);
}
