//! WebSocket and HTTP handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use tokio::sync::mpsc;

use crate::domain::{ConnectionId, MessagePusher, RoomId};
use crate::protocol::ClientEvent;
use crate::protocol::http::{RoomDetailDto, RoomSummaryDto};
use crate::relay::{Outbound, Recipient};

use super::state::AppState;

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    // Transport-assigned identity, valid for this connection's lifetime
    let connection_id = ConnectionId::generate();
    ws.on_upgrade(move |socket| handle_socket(socket, state, connection_id))
}

pub async fn handle_socket(socket: WebSocket, state: Arc<AppState>, connection_id: ConnectionId) {
    let (mut sender, mut receiver) = socket.split();

    // Channel through which the pusher delivers events to this client
    let (tx, mut rx) = mpsc::unbounded_channel();
    state.pusher.register_client(connection_id, tx).await;
    {
        let mut coordinator = state.coordinator.lock().await;
        coordinator.connect(connection_id);
    }
    tracing::info!("Connection '{}' upgraded and registered", connection_id);

    let state_clone = state.clone();

    // Receive events from this client and run them through the coordinator
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::error!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    let event = match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(
                                "Dropping malformed event from '{}': {}",
                                connection_id,
                                e
                            );
                            continue;
                        }
                    };

                    // Process to completion and dispatch before releasing the
                    // lock, so per-room delivery order matches processing order.
                    let mut coordinator = state_clone.coordinator.lock().await;
                    let batch = coordinator.handle_event(&connection_id, event);
                    dispatch(state_clone.pusher.as_ref(), connection_id, batch).await;
                }
                Message::Ping(_) => {
                    tracing::debug!("Received ping from '{}'", connection_id);
                    // Ping/pong is handled automatically by the WebSocket protocol
                }
                Message::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                _ => {}
            }
        }
    });

    // Forward events pushed by other connections to this client
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    // If any one of the tasks completes, abort the other
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Leave the current room and notify its remaining occupants
    {
        let mut coordinator = state.coordinator.lock().await;
        let batch = coordinator.disconnect(&connection_id);
        dispatch(state.pusher.as_ref(), connection_id, batch).await;
    }
    state.pusher.unregister_client(&connection_id).await;
    tracing::info!("Connection '{}' torn down", connection_id);
}

/// Deliver an outbound batch, resolving `Recipient::Sender` to the
/// originating connection. Delivery failures are logged, never surfaced.
pub(crate) async fn dispatch(
    pusher: &dyn MessagePusher,
    sender: ConnectionId,
    batch: Vec<Outbound>,
) {
    for outbound in batch {
        let payload = match serde_json::to_string(&outbound.event) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!("Failed to serialize outbound event: {}", e);
                continue;
            }
        };
        match outbound.to {
            Recipient::Sender => {
                if let Err(e) = pusher.push_to(&sender, &payload).await {
                    tracing::warn!("Failed to reply to '{}': {}", sender, e);
                }
            }
            Recipient::Clients(targets) => {
                if targets.is_empty() {
                    continue;
                }
                if let Err(e) = pusher.broadcast(targets, &payload).await {
                    tracing::warn!("Broadcast failed: {}", e);
                }
            }
        }
    }
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get list of live rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomSummaryDto>> {
    let coordinator = state.coordinator.lock().await;

    let mut summaries: Vec<RoomSummaryDto> = coordinator
        .registry()
        .rooms()
        .map(|(id, room)| RoomSummaryDto::from_room(id, room))
        .collect();
    summaries.sort_by(|a, b| a.id.cmp(&b.id));

    Json(summaries)
}

/// Get room detail by id
pub async fn get_room_detail(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomDetailDto>, StatusCode> {
    let Ok(room_id) = RoomId::new(room_id) else {
        return Err(StatusCode::NOT_FOUND);
    };
    let coordinator = state.coordinator.lock().await;

    match coordinator.registry().room(&room_id) {
        Some(room) => Ok(Json(RoomDetailDto::from_room(&room_id, room))),
        None => Err(StatusCode::NOT_FOUND),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::pusher::MockMessagePusher;
    use crate::protocol::ServerEvent;

    fn outbound(to: Recipient, event: ServerEvent) -> Outbound {
        Outbound { to, event }
    }

    #[tokio::test]
    async fn test_dispatch_routes_sender_reply_to_originator() {
        let sender = ConnectionId::generate();
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_push_to()
            .withf(move |id, payload| {
                *id == sender && payload.contains("\"event\":\"playerDisconnected\"")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        dispatch(
            &pusher,
            sender,
            vec![outbound(
                Recipient::Sender,
                ServerEvent::PlayerDisconnected(sender),
            )],
        )
        .await;
    }

    #[tokio::test]
    async fn test_dispatch_broadcasts_to_listed_clients() {
        let sender = ConnectionId::generate();
        let target = ConnectionId::generate();
        let mut pusher = MockMessagePusher::new();
        pusher
            .expect_broadcast()
            .withf(move |targets, payload| {
                *targets == vec![target] && payload.contains("\"event\":\"playerDisconnected\"")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        dispatch(
            &pusher,
            sender,
            vec![outbound(
                Recipient::Clients(vec![target]),
                ServerEvent::PlayerDisconnected(sender),
            )],
        )
        .await;
    }

    #[tokio::test]
    async fn test_dispatch_skips_empty_broadcasts() {
        let sender = ConnectionId::generate();
        let mut pusher = MockMessagePusher::new();
        pusher.expect_broadcast().times(0);

        dispatch(
            &pusher,
            sender,
            vec![outbound(
                Recipient::Clients(vec![]),
                ServerEvent::PlayerDisconnected(sender),
            )],
        )
        .await;
    }
}
