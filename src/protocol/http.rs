//! HTTP API response DTOs.

use serde::Serialize;

use crate::domain::{Player, Room, RoomId};

/// Room summary returned by `GET /api/rooms`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummaryDto {
    pub id: String,
    pub player_count: usize,
    pub start_time: i64,
}

impl RoomSummaryDto {
    pub fn from_room(id: &RoomId, room: &Room) -> Self {
        Self {
            id: id.as_str().to_string(),
            player_count: room.players.len(),
            start_time: room.start_time,
        }
    }
}

/// Room detail returned by `GET /api/rooms/{room_id}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomDetailDto {
    pub id: String,
    pub start_time: i64,
    pub players: Vec<Player>,
}

impl RoomDetailDto {
    pub fn from_room(id: &RoomId, room: &Room) -> Self {
        Self {
            id: id.as_str().to_string(),
            start_time: room.start_time,
            players: room.players.values().cloned().collect(),
        }
    }
}
