//! WebSocket wire messages.
//!
//! Every frame is a JSON object tagged `{ "event": <name>, "data": <payload> }`
//! with camelCase event and field names. Disconnects are transport closes,
//! not messages, so they have no inbound variant.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{ConnectionId, Player, PlayerAttrs, PlayerProfile, PositionDelta, Room, RoomId};

/// Inbound events consumed from a client connection
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ClientEvent {
    /// Announce presence before (or without) joining a room
    PlayerInit(PlayerProfile),
    /// Create-or-join a room
    JoinRoom(JoinRoomRequest),
    /// Partial position update for the current room
    PlayerMove(PositionDelta),
}

/// Payload of a `joinRoom` event
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JoinRoomRequest {
    /// Target room token; required unless `is_random` is set
    pub room_id: Option<String>,
    /// Generate a fresh room id server-side instead of using `room_id`
    #[serde(default)]
    pub is_random: bool,
    /// Attributes merged over the assigned spawn position
    pub player_data: Option<PlayerAttrs>,
}

/// Outbound events produced by the coordinator
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Full directory snapshot, sent to the announcing connection only
    CurrentPlayers(HashMap<ConnectionId, Player>),
    /// A player appeared; global after an announce, room-scoped after a join
    NewPlayer(Player),
    /// Authoritative current-room snapshot, sent to the joining connection only
    #[serde(rename_all = "camelCase")]
    RoomJoined {
        room_id: RoomId,
        room_data: Room,
        current_players: HashMap<ConnectionId, Player>,
    },
    /// Updated player record, broadcast to the mover's room excluding the mover
    PlayerMoved(Player),
    /// A player left, broadcast to their former room
    PlayerDisconnected(ConnectionId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_event_parses_player_init() {
        let json = r##"{"event":"playerInit","data":{"color":"#ff8800","username":"alice"}}"##;

        let event: ClientEvent = serde_json::from_str(json).unwrap();

        match event {
            ClientEvent::PlayerInit(profile) => {
                assert_eq!(profile.color, "#ff8800");
                assert_eq!(profile.username, "alice");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_client_event_parses_join_room() {
        let json = r#"{"event":"joinRoom","data":{"roomId":"42","isRandom":false,"playerData":{"username":"alice"}}}"#;

        let event: ClientEvent = serde_json::from_str(json).unwrap();

        match event {
            ClientEvent::JoinRoom(req) => {
                assert_eq!(req.room_id.as_deref(), Some("42"));
                assert!(!req.is_random);
                assert_eq!(req.player_data.unwrap().username.as_deref(), Some("alice"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_client_event_join_room_defaults_is_random() {
        let json = r#"{"event":"joinRoom","data":{"roomId":"42"}}"#;

        let event: ClientEvent = serde_json::from_str(json).unwrap();

        match event {
            ClientEvent::JoinRoom(req) => assert!(!req.is_random),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_client_event_parses_partial_move() {
        let json = r#"{"event":"playerMove","data":{"x":5.0}}"#;

        let event: ClientEvent = serde_json::from_str(json).unwrap();

        match event {
            ClientEvent::PlayerMove(delta) => {
                assert_eq!(delta.x, Some(5.0));
                assert_eq!(delta.z, None);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_client_event_rejects_unknown_event_name() {
        let json = r#"{"event":"teleport","data":{}}"#;

        let result: Result<ClientEvent, _> = serde_json::from_str(json);

        assert!(result.is_err());
    }

    #[test]
    fn test_server_event_serializes_with_camel_case_tags() {
        let id = ConnectionId::generate();
        let event = ServerEvent::PlayerDisconnected(id);

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "playerDisconnected");
        assert_eq!(json["data"], id.to_string());
    }

    #[test]
    fn test_room_joined_serializes_camel_case_fields() {
        let id = ConnectionId::generate();
        let room = Room::new(1_700_000_000_000, vec![], vec![]);
        let player = Player {
            id,
            x: 1.0,
            z: 2.0,
            color: "#ff8800".to_string(),
            username: "alice".to_string(),
        };
        let event = ServerEvent::RoomJoined {
            room_id: RoomId::new("42".to_string()).unwrap(),
            room_data: room,
            current_players: HashMap::from([(id, player)]),
        };

        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["event"], "roomJoined");
        assert_eq!(json["data"]["roomId"], "42");
        assert_eq!(json["data"]["roomData"]["startTime"], 1_700_000_000_000_i64);
        assert!(json["data"]["roomData"]["treePositions"].is_array());
        assert!(json["data"]["currentPlayers"][id.to_string()].is_object());
    }
}
