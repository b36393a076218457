//! Value objects and entities shared by the registry and the coordinator.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::DomainError;

/// Opaque per-connection identity assigned by the transport layer.
///
/// Valid only for the lifetime of the connection; used as the key for
/// player records in both the directory and room mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh identity for a newly upgraded connection
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for ConnectionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Room identifier token.
///
/// Client-supplied ids are accepted as-is apart from an emptiness check;
/// generated ids are 8-digit numeric strings (see [`super::registry`]).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Create a room id from a client-supplied token
    pub fn new(token: String) -> Result<Self, DomainError> {
        if token.trim().is_empty() {
            return Err(DomainError::EmptyRoomId);
        }
        Ok(Self(token))
    }

    /// Registry-internal constructor for generated ids (always non-empty)
    pub(crate) fn new_unchecked(token: String) -> Self {
        Self(token)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single scenery coordinate in the shared world layout
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    pub x: f32,
    pub z: f32,
}

/// A connected player's last-known state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: ConnectionId,
    pub x: f32,
    pub z: f32,
    pub color: String,
    pub username: String,
}

/// Announce payload: both fields are required and must be non-empty
#[derive(Debug, Clone, Deserialize)]
pub struct PlayerProfile {
    pub color: String,
    pub username: String,
}

impl PlayerProfile {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.color.trim().is_empty() {
            return Err(DomainError::EmptyPlayerField("color"));
        }
        if self.username.trim().is_empty() {
            return Err(DomainError::EmptyPlayerField("username"));
        }
        Ok(())
    }
}

/// Optional player attributes supplied on room join.
///
/// Present fields take precedence over the assigned spawn position and any
/// previously announced profile.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlayerAttrs {
    pub x: Option<f32>,
    pub z: Option<f32>,
    pub color: Option<String>,
    pub username: Option<String>,
}

impl PlayerAttrs {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.x.is_some_and(|x| !x.is_finite()) {
            return Err(DomainError::NonFinitePosition("x"));
        }
        if self.z.is_some_and(|z| !z.is_finite()) {
            return Err(DomainError::NonFinitePosition("z"));
        }
        Ok(())
    }
}

/// Partial position update merged into an existing player record
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionDelta {
    pub x: Option<f32>,
    pub z: Option<f32>,
}

impl PositionDelta {
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.x.is_some_and(|x| !x.is_finite()) {
            return Err(DomainError::NonFinitePosition("x"));
        }
        if self.z.is_some_and(|z| !z.is_finite()) {
            return Err(DomainError::NonFinitePosition("z"));
        }
        Ok(())
    }
}

/// A logical partition of players sharing one scenery layout.
///
/// Scenery and `start_time` are generated exactly once at creation and never
/// regenerated, so every occupant renders an identical static world.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    pub players: HashMap<ConnectionId, Player>,
    pub start_time: i64,
    pub tree_positions: Vec<ScenePoint>,
    pub rock_positions: Vec<ScenePoint>,
}

impl Room {
    pub fn new(start_time: i64, tree_positions: Vec<ScenePoint>, rock_positions: Vec<ScenePoint>) -> Self {
        Self {
            players: HashMap::new(),
            start_time,
            tree_positions,
            rock_positions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_id_rejects_empty_token() {
        assert_eq!(RoomId::new(String::new()), Err(DomainError::EmptyRoomId));
        assert_eq!(RoomId::new("   ".to_string()), Err(DomainError::EmptyRoomId));
    }

    #[test]
    fn test_room_id_accepts_arbitrary_token() {
        let id = RoomId::new("42".to_string()).unwrap();

        assert_eq!(id.as_str(), "42");
    }

    #[test]
    fn test_player_profile_requires_non_empty_fields() {
        let missing_color = PlayerProfile {
            color: "".to_string(),
            username: "alice".to_string(),
        };
        let missing_username = PlayerProfile {
            color: "#ff8800".to_string(),
            username: " ".to_string(),
        };
        let valid = PlayerProfile {
            color: "#ff8800".to_string(),
            username: "alice".to_string(),
        };

        assert_eq!(
            missing_color.validate(),
            Err(DomainError::EmptyPlayerField("color"))
        );
        assert_eq!(
            missing_username.validate(),
            Err(DomainError::EmptyPlayerField("username"))
        );
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_position_delta_rejects_non_finite_components() {
        let nan = PositionDelta {
            x: Some(f32::NAN),
            z: None,
        };
        let inf = PositionDelta {
            x: None,
            z: Some(f32::INFINITY),
        };
        let partial = PositionDelta {
            x: Some(5.0),
            z: None,
        };

        assert_eq!(nan.validate(), Err(DomainError::NonFinitePosition("x")));
        assert_eq!(inf.validate(), Err(DomainError::NonFinitePosition("z")));
        assert!(partial.validate().is_ok());
    }

    #[test]
    fn test_player_attrs_rejects_non_finite_components() {
        let attrs = PlayerAttrs {
            x: Some(f32::NEG_INFINITY),
            ..PlayerAttrs::default()
        };

        assert_eq!(attrs.validate(), Err(DomainError::NonFinitePosition("x")));
        assert!(PlayerAttrs::default().validate().is_ok());
    }
}
