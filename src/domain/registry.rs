//! In-memory room registry.
//!
//! Authoritative store of live rooms and their player mappings, plus the
//! generators for room ids, scenery layouts, and spawn positions. All state
//! is process-wide and lost on restart; there is no persistence.

use std::collections::HashMap;

use rand::Rng;

use super::error::RegistryError;
use super::model::{ConnectionId, Player, PositionDelta, Room, RoomId, ScenePoint};

/// Number of tree scenery points generated per room
pub const TREE_COUNT: usize = 20;
/// Number of rock scenery points generated per room
pub const ROCK_COUNT: usize = 15;
/// Scenery coordinates are uniform in [-width/2, width/2)
pub const SCENERY_FIELD_WIDTH: f32 = 90.0;
/// Spawn coordinates are uniform in [-width/2, width/2)
pub const SPAWN_FIELD_WIDTH: f32 = 10.0;

const ROOM_ID_MIN: u32 = 10_000_000;
const ROOM_ID_MAX: u32 = 100_000_000;

/// How generated room ids are checked against live rooms.
///
/// The identifier space is large enough that collisions are negligible in
/// practice, so `Ignore` matches the historical behavior; `Retry` is the
/// default because redraws are cheap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionPolicy {
    /// Never check; a colliding id joins the existing room
    Ignore,
    /// Redraw up to `attempts` times before giving up
    Retry { attempts: u32 },
    /// Error on the first collision
    Fail,
}

impl Default for CollisionPolicy {
    fn default() -> Self {
        Self::Retry { attempts: 16 }
    }
}

/// Outcome of removing a player from a room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Room or player did not exist; nothing changed
    NotFound,
    /// Player removed; the room still has `remaining` occupants
    Removed { remaining: usize },
    /// Player removed and the now-empty room was deleted
    RoomDeleted,
}

/// Draw an 8-digit numeric room id token
pub fn random_room_id_token(rng: &mut impl Rng) -> String {
    rng.gen_range(ROOM_ID_MIN..ROOM_ID_MAX).to_string()
}

/// Draw a scenery coordinate, uniform in [-45, 45)
fn random_scene_point(rng: &mut impl Rng) -> ScenePoint {
    ScenePoint {
        x: (rng.r#gen::<f32>() - 0.5) * SCENERY_FIELD_WIDTH,
        z: (rng.r#gen::<f32>() - 0.5) * SCENERY_FIELD_WIDTH,
    }
}

/// Generate the fixed-size tree and rock layouts for a new room
pub fn generate_scenery(rng: &mut impl Rng) -> (Vec<ScenePoint>, Vec<ScenePoint>) {
    let trees = (0..TREE_COUNT).map(|_| random_scene_point(rng)).collect();
    let rocks = (0..ROCK_COUNT).map(|_| random_scene_point(rng)).collect();
    (trees, rocks)
}

/// Draw an initial spawn position, uniform in [-5, 5) per axis
pub fn random_spawn(rng: &mut impl Rng) -> (f32, f32) {
    (
        (rng.r#gen::<f32>() - 0.5) * SPAWN_FIELD_WIDTH,
        (rng.r#gen::<f32>() - 0.5) * SPAWN_FIELD_WIDTH,
    )
}

/// In-memory store of live rooms keyed by room id.
///
/// Missing-entity conditions are benign: lookups return `Option`, removal
/// reports its outcome, and only id generation can error (per the collision
/// policy).
#[derive(Debug)]
pub struct Registry {
    rooms: HashMap<RoomId, Room>,
    collision_policy: CollisionPolicy,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new(CollisionPolicy::default())
    }
}

impl Registry {
    pub fn new(collision_policy: CollisionPolicy) -> Self {
        Self {
            rooms: HashMap::new(),
            collision_policy,
        }
    }

    /// Create a room if absent. Scenery and `start_time` are generated
    /// exactly once; calling this for an existing room changes nothing.
    pub fn create_room(&mut self, id: &RoomId, now_millis: i64) -> &Room {
        self.rooms.entry(id.clone()).or_insert_with(|| {
            let (trees, rocks) = generate_scenery(&mut rand::thread_rng());
            tracing::info!("Room '{}' created", id);
            Room::new(now_millis, trees, rocks)
        })
    }

    pub fn room(&self, id: &RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    /// Iterate over all live rooms
    pub fn rooms(&self) -> impl Iterator<Item = (&RoomId, &Room)> {
        self.rooms.iter()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    /// Insert or overwrite a player record. Returns `None` if the room does
    /// not exist; creating it first is the caller's responsibility.
    pub fn add_player(&mut self, room_id: &RoomId, player: Player) -> Option<&Player> {
        let room = self.rooms.get_mut(room_id)?;
        let id = player.id;
        room.players.insert(id, player);
        room.players.get(&id)
    }

    /// Delete a player record. If the room becomes empty it is deleted in
    /// the same call, so no empty room outlives a departure.
    pub fn remove_player(&mut self, room_id: &RoomId, id: &ConnectionId) -> Removal {
        let Some(room) = self.rooms.get_mut(room_id) else {
            return Removal::NotFound;
        };
        if room.players.remove(id).is_none() {
            return Removal::NotFound;
        }
        let remaining = room.players.len();
        if room.is_empty() {
            self.rooms.remove(room_id);
            tracing::info!("Room '{}' is empty and was deleted", room_id);
            return Removal::RoomDeleted;
        }
        Removal::Removed { remaining }
    }

    /// Merge the present fields of a position delta into an existing record.
    /// Returns the updated record, or `None` if room or player is absent.
    pub fn update_player(
        &mut self,
        room_id: &RoomId,
        id: &ConnectionId,
        delta: &PositionDelta,
    ) -> Option<Player> {
        let player = self.rooms.get_mut(room_id)?.players.get_mut(id)?;
        if let Some(x) = delta.x {
            player.x = x;
        }
        if let Some(z) = delta.z {
            player.z = z;
        }
        Some(player.clone())
    }

    /// Generate a fresh room id, applying the configured collision policy
    pub fn generate_room_id(&self) -> Result<RoomId, RegistryError> {
        self.generate_room_id_with(&mut rand::thread_rng())
    }

    /// Generate a fresh room id from the supplied rng (seeded in tests)
    pub fn generate_room_id_with(&self, rng: &mut impl Rng) -> Result<RoomId, RegistryError> {
        match self.collision_policy {
            CollisionPolicy::Ignore => Ok(RoomId::new_unchecked(random_room_id_token(rng))),
            CollisionPolicy::Fail => {
                let id = RoomId::new_unchecked(random_room_id_token(rng));
                if self.rooms.contains_key(&id) {
                    return Err(RegistryError::RoomIdCollision(id.as_str().to_string()));
                }
                Ok(id)
            }
            CollisionPolicy::Retry { attempts } => {
                for _ in 0..attempts {
                    let id = RoomId::new_unchecked(random_room_id_token(rng));
                    if !self.rooms.contains_key(&id) {
                        return Ok(id);
                    }
                }
                Err(RegistryError::RoomIdSpaceExhausted(attempts))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn room_id(token: &str) -> RoomId {
        RoomId::new(token.to_string()).unwrap()
    }

    fn player(id: ConnectionId, x: f32, z: f32) -> Player {
        Player {
            id,
            x,
            z,
            color: "#ff8800".to_string(),
            username: "alice".to_string(),
        }
    }

    #[test]
    fn test_create_room_generates_full_scenery() {
        let mut registry = Registry::default();
        let id = room_id("42");

        let room = registry.create_room(&id, 1_700_000_000_000);

        assert_eq!(room.tree_positions.len(), TREE_COUNT);
        assert_eq!(room.rock_positions.len(), ROCK_COUNT);
        assert_eq!(room.start_time, 1_700_000_000_000);
        assert!(room.players.is_empty());
        let half = SCENERY_FIELD_WIDTH / 2.0;
        for point in room.tree_positions.iter().chain(&room.rock_positions) {
            assert!(point.x >= -half && point.x < half);
            assert!(point.z >= -half && point.z < half);
        }
    }

    #[test]
    fn test_create_room_is_idempotent() {
        let mut registry = Registry::default();
        let id = room_id("42");

        let first = registry.create_room(&id, 1000).clone();
        let second = registry.create_room(&id, 2000).clone();

        // Scenery and start_time are generated once, never regenerated
        assert_eq!(first, second);
        assert_eq!(second.start_time, 1000);
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_add_player_requires_existing_room() {
        let mut registry = Registry::default();
        let id = room_id("42");
        let conn = ConnectionId::generate();

        let result = registry.add_player(&id, player(conn, 0.0, 0.0));

        assert!(result.is_none());
        assert!(registry.room(&id).is_none());
    }

    #[test]
    fn test_add_player_overwrites_existing_record() {
        let mut registry = Registry::default();
        let id = room_id("42");
        let conn = ConnectionId::generate();
        registry.create_room(&id, 1000);

        registry.add_player(&id, player(conn, 1.0, 1.0));
        let replaced = registry.add_player(&id, player(conn, 2.0, 3.0)).cloned();

        let replaced = replaced.unwrap();
        assert_eq!(replaced.x, 2.0);
        assert_eq!(replaced.z, 3.0);
        assert_eq!(registry.room(&id).unwrap().players.len(), 1);
    }

    #[test]
    fn test_remove_player_keeps_room_with_remaining_occupants() {
        let mut registry = Registry::default();
        let id = room_id("42");
        let alice = ConnectionId::generate();
        let bob = ConnectionId::generate();
        registry.create_room(&id, 1000);
        registry.add_player(&id, player(alice, 0.0, 0.0));
        registry.add_player(&id, player(bob, 1.0, 1.0));

        let outcome = registry.remove_player(&id, &alice);

        assert_eq!(outcome, Removal::Removed { remaining: 1 });
        let room = registry.room(&id).unwrap();
        assert!(room.players.contains_key(&bob));
        assert!(!room.players.contains_key(&alice));
    }

    #[test]
    fn test_remove_last_player_deletes_room() {
        let mut registry = Registry::default();
        let id = room_id("42");
        let alice = ConnectionId::generate();
        registry.create_room(&id, 1000);
        registry.add_player(&id, player(alice, 0.0, 0.0));

        let outcome = registry.remove_player(&id, &alice);

        assert_eq!(outcome, Removal::RoomDeleted);
        assert!(registry.room(&id).is_none());
        assert_eq!(registry.room_count(), 0);
    }

    #[test]
    fn test_remove_player_missing_entities_are_benign() {
        let mut registry = Registry::default();
        let id = room_id("42");
        let conn = ConnectionId::generate();

        // Missing room
        assert_eq!(registry.remove_player(&id, &conn), Removal::NotFound);

        // Missing player in an existing room
        registry.create_room(&id, 1000);
        registry.add_player(&id, player(ConnectionId::generate(), 0.0, 0.0));
        assert_eq!(registry.remove_player(&id, &conn), Removal::NotFound);
        assert_eq!(registry.room_count(), 1);
    }

    #[test]
    fn test_update_player_merges_present_fields_only() {
        let mut registry = Registry::default();
        let id = room_id("42");
        let conn = ConnectionId::generate();
        registry.create_room(&id, 1000);
        registry.add_player(&id, player(conn, 1.0, 2.0));

        let updated = registry.update_player(
            &id,
            &conn,
            &PositionDelta {
                x: Some(5.0),
                z: None,
            },
        );

        let updated = updated.unwrap();
        assert_eq!(updated.x, 5.0);
        assert_eq!(updated.z, 2.0);
        assert_eq!(updated.username, "alice");
    }

    #[test]
    fn test_update_player_missing_entities_return_none() {
        let mut registry = Registry::default();
        let id = room_id("42");
        let conn = ConnectionId::generate();
        let delta = PositionDelta {
            x: Some(1.0),
            z: Some(1.0),
        };

        assert!(registry.update_player(&id, &conn, &delta).is_none());

        registry.create_room(&id, 1000);
        assert!(registry.update_player(&id, &conn, &delta).is_none());
    }

    #[test]
    fn test_generated_room_id_is_eight_digits() {
        let registry = Registry::default();
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let id = registry.generate_room_id_with(&mut rng).unwrap();
            assert_eq!(id.as_str().len(), 8);
            assert!(id.as_str().chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_collision_policy_fail_rejects_live_id() {
        let mut registry = Registry::new(CollisionPolicy::Fail);
        // Occupy the id a fresh seed-7 rng would draw first
        let occupied = registry
            .generate_room_id_with(&mut StdRng::seed_from_u64(7))
            .unwrap();
        registry.create_room(&occupied, 1000);

        let result = registry.generate_room_id_with(&mut StdRng::seed_from_u64(7));

        assert_eq!(
            result,
            Err(RegistryError::RoomIdCollision(
                occupied.as_str().to_string()
            ))
        );
    }

    #[test]
    fn test_collision_policy_retry_redraws_past_live_id() {
        let mut registry = Registry::new(CollisionPolicy::Retry { attempts: 16 });
        let occupied = registry
            .generate_room_id_with(&mut StdRng::seed_from_u64(7))
            .unwrap();
        registry.create_room(&occupied, 1000);

        let redrawn = registry
            .generate_room_id_with(&mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_ne!(redrawn, occupied);
    }

    #[test]
    fn test_collision_policy_ignore_accepts_live_id() {
        let mut registry = Registry::new(CollisionPolicy::Ignore);
        let occupied = registry
            .generate_room_id_with(&mut StdRng::seed_from_u64(7))
            .unwrap();
        registry.create_room(&occupied, 1000);

        let drawn = registry
            .generate_room_id_with(&mut StdRng::seed_from_u64(7))
            .unwrap();

        assert_eq!(drawn, occupied);
    }

    #[test]
    fn test_random_spawn_stays_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        let half = SPAWN_FIELD_WIDTH / 2.0;

        for _ in 0..100 {
            let (x, z) = random_spawn(&mut rng);
            assert!(x >= -half && x < half);
            assert!(z >= -half && z < half);
        }
    }
}
