//! Session coordinator.
//!
//! Consumes connection lifecycle events (connect, announce, join-room, move,
//! disconnect), mutates the registry and the global directory, and decides
//! which connections receive which outgoing event. Handlers are synchronous
//! and return outbound batches; the server layer owns delivery and serializes
//! event processing, so no handler ever observes a half-applied transition.

use std::collections::HashMap;
use std::sync::Arc;

use crate::common::time::Clock;
use crate::domain::registry::random_spawn;
use crate::domain::{
    ConnectionId, Player, PlayerAttrs, PlayerProfile, PositionDelta, Registry, Removal, RoomId,
};
use crate::protocol::{ClientEvent, JoinRoomRequest, ServerEvent};

/// Delivery scope of one outbound event
#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    /// The connection whose inbound event produced this message
    Sender,
    /// An explicit set of connections (fan-out, originator excluded)
    Clients(Vec<ConnectionId>),
}

/// One outbound event plus its delivery scope
#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Recipient,
    pub event: ServerEvent,
}

impl Outbound {
    fn to_sender(event: ServerEvent) -> Self {
        Self {
            to: Recipient::Sender,
            event,
        }
    }

    fn to_clients(targets: Vec<ConnectionId>, event: ServerEvent) -> Self {
        Self {
            to: Recipient::Clients(targets),
            event,
        }
    }
}

/// Per-connection session state: which room, if any, the connection is in
#[derive(Debug, Default)]
struct Session {
    room: Option<RoomId>,
}

/// Event-driven coordinator over the registry and the global directory.
///
/// All operations are best-effort: missing rooms, players, or sessions are
/// benign no-ops and produce an empty batch, never an error.
pub struct SessionCoordinator {
    registry: Registry,
    directory: HashMap<ConnectionId, Player>,
    sessions: HashMap<ConnectionId, Session>,
    clock: Arc<dyn Clock>,
}

impl SessionCoordinator {
    pub fn new(registry: Registry, clock: Arc<dyn Clock>) -> Self {
        Self {
            registry,
            directory: HashMap::new(),
            sessions: HashMap::new(),
            clock,
        }
    }

    /// Read access for the HTTP inspection endpoints
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Register a newly upgraded connection in the Unassigned state
    pub fn connect(&mut self, id: ConnectionId) {
        self.sessions.insert(id, Session::default());
        tracing::info!("Connection '{}' registered", id);
    }

    /// Dispatch one inbound event to its handler
    pub fn handle_event(&mut self, id: &ConnectionId, event: ClientEvent) -> Vec<Outbound> {
        match event {
            ClientEvent::PlayerInit(profile) => self.on_player_init(id, profile),
            ClientEvent::JoinRoom(request) => self.on_join_room(id, request),
            ClientEvent::PlayerMove(delta) => self.on_player_move(id, delta),
        }
    }

    /// Announce: register in the global directory, reply with the full
    /// directory snapshot, and broadcast the new record to everyone else.
    fn on_player_init(&mut self, id: &ConnectionId, profile: PlayerProfile) -> Vec<Outbound> {
        if let Err(e) = profile.validate() {
            tracing::warn!("Dropping playerInit from '{}': {}", id, e);
            return Vec::new();
        }
        if !self.sessions.contains_key(id) {
            tracing::warn!("Dropping playerInit from unknown connection '{}'", id);
            return Vec::new();
        }

        let (x, z) = random_spawn(&mut rand::thread_rng());
        let player = Player {
            id: *id,
            x,
            z,
            color: profile.color,
            username: profile.username,
        };
        self.directory.insert(*id, player.clone());
        tracing::info!("Player '{}' announced as '{}'", id, player.username);

        let others: Vec<ConnectionId> = self
            .sessions
            .keys()
            .filter(|conn| *conn != id)
            .copied()
            .collect();
        vec![
            Outbound::to_sender(ServerEvent::CurrentPlayers(self.directory.clone())),
            Outbound::to_clients(others, ServerEvent::NewPlayer(player)),
        ]
    }

    /// Create-or-join a room, leaving the previous one first if different.
    fn on_join_room(&mut self, id: &ConnectionId, request: JoinRoomRequest) -> Vec<Outbound> {
        if !self.sessions.contains_key(id) {
            tracing::warn!("Dropping joinRoom from unknown connection '{}'", id);
            return Vec::new();
        }
        let Some(target) = self.resolve_room_id(id, &request) else {
            return Vec::new();
        };
        let attrs = request.player_data.unwrap_or_default();
        if let Err(e) = attrs.validate() {
            tracing::warn!("Dropping joinRoom from '{}': {}", id, e);
            return Vec::new();
        }

        let now = self.clock.now_millis();
        self.registry.create_room(&target, now);

        let mut batch = Vec::new();

        // Leave the previous room first. Rejoining the same room skips this
        // so the room (and its scenery) survives a sole occupant's rejoin.
        let previous = self.sessions.get(id).and_then(|s| s.room.clone());
        if let Some(previous) = previous {
            if previous != target {
                if let Removal::Removed { .. } = self.registry.remove_player(&previous, id) {
                    batch.push(Outbound::to_clients(
                        self.occupants_except(&previous, id),
                        ServerEvent::PlayerDisconnected(*id),
                    ));
                }
            }
        }

        let player = self.build_room_player(id, attrs);
        if self.registry.add_player(&target, player.clone()).is_none() {
            // Unreachable in practice: the room was just created above
            tracing::warn!("Room '{}' vanished before '{}' could join", target, id);
            return batch;
        }
        if let Some(session) = self.sessions.get_mut(id) {
            session.room = Some(target.clone());
        }
        tracing::info!("Player '{}' joined room '{}'", id, target);

        if let Some(room) = self.registry.room(&target) {
            batch.push(Outbound::to_sender(ServerEvent::RoomJoined {
                room_id: target.clone(),
                room_data: room.clone(),
                current_players: room.players.clone(),
            }));
        }
        batch.push(Outbound::to_clients(
            self.occupants_except(&target, id),
            ServerEvent::NewPlayer(player),
        ));
        batch
    }

    /// Merge a movement delta into the current room's record and fan the
    /// updated record out to the other occupants. Silently dropped when the
    /// connection has no room or record.
    fn on_player_move(&mut self, id: &ConnectionId, delta: PositionDelta) -> Vec<Outbound> {
        if let Err(e) = delta.validate() {
            tracing::warn!("Dropping playerMove from '{}': {}", id, e);
            return Vec::new();
        }
        let Some(room_id) = self.sessions.get(id).and_then(|s| s.room.clone()) else {
            tracing::debug!("Dropping playerMove from roomless connection '{}'", id);
            return Vec::new();
        };
        match self.registry.update_player(&room_id, id, &delta) {
            Some(updated) => vec![Outbound::to_clients(
                self.occupants_except(&room_id, id),
                ServerEvent::PlayerMoved(updated),
            )],
            None => {
                tracing::debug!("Dropping playerMove from '{}': no record in '{}'", id, room_id);
                Vec::new()
            }
        }
    }

    /// Tear down a connection: leave the current room (deleting it if empty,
    /// notifying the remaining occupants otherwise) and drop the directory
    /// entry and session.
    pub fn disconnect(&mut self, id: &ConnectionId) -> Vec<Outbound> {
        self.directory.remove(id);
        let Some(session) = self.sessions.remove(id) else {
            return Vec::new();
        };
        tracing::info!("Connection '{}' disconnected", id);

        let Some(room_id) = session.room else {
            return Vec::new();
        };
        match self.registry.remove_player(&room_id, id) {
            Removal::Removed { .. } => vec![Outbound::to_clients(
                self.occupants_except(&room_id, id),
                ServerEvent::PlayerDisconnected(*id),
            )],
            // No occupants remain to notify when the room was deleted
            Removal::RoomDeleted | Removal::NotFound => Vec::new(),
        }
    }

    /// Resolve the target room id: generated when random, supplied otherwise
    fn resolve_room_id(&self, id: &ConnectionId, request: &JoinRoomRequest) -> Option<RoomId> {
        if request.is_random {
            match self.registry.generate_room_id() {
                Ok(room_id) => Some(room_id),
                Err(e) => {
                    tracing::warn!("Dropping joinRoom from '{}': {}", id, e);
                    None
                }
            }
        } else {
            let token = request.room_id.clone()?;
            match RoomId::new(token) {
                Ok(room_id) => Some(room_id),
                Err(e) => {
                    tracing::warn!("Dropping joinRoom from '{}': {}", id, e);
                    None
                }
            }
        }
    }

    /// Build the room record: fresh spawn, overridden by supplied attributes,
    /// falling back to the announced directory profile for color/username.
    fn build_room_player(&self, id: &ConnectionId, attrs: PlayerAttrs) -> Player {
        let (spawn_x, spawn_z) = random_spawn(&mut rand::thread_rng());
        let profile = self.directory.get(id);
        Player {
            id: *id,
            x: attrs.x.unwrap_or(spawn_x),
            z: attrs.z.unwrap_or(spawn_z),
            color: attrs
                .color
                .or_else(|| profile.map(|p| p.color.clone()))
                .unwrap_or_default(),
            username: attrs
                .username
                .or_else(|| profile.map(|p| p.username.clone()))
                .unwrap_or_default(),
        }
    }

    /// All current occupants of a room except the originating connection
    fn occupants_except(&self, room_id: &RoomId, except: &ConnectionId) -> Vec<ConnectionId> {
        self.registry
            .room(room_id)
            .map(|room| {
                room.players
                    .keys()
                    .filter(|conn| *conn != except)
                    .copied()
                    .collect()
            })
            .unwrap_or_default()
    }
}
