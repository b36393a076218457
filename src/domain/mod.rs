//! Domain model for the position relay.
//!
//! Value objects (identities, players, rooms), the in-memory [`Registry`],
//! and the [`MessagePusher`] seam the server layer implements.

mod error;
mod model;
pub mod pusher;
pub mod registry;

pub use error::{DomainError, RegistryError};
pub use model::{ConnectionId, Player, PlayerAttrs, PlayerProfile, PositionDelta, Room, RoomId, ScenePoint};
pub use pusher::{MessagePushError, MessagePusher, PusherChannel};
pub use registry::{CollisionPolicy, Registry, Removal};
