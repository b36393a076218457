//! Error types for the domain layer.

use thiserror::Error;

/// Validation errors for value objects and inbound payloads
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    /// Room id token was empty or whitespace-only
    #[error("room id must not be empty")]
    EmptyRoomId,

    /// A required player attribute was empty
    #[error("player field '{0}' must not be empty")]
    EmptyPlayerField(&'static str),

    /// A position component was NaN or infinite
    #[error("position component '{0}' is not a finite number")]
    NonFinitePosition(&'static str),
}

/// Errors surfaced by the room registry
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// Generated room id collided with a live room (policy: fail)
    #[error("generated room id '{0}' collides with an existing room")]
    RoomIdCollision(String),

    /// Could not draw an unused room id within the configured attempts (policy: retry)
    #[error("no unused room id found after {0} attempts")]
    RoomIdSpaceExhausted(u32),
}
