//! Realtime multiplayer presence/position relay library.
//!
//! This library provides the server implementation for a WebSocket-based
//! position relay: clients announce themselves, join rooms with a shared
//! scenery layout, and receive the other occupants' movement broadcasts.

// layers
pub mod domain;
pub mod protocol;
pub mod relay;
pub mod server;

// shared library
pub mod common;
