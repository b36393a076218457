//! Data transfer objects for the relay, organized by protocol:
//! - `websocket`: tagged JSON event messages
//! - `http`: HTTP API response DTOs

pub mod http;
pub mod websocket;

pub use websocket::{ClientEvent, JoinRoomRequest, ServerEvent};
