//! WebSocket relay server implementation.

mod config;
mod handler;
mod pusher;
mod runner;
mod signal;
mod state;

pub use pusher::WebSocketMessagePusher;
pub use runner::run_server;
