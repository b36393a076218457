//! Server execution logic.

use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::common::time::SystemClock;
use crate::domain::Registry;
use crate::relay::SessionCoordinator;

use super::{
    config::CorsConfig,
    handler::{get_room_detail, get_rooms, health_check, websocket_handler},
    pusher::WebSocketMessagePusher,
    signal::shutdown_signal,
    state::AppState,
};

/// Run the position relay server
///
/// # Arguments
///
/// * `host` - The host address to bind to (e.g., "127.0.0.1")
/// * `port` - The port number to bind to (e.g., 3001)
pub async fn run_server(host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    // Registry and coordinator live for the whole process; a restart loses
    // all rooms and players by design.
    let coordinator = SessionCoordinator::new(Registry::default(), Arc::new(SystemClock));
    let app_state = Arc::new(AppState {
        coordinator: Mutex::new(coordinator),
        pusher: Arc::new(WebSocketMessagePusher::default()),
    });

    let cors = CorsConfig::from_env();

    let app = Router::new()
        .route("/ws", get(websocket_handler))
        .route("/api/health", get(health_check))
        .route("/api/rooms", get(get_rooms))
        .route("/api/rooms/{room_id}", get(get_room_detail))
        .layer(cors.layer())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let bind_addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    tracing::info!(
        "Position relay server listening on {}",
        listener.local_addr()?
    );
    tracing::info!("Connect to: ws://{}/ws", bind_addr);
    tracing::info!("Press Ctrl+C to shutdown gracefully");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
