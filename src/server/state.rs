//! Server state shared across handlers.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::MessagePusher;
use crate::relay::SessionCoordinator;

/// Shared application state.
///
/// The coordinator mutex serializes event processing: each inbound event runs
/// to completion (including dispatch of its outbound batch) before the next
/// one is accepted, which preserves per-room delivery order.
pub struct AppState {
    pub coordinator: Mutex<SessionCoordinator>,
    pub pusher: Arc<dyn MessagePusher>,
}
