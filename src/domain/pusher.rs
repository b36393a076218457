//! Message delivery seam between the coordinator and the transport.
//!
//! The domain layer decides *who* receives an event; this trait abstracts
//! *how* it reaches them. The WebSocket implementation lives in the server
//! layer; tests substitute a mock.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

use super::model::ConnectionId;

/// Channel used to push serialized messages to a single connection
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// Errors when pushing messages to clients
#[derive(Debug, Error)]
pub enum MessagePushError {
    #[error("client '{0}' not found")]
    ClientNotFound(String),

    #[error("failed to push message: {0}")]
    PushFailed(String),
}

/// Outbound message delivery to connected clients.
///
/// Broadcast delivery is fire-and-forget per recipient: individual send
/// failures are logged and skipped, never surfaced to the originator.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessagePusher: Send + Sync {
    /// Register a newly connected client's sender channel
    async fn register_client(&self, id: ConnectionId, sender: PusherChannel);

    /// Remove a disconnected client's sender channel
    async fn unregister_client(&self, id: &ConnectionId);

    /// Push a message to a single client
    async fn push_to(&self, id: &ConnectionId, content: &str) -> Result<(), MessagePushError>;

    /// Push a message to every listed client, tolerating per-recipient failure
    async fn broadcast(&self, targets: Vec<ConnectionId>, content: &str)
    -> Result<(), MessagePushError>;
}
