//! Port abstraction for pushing realtime events to connected clients.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::UserId;

/// Port for best-effort realtime notification delivery.
///
/// Delivery is fire-and-forget: events for users without a live connection
/// are dropped, and no method here can fail the calling operation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Push an event to every connected client.
    async fn broadcast_all(&self, event: &str, payload: Value);

    /// Push an event to a single user's most recent connection, if any.
    async fn send_to_user(&self, user_id: &UserId, event: &str, payload: Value);
}
