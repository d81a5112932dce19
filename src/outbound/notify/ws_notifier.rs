//! Notifier adapter delivering events over live WebSocket connections.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::domain::ports::Notifier;
use crate::domain::UserId;
use crate::inbound::ws::messages::EventEnvelope;
use crate::inbound::ws::ConnectionRegistry;

/// Fan-out over the per-user connection registry. Delivery is best-effort;
/// users without a live connection simply miss the event.
#[derive(Clone)]
pub struct WsNotifier {
    registry: Arc<ConnectionRegistry>,
}

impl WsNotifier {
    pub fn new(registry: Arc<ConnectionRegistry>) -> Self {
        Self { registry }
    }
}

#[async_trait]
impl Notifier for WsNotifier {
    async fn broadcast_all(&self, event: &str, payload: Value) {
        let frame = EventEnvelope::new(event, payload).to_frame();
        self.registry.broadcast(&frame);
    }

    async fn send_to_user(&self, user_id: &UserId, event: &str, payload: Value) {
        let frame = EventEnvelope::new(event, payload).to_frame();
        if !self.registry.send_to(user_id, frame) {
            debug!(user_id = %user_id, event, "no live connection for event");
        }
    }
}
