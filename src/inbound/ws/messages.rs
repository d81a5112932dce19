//! Wire-level message definitions for the WebSocket adapter.
//!
//! Notifications are transformed into this envelope before being serialized
//! to JSON and sent to connected clients.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound event envelope: `{"event": "...", "payload": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventEnvelope {
    pub event: String,
    pub payload: Value,
}

impl EventEnvelope {
    pub fn new(event: &str, payload: Value) -> Self {
        Self {
            event: event.to_owned(),
            payload,
        }
    }

    /// Serialize to a text frame. Envelopes are built from already-valid
    /// JSON values, so serialization cannot fail.
    pub fn to_frame(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }
}
