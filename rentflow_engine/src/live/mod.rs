//! Live-connection plumbing for real-time delivery.
//!
//! A live connection is an open, addressable transport handle for a currently-connected client.
//! It is distinct from the durable notification record: everything sent through this module is
//! best-effort and may be lost; durability comes from the notifications table.
mod registry;

use chrono::Utc;
pub use registry::{ConnectionRegistry, LiveHandleId};
use serde::Serialize;
use serde_json::Value;

use crate::db_types::Notification;

/// A frame pushed to a live client. Serialized as-is onto the transport.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub event: String,
    pub payload: Value,
}

impl PushMessage {
    pub fn new<S: Into<String>>(event: S, payload: Value) -> Self {
        Self { event: event.into(), payload }
    }

    /// The real-time twin of a persisted notification. Carries the same content the client would
    /// see on its next poll.
    pub fn from_notification(notification: &Notification) -> Self {
        Self::new(
            "notification",
            serde_json::json!({
                "id": notification.id,
                "title": notification.title,
                "message": notification.message,
                "category": notification.category,
                "timestamp": Utc::now().to_rfc3339(),
            }),
        )
    }
}
