//! Immutable message value.

use chrono::{DateTime, Utc};
use serde_json::Value;
use uuid::Uuid;

/// An immutable published message.
///
/// Created at publish time and shared (via `Arc`) between a topic's history
/// ring and every subscriber queue that was live for the publish — no
/// payload cloning on fan-out.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Uuid,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Construct a message with a server-assigned timestamp.
    ///
    /// `payload` must already have been validated as a JSON object by the
    /// caller (the session adapter validates on ingress; `Topic::publish`
    /// does not re-inspect it).
    pub fn new(id: Uuid, payload: Value) -> Self {
        Self {
            id,
            payload,
            timestamp: Utc::now(),
        }
    }
}
