//! Wire protocol: JSON lines over a WebSocket text frame.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error codes carried in `error` frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    BadRequest,
    TopicNotFound,
    SlowConsumer,
    ServiceUnavailable,
    Internal,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundFrame {
    Ping {
        request_id: String,
    },
    Subscribe {
        topic: String,
        client_id: String,
        #[serde(default)]
        last_n: Option<i64>,
        request_id: String,
    },
    Unsubscribe {
        topic: String,
        client_id: String,
        request_id: String,
    },
    Publish {
        topic: String,
        message: InboundMessage,
        request_id: String,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub id: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireMessage {
    pub id: String,
    pub payload: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct WireError {
    pub code: ErrorCode,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundFrame {
    Ack {
        request_id: String,
        topic: String,
        status: &'static str,
        ts: DateTime<Utc>,
    },
    Event {
        topic: String,
        message: WireMessage,
        ts: DateTime<Utc>,
    },
    Error {
        request_id: Option<String>,
        error: WireError,
        ts: DateTime<Utc>,
    },
    Pong {
        request_id: String,
        ts: DateTime<Utc>,
    },
    Info {
        msg: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        topic: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        request_id: Option<String>,
        ts: DateTime<Utc>,
    },
}

impl OutboundFrame {
    pub fn ack(request_id: impl Into<String>, topic: impl Into<String>) -> Self {
        OutboundFrame::Ack {
            request_id: request_id.into(),
            topic: topic.into(),
            status: "ok",
            ts: Utc::now(),
        }
    }

    pub fn pong(request_id: impl Into<String>) -> Self {
        OutboundFrame::Pong {
            request_id: request_id.into(),
            ts: Utc::now(),
        }
    }

    pub fn error(request_id: Option<String>, code: ErrorCode, message: impl Into<String>) -> Self {
        OutboundFrame::Error {
            request_id,
            error: WireError {
                code,
                message: message.into(),
            },
            ts: Utc::now(),
        }
    }

    pub fn info(msg: impl Into<String>, topic: Option<String>, request_id: Option<String>) -> Self {
        OutboundFrame::Info {
            msg: msg.into(),
            topic,
            request_id,
            ts: Utc::now(),
        }
    }

    pub fn to_text(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"type":"error","request_id":null,"error":{"code":"INTERNAL","message":"encode failure"}}"#
                .to_string()
        })
    }
}
