//! Core broker state: topics, subscribers, messages, the shutdown machine.
//!
//! Everything here is transport-agnostic — no WebSocket, no HTTP. The
//! `session` module adapts this to the wire protocol.

pub mod error;
pub mod manager;
pub mod message;
pub mod subscriber;
pub mod topic;

pub use error::BrokerError;
pub use manager::{HealthSnapshot, ManagerConfig, TopicManager, TopicSummary};
pub use message::Message;
pub use subscriber::{EnqueueOutcome, SessionEvent, Subscriber};
pub use topic::{Topic, TopicStats};
