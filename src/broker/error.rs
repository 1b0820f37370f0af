//! Broker error types

use thiserror::Error;

/// Error type for broker operations
#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("client_id '{0}' already subscribed on this topic")]
    ClientIdTaken(String),

    #[error("server is shutting down")]
    ShuttingDown,

    #[error("invalid ring size: must be between 1 and {max}, got {got}")]
    InvalidRingSize { got: u64, max: u64 },
}
