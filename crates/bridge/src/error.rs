//! Bridge error types.

use std::time::Duration;

use protocol::JsonRpcError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("timeout waiting for response to {method} after {after:?}")]
    Timeout { method: String, after: Duration },

    #[error("host error: {0}")]
    Host(#[from] JsonRpcError),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("failed to serialize message: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("bridge was reset before a response arrived")]
    Reset,
}

pub type Result<T> = std::result::Result<T, Error>;
