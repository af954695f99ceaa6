//! Error types for the stranger signaling server

use strangers_protocol::ProtocolError;
use thiserror::Error;

/// Errors that can occur while routing events between participants
#[derive(Error, Debug)]
pub enum SignalingError {
    /// The addressed participant is not connected
    #[error("Unknown peer")]
    UnknownPeer,

    /// Request body exceeded the configured maximum
    #[error("Payload of {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: usize, limit: usize },

    /// JSON encoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors from decoding client requests at the transport
#[derive(Error, Debug)]
pub enum ClientRequestError {
    /// The `X-Peer-Id` header is absent or not a peer id
    #[error("Missing or invalid X-Peer-Id header")]
    MissingPeerId,

    /// The body could not be read
    #[error("Failed to read body: {0}")]
    Body(String),

    /// The body grew past the configured maximum while being read
    #[error("Body exceeds the {limit} byte limit ({received} bytes received)")]
    PayloadTooLarge { received: usize, limit: usize },

    /// The body is not a known request
    #[error("Invalid request: {0}")]
    Protocol(#[from] ProtocolError),
}

/// Errors from loading [`crate::ServerConfig`]
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An environment variable holds a value that cannot be used
    #[error("Invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
