use thiserror::Error;

/// Errors produced while decoding protocol values
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Malformed JSON or an unknown event tag
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A peer id that is not a UUID
    #[error("invalid peer id: {0}")]
    InvalidPeerId(#[from] uuid::Error),
}
