use thiserror::Error;

/// Errors decoding or encoding signaling envelopes
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Message is not valid JSON: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("Message has no string \"type\" discriminant")]
    MissingType,

    #[error("Unknown message type: {0}")]
    UnknownType(String),

    #[error("Malformed {kind} message: {source}")]
    Malformed {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {kind} message: {source}")]
    Encode {
        kind: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
