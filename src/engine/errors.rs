use thiserror::Error;

/// Errors reported by the media engine and capture devices
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Device has not loaded router capabilities")]
    NotLoaded,

    #[error("Failed to load router capabilities: {0}")]
    Load(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Signaling for transport failed: {0}")]
    Signaling(String),

    #[error("Media capture failed: {0}")]
    Capture(String),
}
