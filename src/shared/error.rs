use thiserror::Error;

use crate::engine::EngineError;
use crate::protocol::ProtocolError;
use crate::room::ConnectionState;
use crate::signaling::ChannelError;

/// Errors surfaced by the room controller
#[derive(Error, Debug)]
pub enum RoomError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Signaling channel error: {0}")]
    Channel(#[from] ChannelError),

    #[error("Media engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Media acquisition failed: {0}")]
    Acquisition(String),

    #[error("Timed out waiting for {0}")]
    AcknowledgementTimeout(&'static str),

    #[error("Invalid rooms endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Signaling channel closed")]
    ChannelClosed,

    #[error("Room was disconnected")]
    Disconnected,

    #[error("Operation not valid while {0}")]
    InvalidState(ConnectionState),
}

impl RoomError {
    /// Whether the session is still usable after this error
    ///
    /// Acquisition failures only abort the operation that hit them; every
    /// other failure leaves the room needing a fresh `connect`.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RoomError::Acquisition(_))
    }
}
