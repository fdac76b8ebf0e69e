// Client-side controller for a multi-party media room
// This file exposes the public API for embedding applications and integration tests

pub mod engine;
pub mod event;
pub mod media;
pub mod protocol;
pub mod room;
pub mod shared;
pub mod signaling;

// Re-export commonly used types for easier access in tests
pub use event::{names, EventBus, ListenerId, RoomEvent};
pub use media::{MediaKind, MediaStream, MediaTrack, ParticipantSession};
pub use protocol::{ClientMessage, ServerMessage};
pub use room::{ChatMessage, ConnectionState, Room, RoomServices};
pub use shared::{
    init_tracing, ConsumerId, ProducerId, RoomConfig, RoomError, RoomId, SessionId,
};
pub use signaling::{SignalingChannel, SignalingConnector, WebSocketConnector};
