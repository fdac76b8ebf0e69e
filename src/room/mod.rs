// Room controller
//
// One `Room` per joined room: it owns the signaling connection, drives the
// media engine through the handshake and keeps the participant sessions
// the UI renders from.

// Public API - what other modules can use
pub use controller::{Room, RoomServices};
pub use queue::{QueueWorker, TaskQueue};
pub use state::{ChatMessage, ConnectionState, MediaSource, RosterEntry, ScreenShare};

// Internal modules
mod controller;
mod handshake;
mod local_media;
mod playback;
mod queue;
mod router;
mod signaler;
mod state;
mod tracks;
