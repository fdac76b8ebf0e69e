// Media tracks, streams and per-participant track aggregates

// Public API - what other modules can use
pub use session::ParticipantSession;
pub use track::{MediaKind, MediaStream, MediaTrack};

// Internal modules
mod session;
mod track;
