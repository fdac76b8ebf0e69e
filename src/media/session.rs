use super::track::{MediaStream, MediaTrack};
use crate::shared::SessionId;

/// The tracks received from one remote participant
///
/// Holds no lifecycle logic of its own: the room controller creates it when
/// the first track for a session arrives and drops it when the last one goes.
#[derive(Debug, Clone)]
pub struct ParticipantSession {
    id: SessionId,
    stream: MediaStream,
}

impl ParticipantSession {
    pub fn new(id: SessionId) -> Self {
        Self {
            id,
            stream: MediaStream::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// All of the participant's tracks, aggregated into one playable stream
    pub fn media_stream(&self) -> &MediaStream {
        &self.stream
    }

    /// Adds a track. No-op if it is already present.
    pub fn add_track(&mut self, track: MediaTrack) -> bool {
        self.stream.add_track(track)
    }

    /// Removes a track. No-op if it is absent.
    pub fn remove_track(&mut self, track: &MediaTrack) -> bool {
        self.stream.remove_track(track)
    }

    pub fn has_track(&self, track: &MediaTrack) -> bool {
        self.stream.contains(track)
    }

    pub fn has_tracks(&self) -> bool {
        self.stream.has_tracks()
    }
}
