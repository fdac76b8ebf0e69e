use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use strum_macros::{AsRefStr, Display};
use uuid::Uuid;

/// Kind of media carried by a track
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Video,
}

struct TrackInner {
    id: String,
    kind: MediaKind,
    enabled: AtomicBool,
    stopped: AtomicBool,
}

/// Shared handle to one media track
///
/// Clones refer to the same underlying track: muting or stopping through any
/// clone is visible through all of them. Two handles are equal when they
/// share the track id.
#[derive(Clone)]
pub struct MediaTrack {
    inner: Arc<TrackInner>,
}

impl MediaTrack {
    pub fn new(id: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            inner: Arc::new(TrackInner {
                id: id.into(),
                kind,
                enabled: AtomicBool::new(true),
                stopped: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn kind(&self) -> MediaKind {
        self.inner.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.inner.enabled.load(Ordering::SeqCst)
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.inner.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Permanently ends the track (releases the capture device for local tracks)
    pub fn stop(&self) {
        self.inner.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.inner.stopped.load(Ordering::SeqCst)
    }
}

impl PartialEq for MediaTrack {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for MediaTrack {}

impl fmt::Debug for MediaTrack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MediaTrack")
            .field("id", &self.inner.id)
            .field("kind", &self.inner.kind)
            .field("enabled", &self.is_enabled())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// An ordered set of tracks played back together
#[derive(Debug, Clone, PartialEq)]
pub struct MediaStream {
    id: String,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            tracks: Vec::new(),
        }
    }

    pub fn with_tracks(tracks: impl IntoIterator<Item = MediaTrack>) -> Self {
        let mut stream = Self::new();
        for track in tracks {
            stream.add_track(track);
        }
        stream
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Adds a track; returns false if it was already present
    pub fn add_track(&mut self, track: MediaTrack) -> bool {
        if self.tracks.contains(&track) {
            return false;
        }
        self.tracks.push(track);
        true
    }

    /// Removes a track; returns false if it was not present
    pub fn remove_track(&mut self, track: &MediaTrack) -> bool {
        let before = self.tracks.len();
        self.tracks.retain(|existing| existing != track);
        self.tracks.len() != before
    }

    pub fn contains(&self, track: &MediaTrack) -> bool {
        self.tracks.contains(track)
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks_of(MediaKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks_of(MediaKind::Video)
    }

    pub fn has_tracks(&self) -> bool {
        !self.tracks.is_empty()
    }

    /// Stops every track in the stream
    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }

    fn tracks_of(&self, kind: MediaKind) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(move |track| track.kind() == kind)
    }
}

impl Default for MediaStream {
    fn default() -> Self {
        Self::new()
    }
}
