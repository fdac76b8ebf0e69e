use async_trait::async_trait;

use super::errors::EngineError;
use crate::media::{MediaStream, MediaTrack};

/// Local capture devices
#[async_trait]
pub trait MediaDevices: Send + Sync {
    /// Captures the default microphone
    async fn microphone(&self) -> Result<MediaStream, EngineError>;

    /// Asks the user for a display surface to capture
    async fn display(&self) -> Result<MediaStream, EngineError>;
}

/// Default audio output that remote audio is mixed into
pub trait AudioOutput: Send + Sync {
    fn connect(&self, track: &MediaTrack);
    fn disconnect(&self, track: &MediaTrack);
    /// Releases the output. No further calls follow.
    fn close(&self);
}
