use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::engine::AudioOutput;
use crate::media::MediaTrack;
use crate::shared::{sync::lock, ProducerId};

/// The controller's single audio mixing graph
///
/// Every remote audio track is routed into the same output. Created with
/// the controller and closed by `disconnect`.
pub(crate) struct PlaybackGraph {
    output: Arc<dyn AudioOutput>,
    routed: Mutex<HashMap<ProducerId, MediaTrack>>,
    closed: AtomicBool,
}

impl PlaybackGraph {
    pub fn new(output: Arc<dyn AudioOutput>) -> Self {
        Self {
            output,
            routed: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        }
    }

    pub fn route(&self, producer_id: &ProducerId, track: &MediaTrack) {
        if self.closed.load(Ordering::SeqCst) {
            debug!(producer_id = %producer_id, "Playback graph closed, not routing audio");
            return;
        }

        let mut routed = lock(&self.routed);
        if routed.contains_key(producer_id) {
            return;
        }
        self.output.connect(track);
        routed.insert(producer_id.clone(), track.clone());
    }

    pub fn unroute(&self, producer_id: &ProducerId) {
        if let Some(track) = lock(&self.routed).remove(producer_id) {
            self.output.disconnect(&track);
        }
    }

    pub fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }

        let routed: Vec<MediaTrack> = lock(&self.routed).drain().map(|(_, track)| track).collect();
        for track in &routed {
            self.output.disconnect(track);
        }
        self.output.close();
        debug!(disconnected = routed.len(), "Playback graph closed");
    }

    pub fn routed_count(&self) -> usize {
        lock(&self.routed).len()
    }
}
