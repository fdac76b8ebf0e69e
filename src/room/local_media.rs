use std::sync::Arc;
use tracing::{debug, info, warn};

use super::controller::RoomInner;
use super::state::{ChatMessage, ConnectionState, MediaSource};
use crate::engine::{EngineError, ProduceOptions};
use crate::event::RoomEvent;
use crate::protocol::ClientMessage;
use crate::shared::RoomError;

impl RoomInner {
    pub(crate) async fn toggle_microphone(&self) -> Option<bool> {
        let on = {
            let mut state = self.state.write().await;
            let track = state.microphone.first_audio_track()?;
            let on = !track.is_enabled();
            track.set_enabled(on);
            state.mic_on = on;
            on
        };

        debug!(room_id = %self.id, on, "Microphone toggled");
        self.emit(RoomEvent::MicrophoneToggled { on });
        Some(on)
    }

    pub(crate) async fn share_screen(self: &Arc<Self>) -> Result<(), RoomError> {
        let _guard = self.screen_lock.lock().await;

        let state = self.connection_state();
        if state != ConnectionState::Active {
            return Err(RoomError::InvalidState(state));
        }

        let (transport, device) = {
            let state = self.state.read().await;
            (state.send_transport.clone(), state.device.clone())
        };
        let (Some(transport), Some(device)) = (transport, device) else {
            return Err(RoomError::InvalidState(self.connection_state()));
        };

        // The old producer is withdrawn before the new one is requested
        self.release_screen().await;

        let stream = match self.services.devices.display().await {
            Ok(stream) => stream,
            Err(e) => {
                self.notify_acquisition_failure(MediaSource::Screen, &e);
                return Err(RoomError::Acquisition(e.to_string()));
            }
        };

        let Some(track) = stream.video_tracks().next().cloned() else {
            stream.stop();
            let error = EngineError::Capture("no video track in display capture".to_string());
            self.notify_acquisition_failure(MediaSource::Screen, &error);
            return Err(RoomError::Acquisition(error.to_string()));
        };

        let codec = self.config.screen_codec.as_deref().and_then(|mime| {
            let codec = device
                .rtp_capabilities()
                .and_then(|capabilities| capabilities.find_codec(mime));
            if codec.is_none() {
                warn!(room_id = %self.id, codec = mime, "Preferred screen codec unavailable");
            }
            codec
        });

        let options = ProduceOptions {
            codec,
            disable_track_on_pause: true,
        };
        let producer = match transport.produce(track, options).await {
            Ok(producer) => producer,
            Err(e) => {
                stream.stop();
                return Err(e.into());
            }
        };

        {
            let mut state = self.state.write().await;
            if self.is_closed() {
                drop(state);
                producer.close();
                stream.stop();
                return Err(RoomError::Disconnected);
            }
            info!(room_id = %self.id, producer_id = %producer.id(), "Screen sharing started");
            state.screen.producer = Some(producer);
            state.screen.stream = Some(stream);
        }

        self.emit(RoomEvent::ScreenSharingChanged { on: true });
        Ok(())
    }

    pub(crate) async fn stop_screen_sharing(&self) -> Result<(), RoomError> {
        let _guard = self.screen_lock.lock().await;
        self.release_screen().await;
        Ok(())
    }

    /// Withdraws the local screen producer. Callers hold `screen_lock`.
    async fn release_screen(&self) {
        let (producer, stream) = {
            let mut state = self.state.write().await;
            (state.screen.producer.take(), state.screen.stream.take())
        };

        if let Some(stream) = &stream {
            stream.stop();
        }
        let Some(producer) = producer else {
            return;
        };

        if let Err(e) = self.send(ClientMessage::RemoveProducer {
            id: producer.id().clone(),
        }) {
            warn!(room_id = %self.id, error = %e, "Could not announce producer removal");
        }
        producer.close();

        info!(room_id = %self.id, producer_id = %producer.id(), "Screen sharing stopped");
        self.emit(RoomEvent::ScreenSharingChanged { on: false });
    }

    pub(crate) async fn send_text(&self, text: String) -> Result<(), RoomError> {
        self.send(ClientMessage::Text { text: text.clone() })?;
        self.record_message(ChatMessage::sent(text)).await;
        Ok(())
    }
}
