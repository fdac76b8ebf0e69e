use std::sync::Arc;
use tracing::{debug, info, instrument};

use super::controller::RoomInner;
use super::signaler::{RoomSignaler, TransportDirection};
use super::state::MediaSource;
use crate::engine::{Device, EngineError, ProduceOptions, SendTransport};
use crate::event::RoomEvent;
use crate::protocol::{ClientMessage, RtpCapabilities, TransportOptions};
use crate::shared::RoomError;

/// What the server's `Init` hands the client
pub(crate) struct HandshakeParams {
    pub consumer_transport_options: TransportOptions,
    pub producer_transport_options: TransportOptions,
    pub router_rtp_capabilities: RtpCapabilities,
}

impl RoomInner {
    /// Load device, announce capabilities, set up the send side with the
    /// microphone, then the receive side. Strictly in this order.
    #[instrument(skip_all, fields(room_id = %self.id))]
    pub(crate) async fn run_handshake(
        self: &Arc<Self>,
        params: HandshakeParams,
    ) -> Result<(), RoomError> {
        let device = self
            .state
            .read()
            .await
            .device
            .clone()
            .ok_or(EngineError::NotLoaded)?;

        device.load(&params.router_rtp_capabilities).await?;
        debug!(room_id = %self.id, "Device loaded");

        let rtp_capabilities = device.rtp_capabilities().ok_or(EngineError::NotLoaded)?;
        self.send(ClientMessage::Init { rtp_capabilities })?;

        let send_transport = device.create_send_transport(
            &params.producer_transport_options,
            RoomSignaler::new(self, TransportDirection::Send),
        )?;
        {
            let mut state = self.state.write().await;
            if self.is_closed() {
                drop(state);
                send_transport.close();
                return Err(RoomError::Disconnected);
            }
            state.send_transport = Some(Arc::clone(&send_transport));
        }

        self.start_microphone(send_transport.as_ref()).await?;

        self.create_recv_transport(device.as_ref(), &params.consumer_transport_options)
            .await?;

        info!(room_id = %self.id, "Transports ready");
        Ok(())
    }

    /// A failed capture is reported and the handshake goes on without a
    /// microphone. Failing to publish a captured track ends it.
    async fn start_microphone(
        &self,
        transport: &dyn SendTransport,
    ) -> Result<(), RoomError> {
        let stream = match self.services.devices.microphone().await {
            Ok(stream) => stream,
            Err(e) => {
                self.notify_acquisition_failure(MediaSource::Microphone, &e);
                return Ok(());
            }
        };

        let Some(track) = stream.audio_tracks().next().cloned() else {
            stream.stop();
            self.notify_acquisition_failure(
                MediaSource::Microphone,
                &EngineError::Capture("no audio track in capture".to_string()),
            );
            return Ok(());
        };

        self.state.write().await.microphone.stream = Some(stream);

        let producer = transport.produce(track, ProduceOptions::default()).await?;

        {
            let mut state = self.state.write().await;
            if self.is_closed() {
                drop(state);
                producer.close();
                return Err(RoomError::Disconnected);
            }
            debug!(room_id = %self.id, producer_id = %producer.id(), "Microphone producing");
            state.microphone.producer = Some(producer);
            state.mic_on = true;
        }

        self.emit(RoomEvent::MicrophoneToggled { on: true });
        Ok(())
    }

    async fn create_recv_transport(
        self: &Arc<Self>,
        device: &dyn Device,
        options: &TransportOptions,
    ) -> Result<(), RoomError> {
        let transport =
            device.create_recv_transport(options, RoomSignaler::new(self, TransportDirection::Recv))?;

        let mut state = self.state.write().await;
        if self.is_closed() {
            drop(state);
            transport.close();
            return Err(RoomError::Disconnected);
        }
        state.recv_transport = Some(transport);
        Ok(())
    }
}
