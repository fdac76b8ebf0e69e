use async_trait::async_trait;
use std::sync::{Arc, Weak};
use strum_macros::Display;
use tracing::debug;

use super::controller::RoomInner;
use crate::engine::{EngineError, TransportSignaler};
use crate::media::MediaKind;
use crate::protocol::{ClientMessage, DtlsParameters, RtpParameters, ServerMessage};
use crate::shared::{ProducerId, RoomError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub(crate) enum TransportDirection {
    Send,
    Recv,
}

/// Bridges engine transport callbacks onto acknowledged signaling requests
///
/// Holds the room weakly: transports are owned by the room state.
pub(crate) struct RoomSignaler {
    room: Weak<RoomInner>,
    direction: TransportDirection,
}

impl RoomSignaler {
    pub fn new(room: &Arc<RoomInner>, direction: TransportDirection) -> Arc<Self> {
        Arc::new(Self {
            room: Arc::downgrade(room),
            direction,
        })
    }

    fn room(&self) -> Result<Arc<RoomInner>, EngineError> {
        self.room
            .upgrade()
            .ok_or_else(|| EngineError::Signaling(RoomError::Disconnected.to_string()))
    }
}

fn signaling_error(error: RoomError) -> EngineError {
    EngineError::Signaling(error.to_string())
}

#[async_trait]
impl TransportSignaler for RoomSignaler {
    async fn connect(&self, dtls_parameters: DtlsParameters) -> Result<(), EngineError> {
        let room = self.room()?;
        debug!(room_id = %room.id, direction = %self.direction, "Connecting transport");

        let (request, ack) = match self.direction {
            TransportDirection::Send => (
                ClientMessage::ConnectProducerTransport { dtls_parameters },
                "ConnectedProducerTransport",
            ),
            TransportDirection::Recv => (
                ClientMessage::ConnectConsumerTransport { dtls_parameters },
                "ConnectedConsumerTransport",
            ),
        };

        room.request(request, ack).await.map_err(signaling_error)?;
        Ok(())
    }

    async fn produce(
        &self,
        kind: MediaKind,
        rtp_parameters: RtpParameters,
    ) -> Result<ProducerId, EngineError> {
        if self.direction == TransportDirection::Recv {
            return Err(EngineError::Signaling(
                "receive transport cannot produce".to_string(),
            ));
        }

        let room = self.room()?;
        let reply = room
            .request(ClientMessage::Produce { kind, rtp_parameters }, "Produced")
            .await
            .map_err(signaling_error)?;

        match reply {
            ServerMessage::Produced { id } => {
                debug!(room_id = %room.id, producer_id = %id, kind = %kind, "Producer acknowledged");
                Ok(id)
            }
            other => Err(EngineError::Signaling(format!(
                "expected Produced, got {}",
                other.kind()
            ))),
        }
    }
}
