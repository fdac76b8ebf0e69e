use async_trait::async_trait;

use super::errors::EngineError;
use crate::media::{MediaKind, MediaTrack};
use crate::protocol::{DtlsParameters, RtpParameters};
use crate::shared::{ConsumerId, ProducerId};

/// Signaling the engine needs while it sets up a transport
///
/// Implemented by the room controller: each call sends a request over the
/// signaling channel and resolves when the matching acknowledgement arrives.
#[async_trait]
pub trait TransportSignaler: Send + Sync {
    /// Sends local DTLS parameters and waits for the server to connect the transport
    async fn connect(&self, dtls_parameters: DtlsParameters) -> Result<(), EngineError>;

    /// Asks the server to accept a new producer, returning its assigned id
    async fn produce(
        &self,
        kind: MediaKind,
        rtp_parameters: RtpParameters,
    ) -> Result<ProducerId, EngineError>;
}

/// Options for publishing one track
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProduceOptions {
    /// Codec to force, taken from the device's capabilities
    pub codec: Option<serde_json::Value>,
    /// Disable the local track while the producer is paused
    pub disable_track_on_pause: bool,
}

/// Parameters from the server's `Consumed` message
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumeParams {
    pub id: ConsumerId,
    pub producer_id: ProducerId,
    pub kind: MediaKind,
    pub rtp_parameters: RtpParameters,
}

#[async_trait]
pub trait SendTransport: Send + Sync {
    /// Publishes a local track
    async fn produce(
        &self,
        track: MediaTrack,
        options: ProduceOptions,
    ) -> Result<Box<dyn Producer>, EngineError>;

    fn close(&self);
}

#[async_trait]
pub trait RecvTransport: Send + Sync {
    /// Starts receiving a remote producer
    async fn consume(&self, params: ConsumeParams) -> Result<Box<dyn Consumer>, EngineError>;

    fn close(&self);
}

/// A locally published track
pub trait Producer: Send + Sync {
    fn id(&self) -> &ProducerId;
    fn kind(&self) -> MediaKind;
    fn close(&self);
}

/// A locally received remote track
pub trait Consumer: Send + Sync {
    fn id(&self) -> &ConsumerId;
    fn producer_id(&self) -> &ProducerId;
    fn track(&self) -> MediaTrack;
    fn close(&self);
}
