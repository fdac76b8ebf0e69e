use serde::{Deserialize, Serialize};

use super::errors::ProtocolError;
use super::payloads::{DtlsParameters, RtpCapabilities, RtpParameters, TransportOptions};
use crate::media::MediaKind;
use crate::shared::{ConsumerId, ProducerId, RoomId, SessionId};

/// How an inbound message is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageClass {
    /// The server's `Init`, which starts the handshake
    Handshake,
    /// Replies an outbound request is waiting on inline. Dispatched as soon
    /// as they arrive, never queued.
    Acknowledgement,
    /// Everything else. Processed in arrival order, only after the handshake.
    SessionEvent,
}

/// Messages sent by the rooms service
///
/// Wire format is a flat JSON object with a `type` discriminant and
/// camelCase fields, e.g. `{"type":"ProducerAdded","sessionId":"s1","producerId":"p1"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Transport options and router capabilities needed to start the handshake
    #[serde(rename_all = "camelCase")]
    Init {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        room_id: Option<RoomId>,
        consumer_transport_options: TransportOptions,
        producer_transport_options: TransportOptions,
        router_rtp_capabilities: RtpCapabilities,
    },
    ConnectedProducerTransport,
    Produced {
        id: ProducerId,
    },
    ConnectedConsumerTransport,
    /// Consumer created server-side; the client resumes it once receiving
    #[serde(rename_all = "camelCase")]
    Consumed {
        id: ConsumerId,
        producer_id: ProducerId,
        session_id: SessionId,
        kind: MediaKind,
        rtp_parameters: RtpParameters,
    },
    /// A participant is present in the room
    #[serde(rename_all = "camelCase")]
    NewComer {
        session_id: SessionId,
        name: String,
        just_joined: bool,
    },
    /// Chat text from another participant
    #[serde(rename_all = "camelCase")]
    Text {
        sender_id: SessionId,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    ProducerAdded {
        session_id: SessionId,
        producer_id: ProducerId,
    },
    #[serde(rename_all = "camelCase")]
    ProducerRemoved {
        session_id: SessionId,
        producer_id: ProducerId,
    },
    Error {
        error: String,
    },
}

/// Every `type` the server is known to send
pub const SERVER_MESSAGE_TYPES: &[&str] = &[
    "Init",
    "ConnectedProducerTransport",
    "Produced",
    "ConnectedConsumerTransport",
    "Consumed",
    "NewComer",
    "Text",
    "ProducerAdded",
    "ProducerRemoved",
    "Error",
];

impl ServerMessage {
    /// Decodes one text frame, checking the discriminant before the fields so
    /// unknown kinds and malformed known kinds are reported separately
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        let value: serde_json::Value =
            serde_json::from_str(frame).map_err(ProtocolError::InvalidJson)?;

        let kind = value
            .get("type")
            .and_then(|kind| kind.as_str())
            .ok_or(ProtocolError::MissingType)?
            .to_string();

        if !SERVER_MESSAGE_TYPES.contains(&kind.as_str()) {
            return Err(ProtocolError::UnknownType(kind));
        }

        serde_json::from_value(value).map_err(|source| ProtocolError::Malformed { kind, source })
    }

    /// The wire discriminant, also used as the event name when dispatched
    pub fn kind(&self) -> &'static str {
        match self {
            ServerMessage::Init { .. } => "Init",
            ServerMessage::ConnectedProducerTransport => "ConnectedProducerTransport",
            ServerMessage::Produced { .. } => "Produced",
            ServerMessage::ConnectedConsumerTransport => "ConnectedConsumerTransport",
            ServerMessage::Consumed { .. } => "Consumed",
            ServerMessage::NewComer { .. } => "NewComer",
            ServerMessage::Text { .. } => "Text",
            ServerMessage::ProducerAdded { .. } => "ProducerAdded",
            ServerMessage::ProducerRemoved { .. } => "ProducerRemoved",
            ServerMessage::Error { .. } => "Error",
        }
    }

    pub fn class(&self) -> MessageClass {
        match self {
            ServerMessage::Init { .. } => MessageClass::Handshake,
            ServerMessage::ConnectedProducerTransport
            | ServerMessage::ConnectedConsumerTransport
            | ServerMessage::Produced { .. }
            | ServerMessage::Text { .. } => MessageClass::Acknowledgement,
            _ => MessageClass::SessionEvent,
        }
    }

    /// Encodes to a text frame. Used by servers and test doubles.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|source| ProtocolError::Encode {
            kind: self.kind(),
            source,
        })
    }
}

/// Messages sent to the rooms service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Client capabilities, sent once the device has loaded the router's
    #[serde(rename_all = "camelCase")]
    Init { rtp_capabilities: RtpCapabilities },
    #[serde(rename_all = "camelCase")]
    ConnectProducerTransport { dtls_parameters: DtlsParameters },
    #[serde(rename_all = "camelCase")]
    Produce {
        kind: MediaKind,
        rtp_parameters: RtpParameters,
    },
    #[serde(rename_all = "camelCase")]
    ConnectConsumerTransport { dtls_parameters: DtlsParameters },
    #[serde(rename_all = "camelCase")]
    Consume {
        producer_id: ProducerId,
        session_id: SessionId,
    },
    ConsumerResume {
        id: ConsumerId,
    },
    RemoveProducer {
        id: ProducerId,
    },
    Text {
        text: String,
    },
}

impl ClientMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::Init { .. } => "Init",
            ClientMessage::ConnectProducerTransport { .. } => "ConnectProducerTransport",
            ClientMessage::Produce { .. } => "Produce",
            ClientMessage::ConnectConsumerTransport { .. } => "ConnectConsumerTransport",
            ClientMessage::Consume { .. } => "Consume",
            ClientMessage::ConsumerResume { .. } => "ConsumerResume",
            ClientMessage::RemoveProducer { .. } => "RemoveProducer",
            ClientMessage::Text { .. } => "Text",
        }
    }

    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|source| ProtocolError::Encode {
            kind: self.kind(),
            source,
        })
    }

    /// Decodes a frame sent by a client. Used by servers and test doubles.
    pub fn decode(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(|source| ProtocolError::Malformed {
            kind: "client".to_string(),
            source,
        })
    }
}
