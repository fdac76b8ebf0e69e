use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use strum_macros::Display;

use crate::engine::{Consumer, Device, Producer, RecvTransport, SendTransport};
use crate::media::{MediaStream, MediaTrack, ParticipantSession};
use crate::shared::{ProducerId, SessionId};

/// Lifecycle of a room controller
///
/// `Disconnected -> Connecting -> Handshaking -> Active`, with `Closed`
/// reachable from any state and terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Handshaking,
    Active,
    Closed,
}

/// Local capture source, used when reporting acquisition failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum MediaSource {
    Microphone,
    Screen,
}

/// One entry of the chat log
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    /// None for messages sent by this participant
    pub sender_id: Option<SessionId>,
    pub text: String,
    pub at: DateTime<Utc>,
}

impl ChatMessage {
    pub fn sent(text: impl Into<String>) -> Self {
        Self {
            sender_id: None,
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn received(sender_id: SessionId, text: impl Into<String>) -> Self {
        Self {
            sender_id: Some(sender_id),
            text: text.into(),
            at: Utc::now(),
        }
    }

    pub fn is_local(&self) -> bool {
        self.sender_id.is_none()
    }
}

/// A participant announced by the server, with its display name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterEntry {
    pub session_id: SessionId,
    pub name: String,
}

/// The remote stream currently shown as the screen share
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenShare {
    pub session_id: SessionId,
    pub stream: MediaStream,
}

/// A local capture and the producer publishing it
#[derive(Default)]
pub(crate) struct LocalMedia {
    pub producer: Option<Box<dyn Producer>>,
    pub stream: Option<MediaStream>,
}

impl LocalMedia {
    /// Closes the producer and stops every captured track
    pub fn release(&mut self) {
        if let Some(producer) = self.producer.take() {
            producer.close();
        }
        if let Some(stream) = self.stream.take() {
            stream.stop();
        }
    }

    pub fn first_audio_track(&self) -> Option<MediaTrack> {
        self.stream.as_ref()?.audio_tracks().next().cloned()
    }
}

/// Mutable controller state, guarded by one lock
#[derive(Default)]
pub(crate) struct RoomState {
    pub device: Option<Arc<dyn Device>>,
    pub send_transport: Option<Arc<dyn SendTransport>>,
    pub recv_transport: Option<Arc<dyn RecvTransport>>,

    pub participants: HashMap<SessionId, ParticipantSession>,
    /// Which track each remote producer delivered, independent of its session
    pub producer_tracks: HashMap<ProducerId, MediaTrack>,
    pub consumers: HashMap<ProducerId, Box<dyn Consumer>>,
    /// Always a key of `participants` when set
    pub active_screen_share: Option<SessionId>,

    pub microphone: LocalMedia,
    pub screen: LocalMedia,
    pub mic_on: bool,

    pub messages: Vec<ChatMessage>,
    pub roster: Vec<RosterEntry>,
}

impl RoomState {
    /// Display name last announced for a session
    pub fn display_name(&self, session_id: &SessionId) -> Option<String> {
        self.roster
            .iter()
            .find(|entry| &entry.session_id == session_id)
            .map(|entry| entry.name.clone())
    }
}
