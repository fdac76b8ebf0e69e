use crate::room::{ChatMessage, ConnectionState, MediaSource};
use crate::shared::SessionId;

/// Event names the room controller emits for the UI layer
pub mod names {
    pub const STATE_CHANGED: &str = "stateChanged";
    pub const SCREEN_SHARE_STARTED: &str = "screenShareStarted";
    pub const SCREEN_SHARE_CLOSED: &str = "screenShareClosed";
    pub const SESSION_CLOSED: &str = "sessionClosed";
    pub const NEWCOMER: &str = "newcomer";
    pub const MESSAGE: &str = "message";
    pub const MICROPHONE_TOGGLED: &str = "microphoneToggled";
    pub const SCREEN_SHARING_CHANGED: &str = "screenSharingChanged";
    pub const ACQUISITION_FAILED: &str = "acquisitionFailed";
    pub const SERVER_ERROR: &str = "serverError";
}

/// Things that happened in a room, published to the UI layer
///
/// Events are facts: they are emitted after the controller state they
/// describe has already been updated.
#[derive(Debug, Clone, PartialEq)]
pub enum RoomEvent {
    /// The controller moved to a new connection state
    StateChanged { state: ConnectionState },

    /// A remote video track became the active screen share
    ScreenShareStarted { session_id: SessionId },

    /// The active remote screen share went away
    ScreenShareClosed { session_id: SessionId },

    /// A participant's last track was removed and the session dropped.
    /// `name` is the last display name announced for it, if any.
    SessionClosed {
        session_id: SessionId,
        name: Option<String>,
    },

    /// The server announced a participant
    Newcomer {
        session_id: SessionId,
        name: String,
        just_joined: bool,
    },

    /// A chat message was appended to the log (local or remote)
    Message { message: ChatMessage },

    /// The local microphone track was enabled or muted
    MicrophoneToggled { on: bool },

    /// Local screen sharing started or stopped
    ScreenSharingChanged { on: bool },

    /// Capturing local media failed; shown to the user as a notification
    AcquisitionFailed { source: MediaSource, reason: String },

    /// The rooms service reported an error
    ServerError { error: String },
}

impl RoomEvent {
    /// Name this event is emitted under
    pub fn event_name(&self) -> &'static str {
        match self {
            RoomEvent::StateChanged { .. } => names::STATE_CHANGED,
            RoomEvent::ScreenShareStarted { .. } => names::SCREEN_SHARE_STARTED,
            RoomEvent::ScreenShareClosed { .. } => names::SCREEN_SHARE_CLOSED,
            RoomEvent::SessionClosed { .. } => names::SESSION_CLOSED,
            RoomEvent::Newcomer { .. } => names::NEWCOMER,
            RoomEvent::Message { .. } => names::MESSAGE,
            RoomEvent::MicrophoneToggled { .. } => names::MICROPHONE_TOGGLED,
            RoomEvent::ScreenSharingChanged { .. } => names::SCREEN_SHARING_CHANGED,
            RoomEvent::AcquisitionFailed { .. } => names::ACQUISITION_FAILED,
            RoomEvent::ServerError { .. } => names::SERVER_ERROR,
        }
    }
}
