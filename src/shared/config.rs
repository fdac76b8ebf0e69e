use std::time::Duration;
use url::Url;

use super::{error::RoomError, ids::RoomId};

const DEFAULT_ENDPOINT: &str = "ws://localhost:8080/ws";
const DEFAULT_SCREEN_CODEC: &str = "video/vp8";

/// Configuration for a room controller
///
/// Everything the controller needs from the surrounding application is
/// passed in here rather than read from ambient state.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Base websocket URL of the rooms service
    pub endpoint: String,
    /// Display name announced to the other participants
    pub participant_name: Option<String>,
    /// How long to wait for any synchronous acknowledgement
    pub ack_timeout: Duration,
    /// Preferred codec mime type for screen share producers
    pub screen_codec: Option<String>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            participant_name: None,
            ack_timeout: Duration::from_secs(10),
            screen_codec: Some(DEFAULT_SCREEN_CODEC.to_string()),
        }
    }
}

impl RoomConfig {
    /// Builds a config from `ROOMS_WS_ENDPOINT`, `ROOMS_PARTICIPANT_NAME` and
    /// `ROOMS_ACK_TIMEOUT_SECS`, falling back to defaults
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            endpoint: std::env::var("ROOMS_WS_ENDPOINT").unwrap_or(defaults.endpoint),
            participant_name: std::env::var("ROOMS_PARTICIPANT_NAME")
                .ok()
                .filter(|name| !name.trim().is_empty()),
            ack_timeout: std::env::var("ROOMS_ACK_TIMEOUT_SECS")
                .ok()
                .and_then(|secs| secs.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.ack_timeout),
            screen_codec: defaults.screen_codec,
        }
    }

    pub fn with_participant_name(mut self, name: impl Into<String>) -> Self {
        self.participant_name = Some(name.into());
        self
    }

    pub fn with_ack_timeout(mut self, ack_timeout: Duration) -> Self {
        self.ack_timeout = ack_timeout;
        self
    }

    /// Signaling URL for a room: `{endpoint}/{room_id}?name={participant_name}`
    pub fn room_url(&self, room_id: &RoomId) -> Result<Url, RoomError> {
        let mut url = Url::parse(&self.endpoint)
            .map_err(|e| RoomError::InvalidEndpoint(format!("{}: {}", self.endpoint, e)))?;

        url.path_segments_mut()
            .map_err(|_| RoomError::InvalidEndpoint(self.endpoint.clone()))?
            .pop_if_empty()
            .push(room_id.as_str());

        if let Some(name) = &self.participant_name {
            url.query_pairs_mut().append_pair("name", name);
        }

        Ok(url)
    }
}
