use serde_json::json;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use huddle::{
    names,
    protocol::{RtpCapabilities, TransportOptions},
    Room, RoomConfig, RoomEvent, RoomId, RoomServices, ServerMessage,
};

use super::mocks::{
    CallLog, FakeEngine, FakeMediaDevices, MockConnector, MockServer, RecordingAudioOutput,
};

// ============================================================================
// Test Setup Infrastructure
// ============================================================================

const ALL_EVENTS: &[&str] = &[
    names::STATE_CHANGED,
    names::SCREEN_SHARE_STARTED,
    names::SCREEN_SHARE_CLOSED,
    names::SESSION_CLOSED,
    names::NEWCOMER,
    names::MESSAGE,
    names::MICROPHONE_TOGGLED,
    names::SCREEN_SHARING_CHANGED,
    names::ACQUISITION_FAILED,
    names::SERVER_ERROR,
];

pub struct TestSetup {
    pub room: Arc<Room>,
    pub server: Arc<MockServer>,
    pub connector: Arc<MockConnector>,
    pub engine_log: CallLog,
    pub engine: Arc<FakeEngine>,
    pub devices: Arc<FakeMediaDevices>,
    pub output: Arc<RecordingAudioOutput>,
    pub events: Arc<Mutex<Vec<RoomEvent>>>,
}

pub struct TestSetupBuilder {
    room_id: String,
    participant_name: Option<String>,
    auto_ack: bool,
    refuse_connection: bool,
    fail_microphone: bool,
    ack_timeout: Duration,
}

impl TestSetupBuilder {
    pub fn new() -> Self {
        Self {
            room_id: "room-123".to_string(),
            participant_name: Some("alice".to_string()),
            auto_ack: true,
            refuse_connection: false,
            fail_microphone: false,
            ack_timeout: Duration::from_secs(2),
        }
    }

    pub fn without_acknowledgements(mut self) -> Self {
        self.auto_ack = false;
        self
    }

    pub fn refusing_connections(mut self) -> Self {
        self.refuse_connection = true;
        self
    }

    pub fn with_failing_microphone(mut self) -> Self {
        self.fail_microphone = true;
        self
    }

    pub fn with_ack_timeout(mut self, timeout: Duration) -> Self {
        self.ack_timeout = timeout;
        self
    }

    pub fn build(self) -> TestSetup {
        let server = MockServer::new(self.auto_ack);
        let connector = Arc::new(MockConnector::new(
            Arc::clone(&server),
            self.refuse_connection,
        ));
        let engine_log = CallLog::default();
        let engine = Arc::new(FakeEngine::new(engine_log.clone()));
        let devices = Arc::new(FakeMediaDevices::default());
        devices
            .fail_microphone
            .store(self.fail_microphone, Ordering::SeqCst);
        let output = Arc::new(RecordingAudioOutput::default());

        let mut config = RoomConfig::default().with_ack_timeout(self.ack_timeout);
        if let Some(name) = self.participant_name {
            config = config.with_participant_name(name);
        }

        let room = Arc::new(Room::new(
            RoomId::from(self.room_id.as_str()),
            config,
            RoomServices::new(
                engine.clone(),
                devices.clone(),
                output.clone(),
                connector.clone(),
            ),
        ));

        let events = Arc::new(Mutex::new(Vec::new()));
        for name in ALL_EVENTS {
            let sink = Arc::clone(&events);
            room.on(name, move |event: &RoomEvent| {
                sink.lock().unwrap().push(event.clone())
            });
        }

        TestSetup {
            room,
            server,
            connector,
            engine_log,
            engine,
            devices,
            output,
            events,
        }
    }

    /// Builds and completes the handshake
    pub async fn connected(self) -> TestSetup {
        let setup = self.build();
        setup.server.push(init_message());
        setup
            .room
            .connect()
            .await
            .expect("handshake should complete");
        setup
    }
}

pub fn init_message() -> ServerMessage {
    ServerMessage::Init {
        room_id: Some(RoomId::from("room-123")),
        consumer_transport_options: TransportOptions(json!({ "id": "recv-transport" })),
        producer_transport_options: TransportOptions(json!({ "id": "send-transport" })),
        router_rtp_capabilities: RtpCapabilities(json!({
            "codecs": [
                { "kind": "audio", "mimeType": "audio/opus", "clockRate": 48000, "channels": 2 },
                { "kind": "video", "mimeType": "video/VP8", "clockRate": 90000 }
            ]
        })),
    }
}
