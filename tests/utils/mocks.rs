use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use url::Url;

use huddle::{
    engine::{
        AudioOutput, ConsumeParams, Consumer, Device, EngineError, MediaDevices, MediaEngine,
        ProduceOptions, Producer, RecvTransport, SendTransport, TransportSignaler,
    },
    protocol::{DtlsParameters, RtpCapabilities, RtpParameters, TransportOptions},
    signaling::{ChannelError, SignalingChannel, SignalingConnector},
    ClientMessage, ConsumerId, MediaKind, MediaStream, MediaTrack, ProducerId, ServerMessage,
};

// ============================================================================
// Mock Signaling Server
// ============================================================================

/// Server side of an in-memory signaling channel
///
/// Frames pushed before the client connects are buffered and delivered in
/// order once it does.
pub struct MockServer {
    to_client: Mutex<Option<mpsc::UnboundedSender<String>>>,
    client_inbound: Mutex<Option<mpsc::UnboundedReceiver<String>>>,
    received: Mutex<Vec<ClientMessage>>,
    auto_ack: AtomicBool,
    produced: AtomicUsize,
    pub channel_closed: AtomicBool,
}

impl MockServer {
    pub fn new(auto_ack: bool) -> Arc<Self> {
        let (to_client, client_inbound) = mpsc::unbounded_channel();
        Arc::new(Self {
            to_client: Mutex::new(Some(to_client)),
            client_inbound: Mutex::new(Some(client_inbound)),
            received: Mutex::new(Vec::new()),
            auto_ack: AtomicBool::new(auto_ack),
            produced: AtomicUsize::new(0),
            channel_closed: AtomicBool::new(false),
        })
    }

    pub fn push(&self, message: ServerMessage) {
        self.push_raw(message.encode().unwrap());
    }

    pub fn push_raw(&self, frame: impl Into<String>) {
        if let Some(sender) = self.to_client.lock().unwrap().as_ref() {
            let _ = sender.send(frame.into());
        }
    }

    /// Ends the stream the client reads from, as a server-side close would
    pub fn hang_up(&self) {
        self.to_client.lock().unwrap().take();
    }

    pub fn received(&self) -> Vec<ClientMessage> {
        self.received.lock().unwrap().clone()
    }

    pub fn received_kinds(&self) -> Vec<&'static str> {
        self.received().iter().map(|m| m.kind()).collect()
    }

    fn accept(&self, frame: &str) {
        let message = ClientMessage::decode(frame).expect("client sent an invalid frame");
        self.received.lock().unwrap().push(message.clone());

        if !self.auto_ack.load(Ordering::SeqCst) {
            return;
        }

        let reply = match message {
            ClientMessage::ConnectProducerTransport { .. } => {
                Some(ServerMessage::ConnectedProducerTransport)
            }
            ClientMessage::ConnectConsumerTransport { .. } => {
                Some(ServerMessage::ConnectedConsumerTransport)
            }
            ClientMessage::Produce { .. } => {
                let n = self.produced.fetch_add(1, Ordering::SeqCst) + 1;
                Some(ServerMessage::Produced {
                    id: ProducerId::new(format!("prod-{}", n)),
                })
            }
            _ => None,
        };

        if let Some(reply) = reply {
            self.push(reply);
        }
    }
}

pub struct MockChannel {
    server: Arc<MockServer>,
    inbound: mpsc::UnboundedReceiver<String>,
}

#[async_trait]
impl SignalingChannel for MockChannel {
    async fn send_message(&mut self, message: String) -> Result<(), ChannelError> {
        self.server.accept(&message);
        Ok(())
    }

    async fn receive_message(&mut self) -> Result<Option<String>, ChannelError> {
        Ok(self.inbound.recv().await)
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.server.channel_closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

pub struct MockConnector {
    server: Arc<MockServer>,
    pub opened: Mutex<Vec<Url>>,
    refuse: bool,
}

impl MockConnector {
    pub fn new(server: Arc<MockServer>, refuse: bool) -> Self {
        Self {
            server,
            opened: Mutex::new(Vec::new()),
            refuse,
        }
    }
}

#[async_trait]
impl SignalingConnector for MockConnector {
    async fn open(&self, url: &Url) -> Result<Box<dyn SignalingChannel>, ChannelError> {
        self.opened.lock().unwrap().push(url.clone());
        if self.refuse {
            return Err(ChannelError::ConnectFailed("connection refused".to_string()));
        }

        let inbound = self
            .server
            .client_inbound
            .lock()
            .unwrap()
            .take()
            .ok_or(ChannelError::ConnectionClosed)?;

        Ok(Box::new(MockChannel {
            server: Arc::clone(&self.server),
            inbound,
        }))
    }
}

// ============================================================================
// Fake Media Engine
// ============================================================================

/// Ordered record of engine calls, shared by every fake object
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn record(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn position(&self, entry: &str) -> Option<usize> {
        self.entries().iter().position(|e| e == entry)
    }
}

pub struct FakeEngine {
    pub log: CallLog,
    pub produced: Arc<Mutex<Vec<ProduceOptions>>>,
}

impl FakeEngine {
    pub fn new(log: CallLog) -> Self {
        Self {
            log,
            produced: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl MediaEngine for FakeEngine {
    fn create_device(&self) -> Arc<dyn Device> {
        self.log.record("engine.create_device");
        Arc::new(FakeDevice {
            log: self.log.clone(),
            produced: Arc::clone(&self.produced),
            capabilities: Mutex::new(None),
        })
    }
}

pub struct FakeDevice {
    log: CallLog,
    produced: Arc<Mutex<Vec<ProduceOptions>>>,
    capabilities: Mutex<Option<RtpCapabilities>>,
}

#[async_trait]
impl Device for FakeDevice {
    async fn load(&self, router_rtp_capabilities: &RtpCapabilities) -> Result<(), EngineError> {
        self.log.record("device.load");
        *self.capabilities.lock().unwrap() = Some(router_rtp_capabilities.clone());
        Ok(())
    }

    fn rtp_capabilities(&self) -> Option<RtpCapabilities> {
        self.capabilities.lock().unwrap().clone()
    }

    fn create_send_transport(
        &self,
        _options: &TransportOptions,
        signaler: Arc<dyn TransportSignaler>,
    ) -> Result<Arc<dyn SendTransport>, EngineError> {
        if self.capabilities.lock().unwrap().is_none() {
            return Err(EngineError::NotLoaded);
        }
        self.log.record("device.create_send_transport");
        Ok(Arc::new(FakeSendTransport {
            log: self.log.clone(),
            produced: Arc::clone(&self.produced),
            signaler,
            connected: AtomicBool::new(false),
        }))
    }

    fn create_recv_transport(
        &self,
        _options: &TransportOptions,
        signaler: Arc<dyn TransportSignaler>,
    ) -> Result<Arc<dyn RecvTransport>, EngineError> {
        if self.capabilities.lock().unwrap().is_none() {
            return Err(EngineError::NotLoaded);
        }
        self.log.record("device.create_recv_transport");
        Ok(Arc::new(FakeRecvTransport {
            log: self.log.clone(),
            signaler,
            connected: AtomicBool::new(false),
        }))
    }
}

fn dtls() -> DtlsParameters {
    DtlsParameters(json!({ "role": "client", "fingerprints": [] }))
}

pub struct FakeSendTransport {
    log: CallLog,
    produced: Arc<Mutex<Vec<ProduceOptions>>>,
    signaler: Arc<dyn TransportSignaler>,
    connected: AtomicBool,
}

#[async_trait]
impl SendTransport for FakeSendTransport {
    async fn produce(
        &self,
        track: MediaTrack,
        options: ProduceOptions,
    ) -> Result<Box<dyn Producer>, EngineError> {
        // Real transports connect lazily, on the first produce
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.signaler.connect(dtls()).await?;
        }

        let id = self
            .signaler
            .produce(track.kind(), RtpParameters(json!({ "encodings": [] })))
            .await?;

        self.log.record(format!("send.produce:{}", track.kind()));
        self.produced.lock().unwrap().push(options);

        Ok(Box::new(FakeProducer {
            id,
            kind: track.kind(),
            log: self.log.clone(),
        }))
    }

    fn close(&self) {
        self.log.record("send.close");
    }
}

pub struct FakeRecvTransport {
    log: CallLog,
    signaler: Arc<dyn TransportSignaler>,
    connected: AtomicBool,
}

#[async_trait]
impl RecvTransport for FakeRecvTransport {
    async fn consume(&self, params: ConsumeParams) -> Result<Box<dyn Consumer>, EngineError> {
        if !self.connected.swap(true, Ordering::SeqCst) {
            self.signaler.connect(dtls()).await?;
        }

        self.log.record(format!("recv.consume:{}", params.id));
        Ok(Box::new(FakeConsumer {
            track: MediaTrack::new(format!("track-{}", params.id), params.kind),
            id: params.id,
            producer_id: params.producer_id,
            log: self.log.clone(),
        }))
    }

    fn close(&self) {
        self.log.record("recv.close");
    }
}

pub struct FakeProducer {
    id: ProducerId,
    kind: MediaKind,
    log: CallLog,
}

impl Producer for FakeProducer {
    fn id(&self) -> &ProducerId {
        &self.id
    }

    fn kind(&self) -> MediaKind {
        self.kind
    }

    fn close(&self) {
        self.log.record(format!("producer.close:{}", self.id));
    }
}

pub struct FakeConsumer {
    id: ConsumerId,
    producer_id: ProducerId,
    track: MediaTrack,
    log: CallLog,
}

impl Consumer for FakeConsumer {
    fn id(&self) -> &ConsumerId {
        &self.id
    }

    fn producer_id(&self) -> &ProducerId {
        &self.producer_id
    }

    fn track(&self) -> MediaTrack {
        self.track.clone()
    }

    fn close(&self) {
        self.log.record(format!("consumer.close:{}", self.id));
    }
}

// ============================================================================
// Fake Capture And Playback
// ============================================================================

#[derive(Default)]
pub struct FakeMediaDevices {
    pub fail_microphone: AtomicBool,
    pub fail_display: AtomicBool,
    pub captured: Mutex<Vec<MediaTrack>>,
    displays: AtomicUsize,
}

#[async_trait]
impl MediaDevices for FakeMediaDevices {
    async fn microphone(&self) -> Result<MediaStream, EngineError> {
        if self.fail_microphone.load(Ordering::SeqCst) {
            return Err(EngineError::Capture("permission denied".to_string()));
        }
        let track = MediaTrack::new("mic", MediaKind::Audio);
        self.captured.lock().unwrap().push(track.clone());
        Ok(MediaStream::with_tracks([track]))
    }

    async fn display(&self) -> Result<MediaStream, EngineError> {
        if self.fail_display.load(Ordering::SeqCst) {
            return Err(EngineError::Capture("user cancelled".to_string()));
        }
        let n = self.displays.fetch_add(1, Ordering::SeqCst) + 1;
        let track = MediaTrack::new(format!("screen-{}", n), MediaKind::Video);
        self.captured.lock().unwrap().push(track.clone());
        Ok(MediaStream::with_tracks([track]))
    }
}

#[derive(Default)]
pub struct RecordingAudioOutput {
    pub connected: Mutex<Vec<String>>,
    pub closes: AtomicUsize,
}

impl RecordingAudioOutput {
    pub fn connected(&self) -> Vec<String> {
        self.connected.lock().unwrap().clone()
    }
}

impl AudioOutput for RecordingAudioOutput {
    fn connect(&self, track: &MediaTrack) {
        self.connected.lock().unwrap().push(track.id().to_string());
    }

    fn disconnect(&self, track: &MediaTrack) {
        self.connected.lock().unwrap().retain(|id| id != track.id());
    }

    fn close(&self) {
        self.closes.fetch_add(1, Ordering::SeqCst);
    }
}
