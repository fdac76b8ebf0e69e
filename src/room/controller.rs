use std::sync::{Arc, Mutex};
use tokio::sync::{mpsc, oneshot, watch, RwLock};
use tokio::time::timeout;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

use super::playback::PlaybackGraph;
use super::queue::TaskQueue;
use super::router::InboundRouter;
use super::state::{
    ChatMessage, ConnectionState, MediaSource, RosterEntry, RoomState, ScreenShare,
};
use crate::engine::{AudioOutput, EngineError, MediaDevices, MediaEngine};
use crate::event::{EventBus, ListenerId, RoomEvent};
use crate::media::{MediaStream, MediaTrack};
use crate::protocol::{ClientMessage, ServerMessage};
use crate::shared::{sync::lock, ProducerId, RoomConfig, RoomError, RoomId, SessionId};
use crate::signaling::{ChannelError, Connection, SignalingConnector};

/// External collaborators a room drives
#[derive(Clone)]
pub struct RoomServices {
    pub engine: Arc<dyn MediaEngine>,
    pub devices: Arc<dyn MediaDevices>,
    pub audio_output: Arc<dyn AudioOutput>,
    pub connector: Arc<dyn SignalingConnector>,
}

impl RoomServices {
    pub fn new(
        engine: Arc<dyn MediaEngine>,
        devices: Arc<dyn MediaDevices>,
        audio_output: Arc<dyn AudioOutput>,
        connector: Arc<dyn SignalingConnector>,
    ) -> Self {
        Self {
            engine,
            devices,
            audio_output,
            connector,
        }
    }
}

pub(crate) struct RoomInner {
    pub(crate) id: RoomId,
    pub(crate) config: RoomConfig,
    pub(crate) services: RoomServices,
    pub(crate) state: RwLock<RoomState>,
    pub(crate) events: EventBus<RoomEvent>,
    /// Inbound protocol messages, keyed by their `type`
    pub(crate) signals: EventBus<ServerMessage>,
    pub(crate) playback: PlaybackGraph,
    pub(crate) session_events: TaskQueue<ServerMessage>,
    /// Serialises local screen share start/stop
    pub(crate) screen_lock: tokio::sync::Mutex<()>,
    pub(crate) connection: watch::Sender<ConnectionState>,
    outbound: Mutex<Option<mpsc::UnboundedSender<String>>>,
    handshake_waiter: Mutex<Option<oneshot::Sender<Result<(), RoomError>>>>,
    /// Acknowledgements carry no correlation id, so only one acknowledged
    /// request may be in flight at a time
    request_lock: tokio::sync::Mutex<()>,
}

impl RoomInner {
    pub(crate) fn connection_state(&self) -> ConnectionState {
        *self.connection.borrow()
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.connection_state() == ConnectionState::Closed
    }

    /// Moves `from -> to` atomically. Returns false if the room was not in `from`.
    pub(crate) fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        let moved = self.connection.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });

        if moved {
            info!(room_id = %self.id, from = %from, to = %to, "Room state changed");
            self.emit(RoomEvent::StateChanged { state: to });
        }
        moved
    }

    pub(crate) fn emit(&self, event: RoomEvent) {
        self.events.emit(event.event_name(), &event);
    }

    /// Queues a message on the signaling channel
    pub(crate) fn send(&self, message: ClientMessage) -> Result<(), RoomError> {
        let frame = message.encode()?;

        let sender = lock(&self.outbound).clone();
        let Some(sender) = sender else {
            return Err(RoomError::ChannelClosed);
        };
        sender.send(frame).map_err(|_| RoomError::ChannelClosed)?;

        debug!(room_id = %self.id, kind = message.kind(), "Sent signaling message");
        Ok(())
    }

    /// Sends `message` and waits for the next inbound message of kind `ack`
    pub(crate) async fn request(
        &self,
        message: ClientMessage,
        ack: &'static str,
    ) -> Result<ServerMessage, RoomError> {
        let _in_flight = self.request_lock.lock().await;

        // Register before sending so a fast reply cannot slip past
        let (sender, receiver) = oneshot::channel();
        let slot = Mutex::new(Some(sender));
        let listener = self.signals.once(ack, move |reply: &ServerMessage| {
            if let Some(sender) = lock(&slot).take() {
                let _ = sender.send(reply.clone());
            }
        });

        if let Err(e) = self.send(message) {
            self.signals.off(ack, listener);
            return Err(e);
        }

        match timeout(self.config.ack_timeout, receiver).await {
            Ok(Ok(reply)) => Ok(reply),
            // Listener dropped without firing: the room was torn down
            Ok(Err(_)) => Err(RoomError::Disconnected),
            Err(_) => {
                self.signals.off(ack, listener);
                warn!(
                    room_id = %self.id,
                    ack = ack,
                    timeout_ms = self.config.ack_timeout.as_millis() as u64,
                    "Acknowledgement timed out"
                );
                Err(RoomError::AcknowledgementTimeout(ack))
            }
        }
    }

    pub(crate) async fn record_message(&self, message: ChatMessage) {
        self.state.write().await.messages.push(message.clone());
        self.emit(RoomEvent::Message { message });
    }

    pub(crate) fn notify_acquisition_failure(&self, source: MediaSource, error: &EngineError) {
        warn!(
            room_id = %self.id,
            source = %source,
            error = %error,
            "Local media acquisition failed"
        );
        self.emit(RoomEvent::AcquisitionFailed {
            source,
            reason: error.to_string(),
        });
    }

    pub(crate) async fn connect(self: &Arc<Self>) -> Result<(), RoomError> {
        let url = self.config.room_url(&self.id)?;

        if !self.transition(ConnectionState::Disconnected, ConnectionState::Connecting) {
            return Err(RoomError::InvalidState(self.connection_state()));
        }

        info!(room_id = %self.id, url = %url, "Opening signaling channel");

        let mut channel = match self.services.connector.open(&url).await {
            Ok(channel) => channel,
            Err(e) => {
                error!(room_id = %self.id, error = %e, "Failed to open signaling channel");
                self.disconnect().await;
                return Err(e.into());
            }
        };

        self.state.write().await.device = Some(self.services.engine.create_device());

        let (outbound, outbound_receiver) = mpsc::unbounded_channel();
        *lock(&self.outbound) = Some(outbound);

        let (waiter, handshake_done) = oneshot::channel();
        *lock(&self.handshake_waiter) = Some(waiter);

        let worker = self.session_events.open();

        // No awaits from here until the tasks are spawned. A disconnect that
        // already ran found none of the above, so it is undone here.
        if self.is_closed() {
            lock(&self.outbound).take();
            lock(&self.handshake_waiter).take();
            self.session_events.close();
            drop(worker);
            self.state.write().await.device = None;
            let _ = channel.close().await;
            debug!(room_id = %self.id, "Room closed while connecting");
            return Err(RoomError::Disconnected);
        }

        tokio::spawn(Arc::clone(self).run_session_events(worker));

        let connection = Connection::new(
            self.id.clone(),
            channel,
            outbound_receiver,
            Arc::new(InboundRouter::new(Arc::clone(self))),
        );
        let room = Arc::clone(self);
        tokio::spawn(async move {
            let result = connection.run().await;
            room.handle_channel_closed(result).await;
        });

        handshake_done.await.unwrap_or(Err(RoomError::Disconnected))
    }

    /// Resolves `connect()` with the handshake outcome
    pub(crate) async fn finish_handshake(&self, result: Result<(), RoomError>) {
        let result = match result {
            Ok(()) if self.transition(ConnectionState::Handshaking, ConnectionState::Active) => {
                info!(room_id = %self.id, "Handshake complete");
                Ok(())
            }
            Ok(()) => Err(RoomError::Disconnected),
            Err(e) => {
                error!(room_id = %self.id, error = %e, "Handshake failed");
                Err(e)
            }
        };

        let failed = result.is_err();
        let waiter = lock(&self.handshake_waiter).take();
        if let Some(waiter) = waiter {
            let _ = waiter.send(result);
        }

        if failed {
            self.disconnect().await;
        }
    }

    async fn handle_channel_closed(&self, result: Result<(), ChannelError>) {
        if self.is_closed() {
            debug!(room_id = %self.id, "Signaling channel finished after disconnect");
            return;
        }

        let error = match result {
            Ok(()) => {
                warn!(room_id = %self.id, "Server closed the signaling channel");
                RoomError::ChannelClosed
            }
            Err(e) => {
                warn!(room_id = %self.id, error = %e, "Signaling channel failed");
                RoomError::Channel(e)
            }
        };

        let waiter = lock(&self.handshake_waiter).take();
        if let Some(waiter) = waiter {
            let _ = waiter.send(Err(error));
        }

        // No reconnect: a dropped channel ends the session
        self.disconnect().await;
    }

    pub(crate) async fn disconnect(&self) {
        let previous = self.connection.send_replace(ConnectionState::Closed);
        if previous == ConnectionState::Closed {
            debug!(room_id = %self.id, "Room already closed");
            return;
        }

        info!(room_id = %self.id, from = %previous, "Disconnecting room");

        // Dropping the sender ends the connection task, which closes the channel
        lock(&self.outbound).take();
        self.session_events.close();

        let waiter = lock(&self.handshake_waiter).take();
        if let Some(waiter) = waiter {
            let _ = waiter.send(Err(RoomError::Disconnected));
        }

        {
            let mut state = self.state.write().await;
            state.microphone.release();
            state.screen.release();
            state.mic_on = false;

            for (_, consumer) in state.consumers.drain() {
                consumer.close();
            }
            if let Some(transport) = state.send_transport.take() {
                transport.close();
            }
            if let Some(transport) = state.recv_transport.take() {
                transport.close();
            }
            state.device = None;

            state.participants.clear();
            state.producer_tracks.clear();
            state.active_screen_share = None;
        }

        self.playback.close();
        // Pending acknowledgement listeners are dropped, failing their requests
        self.signals.clear();

        self.emit(RoomEvent::StateChanged {
            state: ConnectionState::Closed,
        });
    }
}

/// Controller for one participant's side of a room
///
/// Owns the signaling channel, drives the media engine through the
/// handshake, and keeps the participant/track maps the UI renders from.
/// UI code observes it through the getters and `on`/`once`/`off`, and
/// changes it only through the operations below.
pub struct Room {
    inner: Arc<RoomInner>,
}

impl Room {
    pub fn new(id: RoomId, config: RoomConfig, services: RoomServices) -> Self {
        let (connection, _) = watch::channel(ConnectionState::Disconnected);
        let playback = PlaybackGraph::new(Arc::clone(&services.audio_output));

        Self {
            inner: Arc::new(RoomInner {
                id,
                config,
                services,
                state: RwLock::new(RoomState::default()),
                events: EventBus::new(),
                signals: EventBus::new(),
                playback,
                session_events: TaskQueue::new(),
                screen_lock: tokio::sync::Mutex::new(()),
                connection,
                outbound: Mutex::new(None),
                handshake_waiter: Mutex::new(None),
                request_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.inner.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.inner.config
    }

    /// Signaling URL this room connects to
    pub fn url(&self) -> Result<Url, RoomError> {
        self.inner.config.room_url(&self.inner.id)
    }

    pub fn state(&self) -> ConnectionState {
        self.inner.connection_state()
    }

    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection.subscribe()
    }

    /// Opens the signaling channel and resolves once the handshake has
    /// completed (state `Active`), or with the error that ended it
    #[instrument(skip(self), fields(room_id = %self.inner.id))]
    pub async fn connect(&self) -> Result<(), RoomError> {
        self.inner.connect().await
    }

    /// Closes the channel and releases every local producer, track and the
    /// playback graph. Idempotent.
    #[instrument(skip(self), fields(room_id = %self.inner.id))]
    pub async fn disconnect(&self) {
        self.inner.disconnect().await
    }

    /// Flips the microphone track's enabled flag, returning the new value.
    /// None when there is no microphone track.
    pub async fn toggle_microphone(&self) -> Option<bool> {
        self.inner.toggle_microphone().await
    }

    /// Starts sharing a display capture, replacing any current share
    #[instrument(skip(self), fields(room_id = %self.inner.id))]
    pub async fn share_screen(&self) -> Result<(), RoomError> {
        self.inner.share_screen().await
    }

    #[instrument(skip(self), fields(room_id = %self.inner.id))]
    pub async fn stop_screen_sharing(&self) -> Result<(), RoomError> {
        self.inner.stop_screen_sharing().await
    }

    /// Sends a chat message and appends it to the log without waiting for the server
    pub async fn send_text(&self, text: impl Into<String>) -> Result<(), RoomError> {
        self.inner.send_text(text.into()).await
    }

    /// Attaches a received track to its participant, creating the session if needed
    pub async fn add_track(&self, session_id: SessionId, producer_id: ProducerId, track: MediaTrack) {
        self.inner.add_track(session_id, producer_id, track).await
    }

    /// Detaches a producer's track, dropping the session when it was the last one
    pub async fn remove_track(&self, session_id: &SessionId, producer_id: &ProducerId) {
        self.inner.remove_track(session_id, producer_id).await
    }

    pub async fn participants(&self) -> Vec<SessionId> {
        self.inner.state.read().await.participants.keys().cloned().collect()
    }

    pub async fn participant_stream(&self, session_id: &SessionId) -> Option<MediaStream> {
        self.inner
            .state
            .read()
            .await
            .participants
            .get(session_id)
            .map(|session| session.media_stream().clone())
    }

    pub async fn active_screen_share(&self) -> Option<ScreenShare> {
        let state = self.inner.state.read().await;
        let session_id = state.active_screen_share.as_ref()?;
        let session = state.participants.get(session_id)?;

        Some(ScreenShare {
            session_id: session_id.clone(),
            stream: session.media_stream().clone(),
        })
    }

    pub async fn mic_on(&self) -> bool {
        self.inner.state.read().await.mic_on
    }

    pub async fn screen_on(&self) -> bool {
        self.inner.state.read().await.screen.producer.is_some()
    }

    /// The local display capture currently being shared
    pub async fn screen_stream(&self) -> Option<MediaStream> {
        self.inner.state.read().await.screen.stream.clone()
    }

    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.inner.state.read().await.messages.clone()
    }

    pub async fn roster(&self) -> Vec<RosterEntry> {
        self.inner.state.read().await.roster.clone()
    }

    /// Session events received but not yet processed
    pub fn pending_session_events(&self) -> usize {
        self.inner.session_events.pending()
    }

    /// Listens for a UI event (see `event::names`)
    pub fn on<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: Fn(&RoomEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(name, listener)
    }

    pub fn once<F>(&self, name: &str, listener: F) -> ListenerId
    where
        F: Fn(&RoomEvent) + Send + Sync + 'static,
    {
        self.inner.events.once(name, listener)
    }

    pub fn off(&self, name: &str, id: ListenerId) -> bool {
        self.inner.events.off(name, id)
    }

    /// Listens for inbound protocol messages of one `type`, at the moment
    /// the controller dispatches them
    pub fn on_message<F>(&self, kind: &str, listener: F) -> ListenerId
    where
        F: Fn(&ServerMessage) + Send + Sync + 'static,
    {
        self.inner.signals.on(kind, listener)
    }

    pub fn off_message(&self, kind: &str, id: ListenerId) -> bool {
        self.inner.signals.off(kind, id)
    }
}
