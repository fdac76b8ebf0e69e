use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::controller::RoomInner;
use super::handshake::HandshakeParams;
use super::queue::QueueWorker;
use super::state::{ChatMessage, ConnectionState, RosterEntry};
use crate::engine::ConsumeParams;
use crate::event::RoomEvent;
use crate::protocol::{ClientMessage, MessageClass, ServerMessage};
use crate::shared::{RoomError, RoomId};
use crate::signaling::MessageHandler;

/// Classifies inbound frames and hands them to the right path
pub(crate) struct InboundRouter {
    room: Arc<RoomInner>,
}

impl InboundRouter {
    pub fn new(room: Arc<RoomInner>) -> Self {
        Self { room }
    }
}

#[async_trait]
impl MessageHandler for InboundRouter {
    async fn handle_message(&self, room_id: &RoomId, message: String) {
        let message = match ServerMessage::decode(&message) {
            Ok(message) => message,
            Err(e) => {
                warn!(room_id = %room_id, error = %e, "Dropping malformed server message");
                return;
            }
        };

        if self.room.is_closed() {
            debug!(room_id = %room_id, kind = message.kind(), "Room closed, ignoring message");
            return;
        }

        match message.class() {
            MessageClass::Handshake => self.room.begin_handshake(message),
            MessageClass::Acknowledgement => self.room.dispatch_acknowledgement(message).await,
            MessageClass::SessionEvent => {
                let kind = message.kind();
                if !self.room.session_events.push(message) {
                    debug!(room_id = %room_id, kind = kind, "Session event queue closed, dropping");
                }
            }
        }
    }
}

impl RoomInner {
    pub(crate) fn begin_handshake(self: &Arc<Self>, message: ServerMessage) {
        self.signals.emit(message.kind(), &message);

        let ServerMessage::Init {
            room_id,
            consumer_transport_options,
            producer_transport_options,
            router_rtp_capabilities,
        } = message
        else {
            return;
        };

        if !self.transition(ConnectionState::Connecting, ConnectionState::Handshaking) {
            warn!(
                room_id = %self.id,
                state = %self.connection_state(),
                "Ignoring unexpected Init"
            );
            return;
        }

        if let Some(announced) = room_id.filter(|announced| *announced != self.id) {
            warn!(room_id = %self.id, announced = %announced, "Server announced a different room id");
        }

        let params = HandshakeParams {
            consumer_transport_options,
            producer_transport_options,
            router_rtp_capabilities,
        };
        let room = Arc::clone(self);
        tokio::spawn(async move {
            let result = room.run_handshake(params).await;
            room.finish_handshake(result).await;
        });
    }

    /// Acknowledgements bypass the session queue: a request in flight is
    /// waiting on them
    async fn dispatch_acknowledgement(&self, message: ServerMessage) {
        if let ServerMessage::Text { sender_id, text } = &message {
            self.record_message(ChatMessage::received(sender_id.clone(), text.clone()))
                .await;
        }

        let listeners = self.signals.emit(message.kind(), &message);
        if listeners == 0 && !matches!(message, ServerMessage::Text { .. }) {
            debug!(room_id = %self.id, kind = message.kind(), "Acknowledgement with no waiter");
        }
    }

    /// Drains session events in arrival order once the room is active
    pub(crate) async fn run_session_events(self: Arc<Self>, mut worker: QueueWorker<ServerMessage>) {
        let mut connection = self.connection.subscribe();
        let ready = connection
            .wait_for(|state| matches!(state, ConnectionState::Active | ConnectionState::Closed))
            .await
            .map(|state| *state);
        drop(connection);

        if !matches!(ready, Ok(ConnectionState::Active)) {
            debug!(room_id = %self.id, "Room closed before handshake, discarding session events");
            return;
        }

        info!(room_id = %self.id, pending = worker.pending(), "Processing session events");

        while let Some(message) = worker.next().await {
            if self.is_closed() {
                break;
            }

            let kind = message.kind();
            if let Err(e) = self.dispatch_session_event(message).await {
                if e.is_recoverable() {
                    warn!(room_id = %self.id, kind = kind, error = %e, "Session event failed");
                } else {
                    error!(room_id = %self.id, kind = kind, error = %e, "Session event failed");
                }
            }
        }

        debug!(room_id = %self.id, "Session event worker stopped");
    }

    async fn dispatch_session_event(&self, message: ServerMessage) -> Result<(), RoomError> {
        self.signals.emit(message.kind(), &message);

        match message {
            ServerMessage::ProducerAdded {
                session_id,
                producer_id,
            } => {
                debug!(room_id = %self.id, session_id = %session_id, producer_id = %producer_id, "Remote producer added");
                self.send(ClientMessage::Consume {
                    producer_id,
                    session_id,
                })
            }
            ServerMessage::ProducerRemoved {
                session_id,
                producer_id,
            } => {
                self.remove_track(&session_id, &producer_id).await;
                Ok(())
            }
            ServerMessage::Consumed {
                id,
                producer_id,
                session_id,
                kind,
                rtp_parameters,
            } => {
                let transport = self.state.read().await.recv_transport.clone();
                let Some(transport) = transport else {
                    return Err(RoomError::InvalidState(self.connection_state()));
                };

                let consumer = transport
                    .consume(ConsumeParams {
                        id,
                        producer_id: producer_id.clone(),
                        kind,
                        rtp_parameters,
                    })
                    .await?;

                if self.is_closed() {
                    consumer.close();
                    return Err(RoomError::Disconnected);
                }

                let duplicate = self
                    .state
                    .read()
                    .await
                    .producer_tracks
                    .contains_key(&producer_id);
                if duplicate {
                    warn!(
                        room_id = %self.id,
                        producer_id = %producer_id,
                        consumer_id = %consumer.id(),
                        "Producer already consumed, dropping duplicate consumer"
                    );
                    consumer.close();
                    return Ok(());
                }

                self.send(ClientMessage::ConsumerResume {
                    id: consumer.id().clone(),
                })?;

                let track = consumer.track();
                self.state
                    .write()
                    .await
                    .consumers
                    .insert(producer_id.clone(), consumer);

                self.add_track(session_id, producer_id, track).await;
                Ok(())
            }
            ServerMessage::NewComer {
                session_id,
                name,
                just_joined,
            } => {
                {
                    let mut state = self.state.write().await;
                    match state.roster.iter_mut().find(|e| e.session_id == session_id) {
                        Some(entry) => entry.name = name.clone(),
                        None => state.roster.push(RosterEntry {
                            session_id: session_id.clone(),
                            name: name.clone(),
                        }),
                    }
                }

                info!(room_id = %self.id, session_id = %session_id, name = %name, just_joined, "Participant announced");
                self.emit(RoomEvent::Newcomer {
                    session_id,
                    name,
                    just_joined,
                });
                Ok(())
            }
            ServerMessage::Error { error } => {
                warn!(room_id = %self.id, error = %error, "Server reported an error");
                self.emit(RoomEvent::ServerError { error });
                Ok(())
            }
            other => {
                debug!(room_id = %self.id, kind = other.kind(), "Unhandled session event");
                Ok(())
            }
        }
    }
}
