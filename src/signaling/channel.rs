use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;
use url::Url;

use crate::shared::RoomId;

/// Duplex text-message stream to the rooms service - all we care about is send/receive
#[async_trait]
pub trait SignalingChannel: Send {
    /// Send a text frame to the server
    async fn send_message(&mut self, message: String) -> Result<(), ChannelError>;

    /// Receive the next text frame (None once the server closed the connection)
    async fn receive_message(&mut self) -> Result<Option<String>, ChannelError>;

    /// Close the connection
    async fn close(&mut self) -> Result<(), ChannelError>;
}

/// Opens signaling channels
#[async_trait]
pub trait SignalingConnector: Send + Sync {
    async fn open(&self, url: &Url) -> Result<Box<dyn SignalingChannel>, ChannelError>;
}

/// Handler for frames arriving from the server
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle_message(&self, room_id: &RoomId, message: String);
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Failed to connect: {0}")]
    ConnectFailed(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Send failed: {0}")]
    SendFailed(String),

    #[error("Receive failed: {0}")]
    ReceiveFailed(String),
}

/// A running signaling connection
///
/// Outbound frames are queued on an unbounded channel by the controller;
/// dropping every sender for it closes the connection.
pub struct Connection {
    pub room_id: RoomId,
    channel: Box<dyn SignalingChannel>,
    outbound_receiver: mpsc::UnboundedReceiver<String>,
    message_handler: Arc<dyn MessageHandler>,
}

impl Connection {
    pub fn new(
        room_id: RoomId,
        channel: Box<dyn SignalingChannel>,
        outbound_receiver: mpsc::UnboundedReceiver<String>,
        message_handler: Arc<dyn MessageHandler>,
    ) -> Self {
        Self {
            room_id,
            channel,
            outbound_receiver,
            message_handler,
        }
    }

    /// Run the connection - handles both sending and receiving until either side closes
    pub async fn run(mut self) -> Result<(), ChannelError> {
        loop {
            tokio::select! {
                // Outbound messages (from the controller to the server)
                msg = self.outbound_receiver.recv() => {
                    match msg {
                        Some(message) => self.channel.send_message(message).await?,
                        None => {
                            debug!(room_id = %self.room_id, "Outbound queue closed, disconnecting");
                            break;
                        }
                    }
                }

                // Inbound messages (from the server to the controller)
                msg = self.channel.receive_message() => {
                    match msg {
                        Ok(Some(message)) => {
                            self.message_handler
                                .handle_message(&self.room_id, message)
                                .await;
                        }
                        Ok(None) => {
                            debug!(room_id = %self.room_id, "Server closed the signaling channel");
                            break;
                        }
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        // Clean disconnect
        let _ = self.channel.close().await;
        Ok(())
    }
}
