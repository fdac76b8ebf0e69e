use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info};
use url::Url;

use super::channel::{ChannelError, SignalingChannel, SignalingConnector};

/// Opens signaling channels as websocket connections
#[derive(Debug, Clone, Default)]
pub struct WebSocketConnector;

#[async_trait]
impl SignalingConnector for WebSocketConnector {
    async fn open(&self, url: &Url) -> Result<Box<dyn SignalingChannel>, ChannelError> {
        let (stream, response) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::ConnectFailed(e.to_string()))?;

        info!(
            url = %url,
            status = %response.status(),
            "Signaling websocket connected"
        );

        Ok(Box::new(WebSocketChannel { stream }))
    }
}

/// Signaling over a websocket; one JSON envelope per text frame
pub struct WebSocketChannel {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

#[async_trait]
impl SignalingChannel for WebSocketChannel {
    async fn send_message(&mut self, message: String) -> Result<(), ChannelError> {
        self.stream
            .send(Message::Text(message))
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }

    async fn receive_message(&mut self) -> Result<Option<String>, ChannelError> {
        loop {
            match self.stream.next().await {
                Some(Ok(Message::Text(text))) => return Ok(Some(text)),
                Some(Ok(Message::Close(_))) => return Ok(None),
                // Pongs are answered by tungstenite itself
                Some(Ok(other)) => {
                    debug!(frame = ?other, "Ignoring non-text signaling frame");
                }
                Some(Err(e)) => return Err(ChannelError::ReceiveFailed(e.to_string())),
                None => return Ok(None),
            }
        }
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.stream
            .close(None)
            .await
            .map_err(|e| ChannelError::SendFailed(e.to_string()))
    }
}
