use async_trait::async_trait;
use std::sync::Arc;

use super::errors::EngineError;
use super::transport::{RecvTransport, SendTransport, TransportSignaler};
use crate::protocol::{RtpCapabilities, TransportOptions};

/// Entry point to the media engine
pub trait MediaEngine: Send + Sync {
    /// Creates a fresh, unloaded device for one room connection
    fn create_device(&self) -> Arc<dyn Device>;
}

/// One engine instance negotiating with one router
#[async_trait]
pub trait Device: Send + Sync {
    /// Loads the router's capabilities. Must complete before anything else.
    async fn load(&self, router_rtp_capabilities: &RtpCapabilities) -> Result<(), EngineError>;

    /// The client's own capabilities, available once loaded
    fn rtp_capabilities(&self) -> Option<RtpCapabilities>;

    /// Creates the send transport. The engine calls back into `signaler`
    /// to connect it and to announce each new producer.
    fn create_send_transport(
        &self,
        options: &TransportOptions,
        signaler: Arc<dyn TransportSignaler>,
    ) -> Result<Arc<dyn SendTransport>, EngineError>;

    /// Creates the receive transport. The engine calls back into `signaler`
    /// to connect it on first consume.
    fn create_recv_transport(
        &self,
        options: &TransportOptions,
        signaler: Arc<dyn TransportSignaler>,
    ) -> Result<Arc<dyn RecvTransport>, EngineError>;
}
