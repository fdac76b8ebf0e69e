// Signaling transport
//
// The duplex channel carrying protocol envelopes to and from the rooms
// service. It carries no media itself.

// Public API - what other modules can use
pub use channel::{ChannelError, Connection, MessageHandler, SignalingChannel, SignalingConnector};
pub use websocket::{WebSocketChannel, WebSocketConnector};

// Internal modules
mod channel;
mod websocket;
