// Signaling wire vocabulary
//
// Tagged-union messages exchanged with the rooms service, the opaque
// engine payloads they carry, and their dispatch classification.

// Public API - what other modules can use
pub use errors::ProtocolError;
pub use messages::{ClientMessage, MessageClass, ServerMessage, SERVER_MESSAGE_TYPES};
pub use payloads::{DtlsParameters, RtpCapabilities, RtpParameters, TransportOptions};

// Internal modules
mod errors;
mod messages;
mod payloads;
