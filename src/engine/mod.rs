// Seams to the external media engine
//
// Capability negotiation, DTLS/SRTP, ICE and encoding all live behind these
// traits. The room controller only drives them in the right order.

// Public API - what other modules can use
pub use capture::{AudioOutput, MediaDevices};
pub use device::{Device, MediaEngine};
pub use errors::EngineError;
pub use transport::{
    ConsumeParams, Consumer, ProduceOptions, Producer, RecvTransport, SendTransport,
    TransportSignaler,
};

// Internal modules
mod capture;
mod device;
mod errors;
mod transport;
