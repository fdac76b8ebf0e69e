// Types shared across the crate: identifiers, configuration, errors, telemetry

// Public API - what other modules can use
pub use config::RoomConfig;
pub use error::RoomError;
pub use ids::{ConsumerId, ProducerId, RoomId, SessionId};
pub use telemetry::init_tracing;

// Internal modules
mod config;
mod error;
mod ids;
pub(crate) mod sync;
mod telemetry;
