// Event infrastructure
//
// A generic named pub/sub bus, plus the UI-facing events the room
// controller publishes through it.

// Public API - what other modules can use
pub use bus::{EventBus, Listener, ListenerId};
pub use events::{names, RoomEvent};

// Internal modules
mod bus;
mod events;
