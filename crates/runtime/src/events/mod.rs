//! Topic-based event bus for runtime events.
//!
//! Gate transitions, position updates, proximity firings and dialog lifecycle
//! changes are published to separate topics so presentation layers subscribe
//! only to what they render.

mod bus;
mod types;

pub use bus::{Event, EventBus, Topic};
pub use types::{DialogEvent, GateEvent, PositionEvent, ProximityEvent};
