//! Proximity detection against named points of interest.
//!
//! [`ProximityEngine::tick`] is pure given its inputs: it has no timer and
//! reads no clock. The host calls it on a polling cadence or whenever the
//! player position changes.

mod engine;
mod error;
mod target;

pub use engine::{ProximityEngine, TickReport};
pub use error::{HandlerError, ProximityError};
pub use target::{ProximityHandler, ProximityHit, ProximityTarget};
