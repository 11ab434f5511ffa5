//! Startup gate state machine.
//!
//! A gate is a named precondition (location permission, player choice, map
//! readiness) that must pass before the game systems initialize. [`GateSet`]
//! owns every gate, applies the per-gate transitions and decides when the
//! whole sequence is complete. It has no notion of time or I/O; the runtime
//! performs the asynchronous checks and timeouts and feeds results back in.

mod error;
mod set;
mod types;

pub use error::GateError;
pub use set::{GateSet, Registration};
pub use types::{
    Gate, GateFlags, GateName, GateSnapshot, GateSpec, GateState, GateTransition, PassKind,
    RequestTicket,
};
