//! Startup permission gates.
//!
//! [`PermissionGate`] drives a [`GateSet`](sanctuary_core::GateSet) from async
//! tasks: it runs each gate's [`GateCheck`], arms per-gate timeouts and fires
//! the completion callbacks exactly once.

mod checks;
mod orchestrator;

pub use checks::{
    CheckOutcome, GateCheck, LocationPermissionCheck, PlayerChoiceCheck, ReadinessCheck,
};
pub use orchestrator::PermissionGate;
