//! Deterministic startup and proximity logic shared across clients.
//!
//! `sanctuary-core` defines the pure state machines behind the game client:
//! the startup gate set, great-circle geodesy, the proximity engine and the
//! single-flight dialog model. Nothing here performs I/O or owns a timer;
//! the `runtime` crate drives these types from async tasks and supplies the
//! current time through [`Clock`].
pub mod clock;
pub mod config;
pub mod dialog;
pub mod gate;
pub mod geo;
pub mod proximity;

pub use clock::{Clock, ManualClock};
pub use config::CoreConfig;
pub use dialog::{Dialog, DialogChoice, DialogError, DialogOutcome, DialogSlot};
pub use gate::{
    Gate, GateError, GateFlags, GateName, GateSet, GateSnapshot, GateSpec, GateState,
    GateTransition, PassKind, Registration, RequestTicket,
};
pub use geo::{GeoPoint, PlayerPosition, haversine_distance};
pub use proximity::{
    HandlerError, ProximityEngine, ProximityError, ProximityHandler, ProximityHit,
    ProximityTarget, TickReport,
};
