//! Runtime orchestration for the game client core.
//!
//! This crate wires the pure state machines from `sanctuary-core` to async
//! tasks, durable storage and presentation adapters. Consumers embed
//! [`Runtime`] to run the startup gate sequence and then interact with the
//! session through [`RuntimeHandle`].
//!
//! Modules are organized by responsibility:
//! - [`runtime`] hosts the orchestrator and builder
//! - [`api`] exposes the errors, handle and provider traits clients implement
//! - [`events`] provides the topic-based event bus presentation layers observe
//! - [`gate`] runs the permission gate sequence with timeouts
//! - [`position`], [`dialog`], [`map`] hold the shared session services
//! - [`repository`] provides durable key-value storage
//! - [`workers`] keeps background tasks internal to the crate
pub mod api;
pub mod clock;
pub mod dialog;
pub mod events;
pub mod gate;
pub mod map;
pub mod position;
pub mod readiness;
pub mod repository;
pub mod runtime;

mod utils;
mod workers;

pub use api::{
    ChoiceProvider, FixedChoice, FixedGeolocation, GateCheckError, GeolocationError,
    GeolocationProvider, Result, RuntimeError, RuntimeHandle,
};
pub use clock::SystemClock;
pub use dialog::{DialogPresenter, DialogRenderer, DialogTrigger, TracingDialogRenderer};
pub use events::{DialogEvent, Event, EventBus, GateEvent, PositionEvent, ProximityEvent, Topic};
pub use gate::{
    CheckOutcome, GateCheck, LocationPermissionCheck, PermissionGate, PlayerChoiceCheck,
    ReadinessCheck,
};
pub use map::{IconSpec, MapAdapter, MapPrimitive, MarkerLayer, PLAYER_MARKER_ID};
pub use position::PositionStore;
pub use readiness::Readiness;
pub use repository::{
    FileKeyValueStore, InMemoryKeyValueStore, KeyValueStore, PermissionRecord, PermissionStatus,
    PlayerChoice, PlayerChoiceRecord, RecordStore, RepositoryError, StorageKey,
};
pub use runtime::{Runtime, RuntimeBuilder, RuntimeConfig};
pub use workers::ProximityMonitor;
