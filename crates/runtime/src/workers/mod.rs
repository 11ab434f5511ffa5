//! Worker tasks that back the runtime orchestration.
//!
//! The proximity monitor re-evaluates points of interest on a fixed cadence
//! and on every position update once the startup gates have passed.

mod proximity;

pub use proximity::ProximityMonitor;
