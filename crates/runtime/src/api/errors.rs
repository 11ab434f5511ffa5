//! Unified error types surfaced by the runtime API.
//!
//! Gate checks, geolocation providers and repositories report failures through
//! these types. Check failures never escape the gate: they become `Failed` or
//! degraded transitions and are only visible through events and snapshots.
use std::time::Duration;

use thiserror::Error;

use sanctuary_core::{GateError, GateName, ProximityError};

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Gate(#[from] GateError),

    #[error(transparent)]
    Proximity(#[from] ProximityError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("gate {0} has no check configured")]
    MissingGateCheck(GateName),

    #[error("runtime requires a geolocation provider before building")]
    MissingGeolocation,

    #[error("runtime requires a choice provider before building")]
    MissingChoiceProvider,

    #[error("proximity worker join failed")]
    WorkerJoin(#[source] tokio::task::JoinError),
}

/// Failure of a platform geolocation request.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("location request timed out")]
    Timeout,

    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Failure of a gate check.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GateCheckError {
    #[error("GPS permission denied: {0}")]
    PermissionDenied(String),

    #[error("GPS request timed out after {0:?}")]
    PermissionTimeout(Duration),

    #[error("GPS position unavailable: {0}")]
    Unavailable(String),

    #[error("no player choice: {0}")]
    NoChoice(String),
}

impl GateCheckError {
    pub(crate) fn from_geolocation(err: GeolocationError, timeout: Duration) -> Self {
        match err {
            GeolocationError::PermissionDenied => {
                Self::PermissionDenied(String::from("user rejected location access"))
            }
            GeolocationError::Timeout => Self::PermissionTimeout(timeout),
            GeolocationError::Unavailable(reason) => Self::Unavailable(reason),
        }
    }
}
