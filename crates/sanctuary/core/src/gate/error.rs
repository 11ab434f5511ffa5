use thiserror::Error;

use super::GateName;

/// Errors raised when a gate operation does not apply to the gate's state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GateError {
    #[error("gate {0} is not registered")]
    UnknownGate(GateName),

    #[error("gate {0} has already passed")]
    AlreadyPassed(GateName),

    #[error("gate {0} already has a request in flight")]
    RequestInFlight(GateName),
}

impl GateError {
    pub fn gate(&self) -> GateName {
        match self {
            Self::UnknownGate(name) | Self::AlreadyPassed(name) | Self::RequestInFlight(name) => {
                *name
            }
        }
    }
}
