//! Event types for different topics.

use sanctuary_core::{
    DialogOutcome, GateName, GateTransition, PassKind, PlayerPosition, ProximityHit,
};
use serde::{Deserialize, Serialize};

/// Events related to the startup gate sequence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GateEvent {
    /// A check started running for the gate
    Requesting { name: GateName },

    /// The gate passed, granted, degraded or skipped after a timeout
    Passed {
        name: GateName,
        kind: PassKind,
        message: String,
    },

    /// A check failed; a degraded pass may follow immediately
    Failed { name: GateName, message: String },

    /// The gate was returned to pending
    Reset { name: GateName },

    /// Every required gate passed. Published exactly once per session.
    AllPassed,
}

impl From<GateTransition> for GateEvent {
    fn from(transition: GateTransition) -> Self {
        match transition {
            GateTransition::Requesting { name } => Self::Requesting { name },
            GateTransition::Passed {
                name,
                kind,
                message,
            } => Self::Passed {
                name,
                kind,
                message,
            },
            GateTransition::Failed { name, message } => Self::Failed { name, message },
            GateTransition::Reset { name } => Self::Reset { name },
        }
    }
}

/// Events related to the current player position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PositionEvent {
    Updated(PlayerPosition),
    Cleared,
}

/// Events produced by proximity evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProximityEvent {
    /// A handler ran for a target in range
    Triggered(ProximityHit),

    /// A handler returned an error; its cooldown still started
    HandlerFailed { hit: ProximityHit, error: String },

    /// In range and off cooldown but held back by an open dialog
    Suppressed { target_id: String },

    /// The player walked out of a target's radius
    Left { target_id: String },

    /// A target was skipped because its data is invalid
    InvalidTarget { target_id: String },
}

/// Events related to the modal dialog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum DialogEvent {
    Opened { dialog_id: String },

    Closed {
        dialog_id: String,
        outcome: DialogOutcome,
    },

    /// A present call was rejected because another dialog was open
    Rejected { dialog_id: String },
}
