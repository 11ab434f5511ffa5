use std::time::Duration;

use bitflags::bitflags;

/// Identifier of a startup gate.
///
/// The string form is camelCase (`"locationPermission"`), matching the keys
/// used by presentation layers.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[strum(serialize_all = "camelCase")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "camelCase")
)]
pub enum GateName {
    LocationPermission,
    PlayerChoice,
    MapReady,
}

bitflags! {
    /// Behavioral flags of a gate.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct GateFlags: u8 {
        /// Counted by `all_gates_passed`.
        const REQUIRED           = 1 << 0;
        /// Dependent systems wait for it; eligible for the forced timeout pass.
        const BLOCKING           = 1 << 1;
        /// A failed check passes the gate in degraded mode instead of leaving it failed.
        const DEGRADE_ON_FAILURE = 1 << 2;
    }
}

/// Registration options for a gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GateSpec {
    pub flags: GateFlags,
    /// Forced-pass deadline measured from registration. `None` disables it.
    pub timeout: Option<Duration>,
}

impl GateSpec {
    pub const fn new(flags: GateFlags) -> Self {
        Self {
            flags,
            timeout: None,
        }
    }

    /// Required and blocking, without a timeout.
    pub const fn required() -> Self {
        Self::new(GateFlags::REQUIRED.union(GateFlags::BLOCKING))
    }

    /// Neither required nor blocking.
    pub const fn optional() -> Self {
        Self::new(GateFlags::empty())
    }

    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub const fn degrade_on_failure(mut self) -> Self {
        self.flags = self.flags.union(GateFlags::DEGRADE_ON_FAILURE);
        self
    }

    pub const fn is_required(&self) -> bool {
        self.flags.contains(GateFlags::REQUIRED)
    }

    pub const fn is_blocking(&self) -> bool {
        self.flags.contains(GateFlags::BLOCKING)
    }
}

/// How a gate reached the passed state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[strum(serialize_all = "snake_case")]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum PassKind {
    /// The check succeeded.
    Granted,
    /// The check failed but the gate lets the session continue with reduced functionality.
    Degraded,
    /// The gate timed out and was forced open.
    Skipped,
}

/// Lifecycle of a single gate.
///
/// `Pending → Requesting → Passed` or `Requesting → Failed → Requesting` for
/// retries. `Passed` is terminal until an explicit reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum GateState {
    Pending,
    Requesting,
    Failed,
    Passed(PassKind),
}

impl GateState {
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed(_))
    }
}

/// A registered gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Gate {
    pub name: GateName,
    pub spec: GateSpec,
    pub state: GateState,
    /// Human-readable status, for display only.
    pub status_message: String,
    /// Id of the outstanding request; set only while `Requesting`.
    pub(crate) request: Option<u64>,
}

impl Gate {
    pub fn new(name: GateName, spec: GateSpec) -> Self {
        Self {
            name,
            spec,
            state: GateState::Pending,
            status_message: String::from("Pending"),
            request: None,
        }
    }

    pub const fn passed(&self) -> bool {
        self.state.is_passed()
    }

    pub fn snapshot(&self) -> GateSnapshot {
        GateSnapshot {
            name: self.name,
            required: self.spec.is_required(),
            blocking: self.spec.is_blocking(),
            state: self.state,
            status_message: self.status_message.clone(),
        }
    }
}

/// Identifies one request of a gate.
///
/// Returned by [`GateSet::begin_request`](super::GateSet::begin_request).
/// Results reported with a ticket that is no longer current are ignored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    pub(crate) name: GateName,
    pub(crate) id: u64,
}

impl RequestTicket {
    pub const fn gate(&self) -> GateName {
        self.name
    }
}

/// Read-only view of a gate for presentation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GateSnapshot {
    pub name: GateName,
    pub required: bool,
    pub blocking: bool,
    pub state: GateState,
    pub status_message: String,
}

/// A state change produced by a [`GateSet`](super::GateSet) operation.
///
/// The runtime turns these into bus events; presentation layers render them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateTransition {
    Requesting {
        name: GateName,
    },
    Passed {
        name: GateName,
        kind: PassKind,
        message: String,
    },
    Failed {
        name: GateName,
        message: String,
    },
    Reset {
        name: GateName,
    },
}

impl GateTransition {
    pub const fn gate(&self) -> GateName {
        match self {
            Self::Requesting { name }
            | Self::Passed { name, .. }
            | Self::Failed { name, .. }
            | Self::Reset { name } => *name,
        }
    }
}
