//! Cloneable façade over the session services.
//!
//! [`RuntimeHandle`] gives presentation layers access to the gates, the
//! player position, the dialog slot and the proximity monitor, and lets them
//! stream events from specific topics.
use std::collections::HashMap;

use tokio::sync::broadcast;

use sanctuary_core::{GateSnapshot, GateState, PlayerPosition};

use crate::dialog::DialogPresenter;
use crate::events::{Event, EventBus, Topic};
use crate::gate::PermissionGate;
use crate::position::PositionStore;
use crate::readiness::Readiness;
use crate::workers::ProximityMonitor;

/// Client-facing handle to interact with the runtime
#[derive(Clone)]
pub struct RuntimeHandle {
    gate: PermissionGate,
    positions: PositionStore,
    dialogs: DialogPresenter,
    proximity: ProximityMonitor,
    map_ready: Readiness,
    event_bus: EventBus,
}

impl RuntimeHandle {
    pub(crate) fn new(
        gate: PermissionGate,
        positions: PositionStore,
        dialogs: DialogPresenter,
        proximity: ProximityMonitor,
        map_ready: Readiness,
        event_bus: EventBus,
    ) -> Self {
        Self {
            gate,
            positions,
            dialogs,
            proximity,
            map_ready,
            event_bus,
        }
    }

    pub fn gate(&self) -> &PermissionGate {
        &self.gate
    }

    pub fn positions(&self) -> &PositionStore {
        &self.positions
    }

    pub fn dialogs(&self) -> &DialogPresenter {
        &self.dialogs
    }

    pub fn proximity(&self) -> &ProximityMonitor {
        &self.proximity
    }

    /// Signal the host resolves once its map widget has loaded.
    pub fn map_ready(&self) -> &Readiness {
        &self.map_ready
    }

    /// Feed a new location fix into the session.
    pub fn update_position(&self, position: PlayerPosition) -> PlayerPosition {
        self.positions.set(position)
    }

    pub fn is_ready(&self) -> bool {
        self.gate.is_initialization_complete()
    }

    /// Wait until every required gate has passed.
    pub async fn wait_ready(&self) {
        self.gate.wait_all_passed().await;
    }

    /// Required gates whose last request failed.
    ///
    /// Until such a gate is requested again or times out,
    /// [`wait_ready`](Self::wait_ready) does not return.
    pub fn failed_gates(&self) -> Vec<GateSnapshot> {
        self.gate
            .snapshot()
            .into_iter()
            .filter(|gate| gate.required && gate.state == GateState::Failed)
            .collect()
    }

    /// Subscribe to events from a specific topic
    ///
    /// # Topics
    ///
    /// - `Topic::Gate` - Gate transitions and completion
    /// - `Topic::Position` - Player position updates
    /// - `Topic::Proximity` - Proximity firings and handler failures
    /// - `Topic::Dialog` - Dialog opened, closed or rejected
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use runtime::Topic;
    ///
    /// let mut gate_rx = handle.subscribe(Topic::Gate);
    /// while let Ok(event) = gate_rx.recv().await {
    ///     // Render the gate step
    /// }
    /// ```
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.event_bus.subscribe(topic)
    }

    /// Subscribe to multiple topics at once
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        self.event_bus.subscribe_multiple(topics)
    }
}
