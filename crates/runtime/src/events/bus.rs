//! Topic-based event bus implementation.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;

use super::types::{DialogEvent, GateEvent, PositionEvent, ProximityEvent};

/// Topics for event routing
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub enum Topic {
    /// Startup gate transitions and completion
    Gate,
    /// Player position updates
    Position,
    /// Proximity firings and failures
    Proximity,
    /// Dialog lifecycle
    Dialog,
}

/// Event wrapper that carries the topic and typed event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    Gate(GateEvent),
    Position(PositionEvent),
    Proximity(ProximityEvent),
    Dialog(DialogEvent),
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::Gate(_) => Topic::Gate,
            Event::Position(_) => Topic::Position,
            Event::Proximity(_) => Topic::Proximity,
            Event::Dialog(_) => Topic::Dialog,
        }
    }
}

struct Channels {
    gate: broadcast::Sender<Event>,
    position: broadcast::Sender<Event>,
    proximity: broadcast::Sender<Event>,
    dialog: broadcast::Sender<Event>,
}

impl Channels {
    fn sender(&self, topic: Topic) -> &broadcast::Sender<Event> {
        match topic {
            Topic::Gate => &self.gate,
            Topic::Position => &self.position,
            Topic::Proximity => &self.proximity,
            Topic::Dialog => &self.dialog,
        }
    }
}

/// Topic-based event bus
///
/// Allows consumers to subscribe to specific topics and only receive
/// events they care about. Publishing never blocks; events published while a
/// topic has no subscribers are dropped.
#[derive(Clone)]
pub struct EventBus {
    channels: Arc<Channels>,
}

impl EventBus {
    /// Creates a new event bus with default capacity for each topic
    pub fn new() -> Self {
        Self::with_capacity(100)
    }

    /// Creates a new event bus with specified capacity per topic
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            channels: Arc::new(Channels {
                gate: broadcast::channel(capacity).0,
                position: broadcast::channel(capacity).0,
                proximity: broadcast::channel(capacity).0,
                dialog: broadcast::channel(capacity).0,
            }),
        }
    }

    /// Publish an event to its corresponding topic
    pub fn publish(&self, event: impl Into<Event>) {
        let event = event.into();
        let topic = event.topic();

        if self.channels.sender(topic).send(event).is_err() {
            // No subscribers for this topic - this is normal, not an error
            tracing::trace!("No subscribers for topic {:?}", topic);
        }
    }

    /// Subscribe to a specific topic
    ///
    /// Returns a receiver that will only receive events for that topic.
    pub fn subscribe(&self, topic: Topic) -> broadcast::Receiver<Event> {
        self.channels.sender(topic).subscribe()
    }

    /// Subscribe to multiple topics
    ///
    /// Returns receivers for each requested topic.
    pub fn subscribe_multiple(
        &self,
        topics: &[Topic],
    ) -> HashMap<Topic, broadcast::Receiver<Event>> {
        topics
            .iter()
            .map(|&topic| (topic, self.subscribe(topic)))
            .collect()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl From<GateEvent> for Event {
    fn from(event: GateEvent) -> Self {
        Event::Gate(event)
    }
}

impl From<PositionEvent> for Event {
    fn from(event: PositionEvent) -> Self {
        Event::Position(event)
    }
}

impl From<ProximityEvent> for Event {
    fn from(event: ProximityEvent) -> Self {
        Event::Proximity(event)
    }
}

impl From<DialogEvent> for Event {
    fn from(event: DialogEvent) -> Self {
        Event::Dialog(event)
    }
}
