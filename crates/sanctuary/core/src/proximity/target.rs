use crate::geo::GeoPoint;

use super::HandlerError;

/// A point of interest with a trigger radius and cooldown.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProximityTarget {
    pub id: String,
    pub location: GeoPoint,
    pub trigger_radius_m: f64,
    pub cooldown_ms: u64,
    /// Unix milliseconds of the last firing, if any.
    pub last_triggered_at: Option<u64>,
    /// Inactive targets are kept but never evaluated.
    pub active: bool,
    /// Whether the player was inside the radius at the previous tick.
    pub inside: bool,
}

impl ProximityTarget {
    pub fn new(
        id: impl Into<String>,
        location: GeoPoint,
        trigger_radius_m: f64,
        cooldown_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            location,
            trigger_radius_m,
            cooldown_ms,
            last_triggered_at: None,
            active: true,
            inside: false,
        }
    }

    /// True when the target may fire at `now_ms`.
    pub fn cooldown_elapsed(&self, now_ms: u64) -> bool {
        match self.last_triggered_at {
            None => true,
            Some(last) => now_ms.saturating_sub(last) >= self.cooldown_ms,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.location.is_valid()
            && self.trigger_radius_m.is_finite()
            && self.trigger_radius_m >= 0.0
    }
}

/// Payload passed to a handler when the player is within a target's radius.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProximityHit {
    pub target_id: String,
    pub distance_m: f64,
}

/// Reaction to a target firing.
pub trait ProximityHandler: Send {
    fn handle(&mut self, hit: &ProximityHit) -> Result<(), HandlerError>;
}

impl<F> ProximityHandler for F
where
    F: FnMut(&ProximityHit) -> Result<(), HandlerError> + Send,
{
    fn handle(&mut self, hit: &ProximityHit) -> Result<(), HandlerError> {
        self(hit)
    }
}
