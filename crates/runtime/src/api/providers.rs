//! Provider traits supplied by the embedding client.
//!
//! The runtime never talks to a platform directly. Location fixes and the
//! player's continue/new decision come from implementations of these traits.
use async_trait::async_trait;

use sanctuary_core::PlayerPosition;

use super::errors::{GateCheckError, GeolocationError};
use crate::repository::PlayerChoice;

/// Source of location fixes.
///
/// Implementations may block for as long as the platform does; the caller
/// bounds every request with its own timeout.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn request_position(&self) -> Result<PlayerPosition, GeolocationError>;
}

/// Asks the player whether to continue a saved adventure or start over.
#[async_trait]
pub trait ChoiceProvider: Send + Sync {
    /// `can_continue` is false when no saved player exists; implementations
    /// should then only offer [`PlayerChoice::New`].
    async fn choose(&self, can_continue: bool) -> Result<PlayerChoice, GateCheckError>;
}

/// Geolocation provider that always answers with the same outcome.
///
/// Useful for tests, demos and desktop hosts without a location service.
#[derive(Clone, Debug)]
pub struct FixedGeolocation {
    outcome: Result<PlayerPosition, GeolocationError>,
}

impl FixedGeolocation {
    pub fn new(position: PlayerPosition) -> Self {
        Self {
            outcome: Ok(position),
        }
    }

    pub fn failing(error: GeolocationError) -> Self {
        Self { outcome: Err(error) }
    }
}

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn request_position(&self) -> Result<PlayerPosition, GeolocationError> {
        self.outcome.clone()
    }
}

/// Choice provider with a predetermined answer.
#[derive(Clone, Copy, Debug)]
pub struct FixedChoice(pub PlayerChoice);

#[async_trait]
impl ChoiceProvider for FixedChoice {
    async fn choose(&self, _can_continue: bool) -> Result<PlayerChoice, GateCheckError> {
        Ok(self.0)
    }
}
