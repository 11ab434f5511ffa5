//! Gate checks: the work a gate performs when requested.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use sanctuary_core::{Clock, CoreConfig, PassKind, PlayerPosition};

use crate::api::{ChoiceProvider, GateCheckError, GeolocationError, GeolocationProvider};
use crate::position::PositionStore;
use crate::readiness::Readiness;
use crate::repository::{
    KeyValueStore, PermissionRecord, PermissionStatus, PlayerChoice, PlayerChoiceRecord,
    RecordStore, StorageKey,
};

/// Successful result of a [`GateCheck`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CheckOutcome {
    pub kind: PassKind,
    pub message: String,
}

impl CheckOutcome {
    pub fn granted(message: impl Into<String>) -> Self {
        Self {
            kind: PassKind::Granted,
            message: message.into(),
        }
    }

    pub fn degraded(message: impl Into<String>) -> Self {
        Self {
            kind: PassKind::Degraded,
            message: message.into(),
        }
    }
}

/// Work performed when a gate is requested.
#[async_trait]
pub trait GateCheck: Send + Sync {
    async fn check(&self) -> Result<CheckOutcome, GateCheckError>;

    /// Forgets cached decisions. Called when the gate is reset.
    fn reset(&self) {}
}

// ============================================================================
// Location permission
// ============================================================================

/// Obtains GPS permission and a first fix.
///
/// Stored decisions are trusted only while younger than the freshness window.
/// A fresh `granted` skips the prompt and only fetches a position; a fresh
/// `denied` passes the gate degraded without prompting. Older decisions are
/// asked again.
pub struct LocationPermissionCheck {
    geolocation: Arc<dyn GeolocationProvider>,
    storage: Arc<dyn KeyValueStore>,
    positions: PositionStore,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
    timeout: Duration,
}

impl LocationPermissionCheck {
    pub fn new(
        geolocation: Arc<dyn GeolocationProvider>,
        storage: Arc<dyn KeyValueStore>,
        positions: PositionStore,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            geolocation,
            storage,
            positions,
            clock,
            config,
            timeout,
        }
    }

    async fn locate(&self) -> Result<PlayerPosition, GeolocationError> {
        tokio::time::timeout(self.timeout, self.geolocation.request_position())
            .await
            .unwrap_or(Err(GeolocationError::Timeout))
    }

    fn stored_permission(&self) -> Option<PermissionRecord> {
        match self.storage.load_record(StorageKey::GpsPermissionStatus) {
            Ok(record) => record,
            Err(e) => {
                tracing::warn!("Failed to read stored GPS permission: {}", e);
                None
            }
        }
    }

    fn remember(&self, status: PermissionStatus) {
        let record = PermissionRecord {
            status,
            timestamp: self.clock.now_ms(),
        };
        if let Err(e) = self
            .storage
            .save_record(StorageKey::GpsPermissionStatus, &record)
        {
            tracing::warn!("Failed to store GPS permission: {}", e);
        }
    }
}

#[async_trait]
impl GateCheck for LocationPermissionCheck {
    async fn check(&self) -> Result<CheckOutcome, GateCheckError> {
        let now = self.clock.now_ms();

        let stored = self
            .stored_permission()
            .filter(|record| self.config.is_fresh(record.timestamp, now));

        match stored {
            Some(record) if record.status == PermissionStatus::Granted => {
                return match self.locate().await {
                    Ok(position) => {
                        self.positions.set(position);
                        Ok(CheckOutcome::granted("GPS permission already granted (stored)"))
                    }
                    Err(e) => {
                        tracing::warn!("Stored GPS permission is granted but no fix: {}", e);
                        Ok(CheckOutcome::granted(
                            "GPS permission granted but position unavailable",
                        ))
                    }
                };
            }
            Some(record) if record.status == PermissionStatus::Denied => {
                tracing::info!("GPS permission previously denied; continuing without it");
                return Ok(CheckOutcome::degraded("GPS permission denied"));
            }
            _ => {}
        }

        match self.locate().await {
            Ok(position) => {
                self.remember(PermissionStatus::Granted);
                self.positions.set(position);
                Ok(CheckOutcome::granted("GPS permission granted"))
            }
            Err(GeolocationError::PermissionDenied) => {
                self.remember(PermissionStatus::Denied);
                Err(GateCheckError::from_geolocation(
                    GeolocationError::PermissionDenied,
                    self.timeout,
                ))
            }
            Err(e) => Err(GateCheckError::from_geolocation(e, self.timeout)),
        }
    }

    fn reset(&self) {
        if let Err(e) = self.storage.remove_record(StorageKey::GpsPermissionStatus) {
            tracing::warn!("Failed to clear stored GPS permission: {}", e);
        }
    }
}

// ============================================================================
// Player choice
// ============================================================================

/// Asks whether to continue the saved adventure or start a new one.
///
/// Continuing requires a stored player id; without one the choice is
/// downgraded to [`PlayerChoice::New`]. Starting over removes the stored id.
pub struct PlayerChoiceCheck {
    chooser: Arc<dyn ChoiceProvider>,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
}

impl PlayerChoiceCheck {
    pub fn new(
        chooser: Arc<dyn ChoiceProvider>,
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            chooser,
            storage,
            clock,
        }
    }

    fn has_saved_player(&self) -> bool {
        self.storage
            .contains(StorageKey::PlayerId.as_ref())
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to read saved player: {}", e);
                false
            })
    }
}

#[async_trait]
impl GateCheck for PlayerChoiceCheck {
    async fn check(&self) -> Result<CheckOutcome, GateCheckError> {
        let can_continue = self.has_saved_player();
        let mut choice = self.chooser.choose(can_continue).await?;

        if choice == PlayerChoice::Continue && !can_continue {
            tracing::info!("No saved player to continue; starting a new adventure");
            choice = PlayerChoice::New;
        }

        if choice == PlayerChoice::New
            && let Err(e) = self.storage.remove_record(StorageKey::PlayerId)
        {
            tracing::warn!("Failed to clear saved player: {}", e);
        }

        let record = PlayerChoiceRecord {
            choice,
            timestamp: self.clock.now_ms(),
        };
        if let Err(e) = self.storage.save_record(StorageKey::PlayerChoice, &record) {
            tracing::warn!("Failed to store player choice: {}", e);
        }

        Ok(CheckOutcome::granted(format!(
            "Player chose: {}",
            choice.label()
        )))
    }
}

// ============================================================================
// Readiness
// ============================================================================

/// Passes once an external [`Readiness`] signal resolves.
pub struct ReadinessCheck {
    readiness: Readiness,
    message: String,
}

impl ReadinessCheck {
    pub fn new(readiness: Readiness, message: impl Into<String>) -> Self {
        Self {
            readiness,
            message: message.into(),
        }
    }
}

#[async_trait]
impl GateCheck for ReadinessCheck {
    async fn check(&self) -> Result<CheckOutcome, GateCheckError> {
        self.readiness.wait().await;
        Ok(CheckOutcome::granted(self.message.clone()))
    }
}
