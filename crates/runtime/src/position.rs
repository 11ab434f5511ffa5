//! Shared store for the player's last known position.
//!
//! The in-memory value is authoritative while the session runs. Every update
//! is persisted under [`StorageKey::PlayerPosition`] so a restart within the
//! freshness window can resume from the last fix.

use std::sync::{Arc, RwLock};

use sanctuary_core::{Clock, CoreConfig, PlayerPosition};

use crate::events::{EventBus, PositionEvent};
use crate::map::{IconSpec, MapAdapter, PLAYER_MARKER_ID};
use crate::repository::{KeyValueStore, RecordStore, StorageKey};
use crate::utils::{read, write};

/// Cloneable handle to the single player position.
///
/// Storage failures are logged and never surface to callers; the in-memory
/// value keeps working when durable storage is unavailable.
#[derive(Clone)]
pub struct PositionStore {
    inner: Arc<Inner>,
}

struct Inner {
    current: RwLock<Option<PlayerPosition>>,
    storage: Arc<dyn KeyValueStore>,
    clock: Arc<dyn Clock>,
    config: CoreConfig,
    events: EventBus,
    map: Option<Arc<dyn MapAdapter>>,
}

impl PositionStore {
    pub fn new(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
        events: EventBus,
    ) -> Self {
        Self::build(storage, clock, config, events, None)
    }

    /// Like [`PositionStore::new`], additionally mirroring the position as the
    /// player marker on `map`.
    pub fn with_map(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
        events: EventBus,
        map: Arc<dyn MapAdapter>,
    ) -> Self {
        Self::build(storage, clock, config, events, Some(map))
    }

    fn build(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<dyn Clock>,
        config: CoreConfig,
        events: EventBus,
        map: Option<Arc<dyn MapAdapter>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                current: RwLock::new(None),
                storage,
                clock,
                config,
                events,
                map,
            }),
        }
    }

    /// Replaces the current position, stamping it with the current time.
    ///
    /// Returns the stored value.
    pub fn set(&self, position: PlayerPosition) -> PlayerPosition {
        let position = position.stamped(self.inner.clock.now_ms());
        *write(&self.inner.current) = Some(position);

        if let Err(e) = self
            .inner
            .storage
            .save_record(StorageKey::PlayerPosition, &position)
        {
            tracing::warn!("Failed to persist player position: {}", e);
        }

        if let Some(map) = &self.inner.map {
            map.add_marker(PLAYER_MARKER_ID, position.point(), &IconSpec::Player);
        }

        tracing::debug!(
            "Player position updated: ({:.6}, {:.6}) ±{:.0}m",
            position.lat,
            position.lng,
            position.accuracy
        );
        self.inner.events.publish(PositionEvent::Updated(position));
        position
    }

    /// Current position.
    ///
    /// Falls back to the persisted record when nothing is held in memory, and
    /// only if that record is younger than the freshness window.
    pub fn get(&self) -> Option<PlayerPosition> {
        if let Some(position) = *read(&self.inner.current) {
            return Some(position);
        }

        let stored = match self
            .inner
            .storage
            .load_record::<PlayerPosition>(StorageKey::PlayerPosition)
        {
            Ok(stored) => stored?,
            Err(e) => {
                tracing::warn!("Failed to load stored player position: {}", e);
                return None;
            }
        };

        let now = self.inner.clock.now_ms();
        if !self.inner.config.is_fresh(stored.timestamp, now) {
            tracing::debug!(
                "Ignoring stale stored position ({} ms old)",
                now.saturating_sub(stored.timestamp)
            );
            return None;
        }

        let mut current = write(&self.inner.current);
        // A concurrent set wins over the rehydrated value.
        Some(*current.get_or_insert(stored))
    }

    /// Forgets the position in memory and in storage.
    pub fn clear(&self) {
        *write(&self.inner.current) = None;

        if let Err(e) = self.inner.storage.remove_record(StorageKey::PlayerPosition) {
            tracing::warn!("Failed to remove stored player position: {}", e);
        }

        if let Some(map) = &self.inner.map {
            map.remove_marker(PLAYER_MARKER_ID);
        }

        self.inner.events.publish(PositionEvent::Cleared);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{MapPrimitive, MarkerLayer};
    use crate::repository::InMemoryKeyValueStore;
    use sanctuary_core::{GeoPoint, ManualClock};

    const HOUR_MS: u64 = 60 * 60 * 1000;

    fn store_with(
        storage: Arc<dyn KeyValueStore>,
        clock: Arc<ManualClock>,
    ) -> PositionStore {
        PositionStore::new(storage, clock, CoreConfig::default(), EventBus::new())
    }

    #[test]
    fn test_set_stamps_and_returns() {
        let clock = Arc::new(ManualClock::new(5_000));
        let store = store_with(Arc::new(InMemoryKeyValueStore::new()), clock);

        let stored = store.set(PlayerPosition::new(61.5, 23.7, 10.0, 0));

        assert_eq!(stored.timestamp, 5_000);
        assert_eq!(store.get(), Some(stored));
    }

    #[test]
    fn test_clear_removes_memory_and_storage() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::new(0));
        let store = store_with(storage.clone(), clock);

        store.set(PlayerPosition::new(1.0, 2.0, 3.0, 0));
        store.clear();

        assert_eq!(store.get(), None);
        assert_eq!(storage.get("player_position").unwrap(), None);
    }

    #[test]
    fn test_storage_failure_keeps_memory_value() {
        let clock = Arc::new(ManualClock::new(0));
        let store = store_with(Arc::new(InMemoryKeyValueStore::unavailable()), clock);

        assert_eq!(store.get(), None);
        let stored = store.set(PlayerPosition::new(1.0, 2.0, 3.0, 0));
        assert_eq!(store.get(), Some(stored));
        store.clear();
        assert_eq!(store.get(), None);
    }

    #[test]
    fn test_rehydrates_only_fresh_records() {
        let storage: Arc<dyn KeyValueStore> = Arc::new(InMemoryKeyValueStore::new());
        let clock = Arc::new(ManualClock::new(1_000));
        store_with(storage.clone(), clock.clone()).set(PlayerPosition::new(1.0, 2.0, 3.0, 0));

        clock.advance(HOUR_MS);
        let restarted = store_with(storage.clone(), clock.clone());
        assert_eq!(restarted.get().map(|p| p.timestamp), Some(1_000));

        clock.advance(25 * HOUR_MS);
        let restarted = store_with(storage, clock);
        assert_eq!(restarted.get(), None);
    }

    #[test]
    fn test_player_marker_follows_position() {
        let layer = Arc::new(MarkerLayer::new());
        let store = PositionStore::with_map(
            Arc::new(InMemoryKeyValueStore::new()),
            Arc::new(ManualClock::new(0)),
            CoreConfig::default(),
            EventBus::new(),
            layer.clone(),
        );

        store.set(PlayerPosition::new(1.0, 2.0, 3.0, 0));
        assert_eq!(
            layer.get(PLAYER_MARKER_ID),
            Some(MapPrimitive::Marker {
                at: GeoPoint::new(1.0, 2.0),
                icon: IconSpec::Player
            })
        );

        store.clear();
        assert!(layer.is_empty());
    }
}
