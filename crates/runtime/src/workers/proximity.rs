use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, broadcast};
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use sanctuary_core::{Clock, ProximityEngine, ProximityHandler, ProximityTarget, TickReport};

use crate::api::Result;
use crate::dialog::DialogPresenter;
use crate::events::{Event, EventBus, PositionEvent, ProximityEvent, Topic};
use crate::position::PositionStore;

/// Drives the [`ProximityEngine`] against the shared player position.
///
/// Ticks are serialized by an async mutex, so a periodic tick and a
/// position-triggered tick never evaluate targets concurrently.
#[derive(Clone)]
pub struct ProximityMonitor {
    engine: Arc<Mutex<ProximityEngine>>,
    positions: PositionStore,
    presenter: DialogPresenter,
    clock: Arc<dyn Clock>,
    events: EventBus,
}

impl ProximityMonitor {
    pub fn new(
        positions: PositionStore,
        presenter: DialogPresenter,
        clock: Arc<dyn Clock>,
        events: EventBus,
    ) -> Self {
        Self {
            engine: Arc::new(Mutex::new(ProximityEngine::new())),
            positions,
            presenter,
            clock,
            events,
        }
    }

    pub async fn add_target(
        &self,
        target: ProximityTarget,
        handler: impl ProximityHandler + 'static,
    ) -> Result<()> {
        let id = target.id.clone();
        self.engine.lock().await.add_target(target, handler)?;
        debug!("Proximity target {} registered", id);
        Ok(())
    }

    pub async fn deactivate(&self, id: &str) -> Result<()> {
        self.engine.lock().await.deactivate(id)?;
        Ok(())
    }

    pub async fn activate(&self, id: &str) -> Result<()> {
        self.engine.lock().await.activate(id)?;
        Ok(())
    }

    /// Clears every cooldown, typically when the player starts a new adventure.
    pub async fn reset_cooldowns(&self) {
        self.engine.lock().await.reset_cooldowns();
    }

    pub async fn targets(&self) -> Vec<ProximityTarget> {
        self.engine.lock().await.targets().cloned().collect()
    }

    /// Evaluates every target once against the current position.
    ///
    /// Returns `None` when no position is known yet.
    pub async fn tick_now(&self) -> Option<TickReport> {
        let mut engine = self.engine.lock().await;

        let Some(position) = self.positions.get() else {
            debug!("Skipping proximity tick: no player position");
            return None;
        };

        let report = engine.tick(&position, self.clock.now_ms(), &self.presenter);
        drop(engine);

        self.publish(&report);
        Some(report)
    }

    /// Ticks every `every` and after each position update until aborted.
    pub async fn run(self, every: Duration) {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut positions = self.events.subscribe(Topic::Position);

        info!("Proximity monitor started (every {:?})", every);

        loop {
            tokio::select! {
                _ = interval.tick() => {}
                update = positions.recv() => match update {
                    Ok(Event::Position(PositionEvent::Updated(_))) => {}
                    Ok(_) => continue,
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        debug!("Proximity monitor skipped {} position updates", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        info!("Event bus closed, stopping proximity monitor");
                        break;
                    }
                },
            }

            self.tick_now().await;
        }
    }

    /// Spawns [`run`](Self::run) on the current Tokio runtime.
    pub fn spawn(&self, every: Duration) -> JoinHandle<()> {
        tokio::spawn(self.clone().run(every))
    }

    fn publish(&self, report: &TickReport) {
        for hit in &report.fired {
            info!("Proximity triggered: {} ({:.1} m)", hit.target_id, hit.distance_m);
            self.events.publish(ProximityEvent::Triggered(hit.clone()));
        }
        for (hit, error) in &report.failed {
            warn!("Proximity handler for {} failed: {}", hit.target_id, error);
            self.events.publish(ProximityEvent::HandlerFailed {
                hit: hit.clone(),
                error: error.to_string(),
            });
        }
        for target_id in &report.suppressed {
            debug!("Proximity {} held back by open dialog", target_id);
            self.events.publish(ProximityEvent::Suppressed {
                target_id: target_id.clone(),
            });
        }
        for target_id in &report.invalid {
            warn!("Skipping proximity target {} with invalid data", target_id);
            self.events.publish(ProximityEvent::InvalidTarget {
                target_id: target_id.clone(),
            });
        }
        for target_id in &report.left {
            self.events.publish(ProximityEvent::Left {
                target_id: target_id.clone(),
            });
        }
    }
}
