use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::dialog::DialogSlot;
use crate::geo::{PlayerPosition, haversine_distance};

use super::{HandlerError, ProximityError, ProximityHandler, ProximityHit, ProximityTarget};

struct Entry {
    target: ProximityTarget,
    handler: Box<dyn ProximityHandler>,
}

/// What happened during one [`ProximityEngine::tick`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TickReport {
    /// Handlers that ran successfully, in registration order.
    pub fired: Vec<ProximityHit>,
    /// Handlers that returned an error or panicked. Their cooldown still started.
    pub failed: Vec<(ProximityHit, HandlerError)>,
    /// In range and off cooldown, but held back because a dialog was open.
    pub suppressed: Vec<String>,
    /// Targets skipped because their data is invalid.
    pub invalid: Vec<String>,
    /// Targets the player was inside at the previous tick and has now left.
    pub left: Vec<String>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
            && self.failed.is_empty()
            && self.suppressed.is_empty()
            && self.invalid.is_empty()
            && self.left.is_empty()
    }
}

/// Evaluates the player position against registered targets.
#[derive(Default)]
pub struct ProximityEngine {
    entries: Vec<Entry>,
}

impl ProximityEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a target with its handler. Ids must be unique.
    ///
    /// Targets with invalid coordinates are accepted and skipped at tick time.
    pub fn add_target(
        &mut self,
        target: ProximityTarget,
        handler: impl ProximityHandler + 'static,
    ) -> Result<(), ProximityError> {
        if self.target(&target.id).is_some() {
            return Err(ProximityError::DuplicateTarget(target.id));
        }
        self.entries.push(Entry {
            target,
            handler: Box::new(handler),
        });
        Ok(())
    }

    pub fn target(&self, id: &str) -> Option<&ProximityTarget> {
        self.entries
            .iter()
            .map(|e| &e.target)
            .find(|t| t.id == id)
    }

    pub fn targets(&self) -> impl Iterator<Item = &ProximityTarget> {
        self.entries.iter().map(|e| &e.target)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn target_mut(&mut self, id: &str) -> Result<&mut ProximityTarget, ProximityError> {
        self.entries
            .iter_mut()
            .map(|e| &mut e.target)
            .find(|t| t.id == id)
            .ok_or_else(|| ProximityError::UnknownTarget(id.to_string()))
    }

    pub fn deactivate(&mut self, id: &str) -> Result<(), ProximityError> {
        let target = self.target_mut(id)?;
        target.active = false;
        target.inside = false;
        Ok(())
    }

    pub fn activate(&mut self, id: &str) -> Result<(), ProximityError> {
        self.target_mut(id)?.active = true;
        Ok(())
    }

    /// Clears cooldowns, e.g. when a fresh adventure starts.
    pub fn reset_cooldowns(&mut self) {
        for entry in &mut self.entries {
            entry.target.last_triggered_at = None;
        }
    }

    /// Evaluates every active target against `position` at `now_ms`.
    ///
    /// A target fires when the player is within its radius, its cooldown has
    /// elapsed and `dialogs` reports no open dialog. Firing stamps
    /// `last_triggered_at` before the handler runs. The dialog slot is
    /// re-read for every target, so a handler that opens a dialog holds back
    /// the remaining targets of the same tick. A panicking handler is
    /// reported as failed; the remaining targets are still evaluated.
    pub fn tick(
        &mut self,
        position: &PlayerPosition,
        now_ms: u64,
        dialogs: &dyn DialogSlot,
    ) -> TickReport {
        let mut report = TickReport::default();
        let here = position.point();
        if !here.is_valid() {
            return report;
        }

        for entry in &mut self.entries {
            let target = &mut entry.target;
            if !target.active {
                continue;
            }
            if !target.is_valid() {
                report.invalid.push(target.id.clone());
                continue;
            }

            let distance_m = haversine_distance(&here, &target.location);
            if distance_m > target.trigger_radius_m {
                if target.inside {
                    target.inside = false;
                    report.left.push(target.id.clone());
                }
                continue;
            }
            target.inside = true;

            if !target.cooldown_elapsed(now_ms) {
                continue;
            }
            if dialogs.is_open() {
                report.suppressed.push(target.id.clone());
                continue;
            }

            target.last_triggered_at = Some(now_ms);
            let hit = ProximityHit {
                target_id: target.id.clone(),
                distance_m,
            };
            let handler = &mut entry.handler;
            match panic::catch_unwind(AssertUnwindSafe(|| handler.handle(&hit))) {
                Ok(Ok(())) => report.fired.push(hit),
                Ok(Err(e)) => report.failed.push((hit, e)),
                Err(payload) => {
                    let error = HandlerError::new(format!(
                        "handler panicked: {}",
                        panic_message(payload.as_ref())
                    ));
                    report.failed.push((hit, error));
                }
            }
        }

        report
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        *message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

impl std::fmt::Debug for ProximityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProximityEngine")
            .field("targets", &self.entries.iter().map(|e| &e.target).collect::<Vec<_>>())
            .finish()
    }
}
