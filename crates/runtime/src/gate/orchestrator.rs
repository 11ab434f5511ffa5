use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use sanctuary_core::{
    GateError, GateName, GateSet, GateSnapshot, GateSpec, GateTransition, PassKind, Registration,
    RequestTicket,
};

use super::checks::GateCheck;
use crate::api::{Result, RuntimeError};
use crate::events::{EventBus, GateEvent, Topic};
use crate::readiness::Readiness;
use crate::utils::lock;

type CompletionCallback = Box<dyn FnOnce() + Send>;

/// Cloneable handle to the session's startup gates.
///
/// All clones share one [`GateSet`]. Gate checks run on the caller's task;
/// timeouts run on spawned tasks that hold only a weak reference, so dropping
/// the last handle cancels them.
#[derive(Clone)]
pub struct PermissionGate {
    inner: Arc<Inner>,
}

struct Inner {
    gates: Mutex<GateSet>,
    checks: Mutex<HashMap<GateName, Arc<dyn GateCheck>>>,
    timers: Mutex<HashMap<GateName, JoinHandle<()>>>,
    callbacks: Mutex<Vec<CompletionCallback>>,
    completed: Readiness,
    events: EventBus,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let timers = self.timers.get_mut().unwrap_or_else(PoisonError::into_inner);
        for (_, timer) in timers.drain() {
            timer.abort();
        }
    }
}

impl PermissionGate {
    pub fn new(events: EventBus) -> Self {
        Self {
            inner: Arc::new(Inner {
                gates: Mutex::new(GateSet::new()),
                checks: Mutex::new(HashMap::new()),
                timers: Mutex::new(HashMap::new()),
                callbacks: Mutex::new(Vec::new()),
                completed: Readiness::new(),
                events,
            }),
        }
    }

    /// Registers a gate and arms its timeout, if any.
    ///
    /// Registering a name twice keeps the first gate untouched. The timeout
    /// needs a Tokio runtime; outside one the gate simply never times out.
    pub fn register_gate(&self, name: GateName, spec: GateSpec) -> Registration {
        let registration = lock(&self.inner.gates).register(name, spec);

        match registration {
            Registration::Added => {
                tracing::debug!("Registered gate {} ({:?})", name, spec.flags);
                if let Some(timeout) = spec.timeout {
                    self.arm_timer(name, timeout);
                }
            }
            Registration::AlreadyRegistered => {
                tracing::debug!("Gate {} already registered; keeping the existing gate", name);
            }
        }

        registration
    }

    /// Registers a gate together with the check [`request_gate`](Self::request_gate) runs.
    pub fn register_gate_with_check(
        &self,
        name: GateName,
        spec: GateSpec,
        check: impl GateCheck + 'static,
    ) -> Registration {
        let registration = self.register_gate(name, spec);
        if registration == Registration::Added {
            self.set_check(name, Arc::new(check));
        }
        registration
    }

    /// Installs or replaces the check of a gate.
    pub fn set_check(&self, name: GateName, check: Arc<dyn GateCheck>) {
        lock(&self.inner.checks).insert(name, check);
    }

    /// Runs the gate's check and records the outcome.
    ///
    /// A request for a gate that already passed, or whose check is still
    /// running, is a no-op. Check failures do not surface here: they mark
    /// the gate failed (or degraded) and are published on [`Topic::Gate`].
    ///
    /// Dropping the returned future before the check finishes marks the gate
    /// failed, so it can be requested again.
    pub async fn request_gate(&self, name: GateName) -> Result<()> {
        let check = lock(&self.inner.checks).get(&name).cloned();
        let Some(check) = check else {
            let known = lock(&self.inner.gates).contains(name);
            return Err(if known {
                RuntimeError::MissingGateCheck(name)
            } else {
                GateError::UnknownGate(name).into()
            });
        };

        let begun = lock(&self.inner.gates).begin_request(name);
        let ticket = match begun {
            Ok((ticket, transition)) => {
                self.apply(transition);
                ticket
            }
            Err(GateError::RequestInFlight(_)) => {
                tracing::debug!("Gate {} already has a request in flight", name);
                return Ok(());
            }
            Err(GateError::AlreadyPassed(_)) => {
                tracing::debug!("Gate {} already passed", name);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };

        tracing::info!("Requesting gate {}", name);
        let mut in_flight = InFlight {
            gate: self,
            ticket: Some(ticket),
        };
        let result = check.check().await;
        in_flight.disarm();

        match result {
            Ok(outcome) => {
                let passed = lock(&self.inner.gates).complete_request(
                    ticket,
                    outcome.kind,
                    outcome.message,
                )?;
                match passed {
                    Some(transition) => self.apply(transition),
                    None => tracing::debug!("Gate {} settled while its check was running", name),
                }
            }
            Err(e) => {
                tracing::warn!("Gate {} check failed: {}", name, e);
                let transitions = lock(&self.inner.gates).fail_request(ticket, e.to_string())?;
                for transition in transitions {
                    self.apply(transition);
                }
            }
        }

        Ok(())
    }

    /// Passes a gate directly, bypassing its check.
    ///
    /// Returns `false` if the gate had already passed.
    pub fn pass_gate(
        &self,
        name: GateName,
        kind: PassKind,
        message: impl Into<String>,
    ) -> Result<bool> {
        let passed = lock(&self.inner.gates).pass(name, kind, message)?;
        Ok(match passed {
            Some(transition) => {
                self.apply(transition);
                true
            }
            None => false,
        })
    }

    /// Forces a `required && blocking` gate open with [`PassKind::Skipped`].
    ///
    /// Called by the gate's own timer; returns `false` when the gate is not
    /// eligible or already passed.
    pub fn force_timeout_pass(&self, name: GateName) -> bool {
        let forced = lock(&self.inner.gates).force_timeout_pass(name);
        match forced {
            Some(transition) => {
                tracing::warn!("Gate {} timed out; continuing without it", name);
                self.apply(transition);
                true
            }
            None => false,
        }
    }

    /// Returns a gate to pending, forgets its check's cached state and re-arms
    /// its timeout.
    ///
    /// Fails with [`GateError::RequestInFlight`] while the gate's check is
    /// running.
    ///
    /// Completion is not re-armed: once initialization completed it stays
    /// complete for the session.
    pub fn reset_gate(&self, name: GateName) -> Result<()> {
        let transition = lock(&self.inner.gates).reset(name)?;
        self.cancel_timer(name);

        let check = lock(&self.inner.checks).get(&name).cloned();
        if let Some(check) = check {
            check.reset();
        }

        tracing::info!("Gate {} reset", name);
        self.apply(transition);

        let timeout = lock(&self.inner.gates)
            .get(name)
            .and_then(|gate| gate.spec.timeout);
        if let Some(timeout) = timeout {
            self.arm_timer(name, timeout);
        }

        Ok(())
    }

    pub fn all_gates_passed(&self) -> bool {
        lock(&self.inner.gates).all_gates_passed()
    }

    pub fn is_initialization_complete(&self) -> bool {
        lock(&self.inner.gates).is_initialization_complete()
    }

    /// Runs `callback` once initialization completes.
    ///
    /// Callbacks run in registration order on the task that completed the
    /// last gate. Registering after completion runs the callback immediately.
    pub fn on_all_gates_passed(&self, callback: impl FnOnce() + Send + 'static) {
        let mut callbacks = lock(&self.inner.callbacks);
        if !self.is_initialization_complete() {
            callbacks.push(Box::new(callback));
            return;
        }
        drop(callbacks);
        callback();
    }

    /// Waits until initialization completes.
    pub async fn wait_all_passed(&self) {
        self.inner.completed.wait().await;
    }

    /// Waits until a single gate has passed.
    pub async fn wait_passed(&self, name: GateName) -> Result<()> {
        let mut rx = self.inner.events.subscribe(Topic::Gate);

        loop {
            let passed = self
                .status(name)
                .ok_or(GateError::UnknownGate(name))?
                .state
                .is_passed();
            if passed {
                return Ok(());
            }

            if let Err(RecvError::Closed) = rx.recv().await {
                return Ok(());
            }
        }
    }

    pub fn status(&self, name: GateName) -> Option<GateSnapshot> {
        lock(&self.inner.gates).get(name).map(|gate| gate.snapshot())
    }

    /// Every gate in registration order.
    pub fn snapshot(&self) -> Vec<GateSnapshot> {
        lock(&self.inner.gates).snapshot()
    }

    /// Stops every pending timeout.
    pub fn cancel_timers(&self) {
        for (_, timer) in lock(&self.inner.timers).drain() {
            timer.abort();
        }
    }

    fn apply(&self, transition: GateTransition) {
        let passed = matches!(transition, GateTransition::Passed { .. });
        if passed {
            self.cancel_timer(transition.gate());
        }

        self.inner.events.publish(GateEvent::from(transition));

        if passed {
            self.maybe_complete();
        }
    }

    fn maybe_complete(&self) {
        if !lock(&self.inner.gates).try_complete() {
            return;
        }

        tracing::info!("All required gates passed; initialization complete");
        self.inner.completed.resolve();
        self.inner.events.publish(GateEvent::AllPassed);

        let callbacks = std::mem::take(&mut *lock(&self.inner.callbacks));
        for callback in callbacks {
            callback();
        }
    }

    fn arm_timer(&self, name: GateName, timeout: Duration) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime; timeout of gate {} not armed", name);
            return;
        };

        let gate = Arc::downgrade(&self.inner);
        let timer = runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = gate.upgrade() {
                PermissionGate { inner }.force_timeout_pass(name);
            }
        });

        if let Some(previous) = lock(&self.inner.timers).insert(name, timer) {
            previous.abort();
        }
    }

    fn cancel_timer(&self, name: GateName) {
        let timer = lock(&self.inner.timers).remove(&name);
        if let Some(timer) = timer {
            timer.abort();
        }
    }
}

/// Abandons an outstanding request when the future running its check is
/// dropped early.
struct InFlight<'a> {
    gate: &'a PermissionGate,
    ticket: Option<RequestTicket>,
}

impl InFlight<'_> {
    fn disarm(&mut self) {
        self.ticket = None;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };

        let aborted = lock(&self.gate.inner.gates).abort_request(ticket);
        if let Some(transition) = aborted {
            tracing::warn!("Request for gate {} cancelled before its check finished", ticket.gate());
            self.gate.apply(transition);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::GateCheckError;
    use crate::events::Event;
    use crate::gate::CheckOutcome;
    use async_trait::async_trait;
    use sanctuary_core::GateState;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Scripted(std::result::Result<CheckOutcome, GateCheckError>);

    #[async_trait]
    impl GateCheck for Scripted {
        async fn check(&self) -> std::result::Result<CheckOutcome, GateCheckError> {
            self.0.clone()
        }
    }

    fn granted() -> Scripted {
        Scripted(Ok(CheckOutcome::granted("ok")))
    }

    fn denied() -> Scripted {
        Scripted(Err(GateCheckError::PermissionDenied("no".to_string())))
    }

    #[tokio::test]
    async fn test_request_passes_and_completes_once() {
        let gate = PermissionGate::new(EventBus::new());
        gate.register_gate_with_check(GateName::LocationPermission, GateSpec::required(), granted());
        gate.register_gate_with_check(GateName::PlayerChoice, GateSpec::required(), granted());

        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        gate.on_all_gates_passed(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        gate.request_gate(GateName::LocationPermission).await.unwrap();
        assert!(!gate.is_initialization_complete());

        gate.request_gate(GateName::PlayerChoice).await.unwrap();
        gate.request_gate(GateName::PlayerChoice).await.unwrap();
        assert!(gate.is_initialization_complete());
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        let late = fired.clone();
        gate.on_all_gates_passed(move || {
            late.fetch_add(10, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 11);
    }

    #[tokio::test]
    async fn test_failure_marks_gate_failed_and_allows_retry() {
        let gate = PermissionGate::new(EventBus::new());
        gate.register_gate_with_check(GateName::PlayerChoice, GateSpec::required(), denied());

        gate.request_gate(GateName::PlayerChoice).await.unwrap();
        assert_eq!(gate.status(GateName::PlayerChoice).unwrap().state, GateState::Failed);

        gate.set_check(GateName::PlayerChoice, Arc::new(granted()));
        gate.request_gate(GateName::PlayerChoice).await.unwrap();
        assert!(gate.all_gates_passed());
    }

    #[tokio::test]
    async fn test_degrading_gate_passes_on_failure() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe(Topic::Gate);
        let gate = PermissionGate::new(bus);
        gate.register_gate_with_check(
            GateName::LocationPermission,
            GateSpec::required().degrade_on_failure(),
            denied(),
        );

        gate.request_gate(GateName::LocationPermission).await.unwrap();

        let snapshot = gate.status(GateName::LocationPermission).unwrap();
        assert_eq!(snapshot.state, GateState::Passed(PassKind::Degraded));
        assert!(gate.is_initialization_complete());

        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        assert!(matches!(events[0], Event::Gate(GateEvent::Requesting { .. })));
        assert!(matches!(events[1], Event::Gate(GateEvent::Failed { .. })));
        assert!(matches!(
            events[2],
            Event::Gate(GateEvent::Passed {
                kind: PassKind::Degraded,
                ..
            })
        ));
        assert_eq!(events[3], Event::Gate(GateEvent::AllPassed));
    }

    #[tokio::test]
    async fn test_request_errors() {
        let gate = PermissionGate::new(EventBus::new());
        assert!(matches!(
            gate.request_gate(GateName::MapReady).await,
            Err(RuntimeError::Gate(GateError::UnknownGate(GateName::MapReady)))
        ));

        gate.register_gate(GateName::MapReady, GateSpec::optional());
        assert!(matches!(
            gate.request_gate(GateName::MapReady).await,
            Err(RuntimeError::MissingGateCheck(GateName::MapReady))
        ));
        assert_eq!(gate.status(GateName::MapReady).unwrap().state, GateState::Pending);
    }

    #[tokio::test]
    async fn test_reregistration_keeps_existing_gate() {
        let gate = PermissionGate::new(EventBus::new());
        gate.register_gate(GateName::PlayerChoice, GateSpec::required());
        gate.pass_gate(GateName::PlayerChoice, PassKind::Granted, "done").unwrap();

        let again = gate.register_gate(GateName::PlayerChoice, GateSpec::optional());

        assert_eq!(again, Registration::AlreadyRegistered);
        let snapshot = gate.status(GateName::PlayerChoice).unwrap();
        assert!(snapshot.required);
        assert!(snapshot.state.is_passed());
    }

    #[tokio::test]
    async fn test_optional_gate_never_blocks() {
        let gate = PermissionGate::new(EventBus::new());
        gate.register_gate(GateName::LocationPermission, GateSpec::required());
        gate.register_gate(GateName::MapReady, GateSpec::optional());

        gate.pass_gate(GateName::LocationPermission, PassKind::Granted, "ok")
            .unwrap();

        assert!(gate.all_gates_passed());
        assert!(!gate.force_timeout_pass(GateName::MapReady));
    }

    #[tokio::test]
    async fn test_reset_returns_gate_to_pending_without_rearming_completion() {
        let gate = PermissionGate::new(EventBus::new());
        gate.register_gate_with_check(GateName::PlayerChoice, GateSpec::required(), granted());
        gate.request_gate(GateName::PlayerChoice).await.unwrap();

        gate.reset_gate(GateName::PlayerChoice).unwrap();

        assert_eq!(gate.status(GateName::PlayerChoice).unwrap().state, GateState::Pending);
        assert!(!gate.all_gates_passed());
        assert!(gate.is_initialization_complete());
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_passed_returns_once_gate_passes() {
        let gate = PermissionGate::new(EventBus::new());
        gate.register_gate(
            GateName::LocationPermission,
            GateSpec::required().with_timeout(Duration::from_secs(10)),
        );

        gate.wait_passed(GateName::LocationPermission).await.unwrap();

        let snapshot = gate.status(GateName::LocationPermission).unwrap();
        assert_eq!(snapshot.state, GateState::Passed(PassKind::Skipped));
        assert_eq!(snapshot.status_message, "Timed out - skipped");
    }
}
