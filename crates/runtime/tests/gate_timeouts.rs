//! Timeout behaviour of the startup gates, run on a paused clock.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use runtime::{
    CheckOutcome, Event, EventBus, GateCheck, GateCheckError, GateEvent, PermissionGate,
    RuntimeError, Topic,
};
use sanctuary_core::{GateError, GateName, GateSpec, GateState, PassKind};

struct NeverAnswers;

#[async_trait]
impl GateCheck for NeverAnswers {
    async fn check(&self) -> Result<CheckOutcome, GateCheckError> {
        std::future::pending().await
    }
}

/// Answers after `delay`, counting how many checks were started.
struct SlowGrant {
    delay: Duration,
    started: Arc<AtomicUsize>,
}

impl SlowGrant {
    fn new(delay: Duration) -> (Self, Arc<AtomicUsize>) {
        let started = Arc::new(AtomicUsize::new(0));
        let check = Self {
            delay,
            started: Arc::clone(&started),
        };
        (check, started)
    }
}

#[async_trait]
impl GateCheck for SlowGrant {
    async fn check(&self) -> Result<CheckOutcome, GateCheckError> {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Ok(CheckOutcome::granted("granted"))
    }
}

fn startup_gate(bus: EventBus) -> PermissionGate {
    let gate = PermissionGate::new(bus);
    gate.register_gate(
        GateName::LocationPermission,
        GateSpec::required()
            .degrade_on_failure()
            .with_timeout(Duration::from_secs(10)),
    );
    gate.register_gate(GateName::PlayerChoice, GateSpec::required());
    gate.register_gate(GateName::MapReady, GateSpec::optional());
    gate
}

fn counter(gate: &PermissionGate) -> Arc<AtomicUsize> {
    let fired = Arc::new(AtomicUsize::new(0));
    let count = Arc::clone(&fired);
    gate.on_all_gates_passed(move || {
        count.fetch_add(1, Ordering::SeqCst);
    });
    fired
}

/// Location never answers, the player choice arrives late.
#[tokio::test(start_paused = true)]
async fn test_location_timeout_then_choice_completes_once() {
    let gate = startup_gate(EventBus::new());
    gate.set_check(GateName::LocationPermission, Arc::new(NeverAnswers));
    let fired = counter(&gate);

    let stuck = tokio::spawn({
        let gate = gate.clone();
        async move { gate.request_gate(GateName::LocationPermission).await }
    });

    tokio::time::sleep(Duration::from_millis(10_100)).await;

    let location = gate.status(GateName::LocationPermission).unwrap();
    assert_eq!(location.state, GateState::Passed(PassKind::Skipped));
    assert_eq!(location.status_message, "Timed out - skipped");

    // No timeout on the player choice: it keeps blocking.
    assert_eq!(
        gate.status(GateName::PlayerChoice).unwrap().state,
        GateState::Pending
    );
    assert!(!gate.all_gates_passed());
    assert_eq!(fired.load(Ordering::SeqCst), 0);

    gate.pass_gate(GateName::PlayerChoice, PassKind::Granted, "Player chose: Continue Adventure")
        .unwrap();

    assert!(gate.is_initialization_complete());
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // Late passes and re-checks never fire completion again.
    assert!(!gate.force_timeout_pass(GateName::LocationPermission));
    assert!(!gate
        .pass_gate(GateName::PlayerChoice, PassKind::Granted, "again")
        .unwrap());
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    stuck.abort();
}

#[tokio::test(start_paused = true)]
async fn test_pass_before_deadline_cancels_timeout() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe(Topic::Gate);
    let gate = startup_gate(bus);

    gate.pass_gate(GateName::LocationPermission, PassKind::Granted, "GPS permission granted")
        .unwrap();
    tokio::time::sleep(Duration::from_secs(11)).await;

    assert_eq!(
        gate.status(GateName::LocationPermission).unwrap().state,
        GateState::Passed(PassKind::Granted)
    );

    let mut passes = 0;
    while let Ok(event) = rx.try_recv() {
        if let Event::Gate(GateEvent::Passed { name, .. }) = event {
            assert_eq!(name, GateName::LocationPermission);
            passes += 1;
        }
    }
    assert_eq!(passes, 1);
}

#[tokio::test(start_paused = true)]
async fn test_duplicate_request_while_in_flight_is_ignored() {
    let gate = startup_gate(EventBus::new());
    gate.set_check(GateName::PlayerChoice, Arc::new(NeverAnswers));

    let first = tokio::spawn({
        let gate = gate.clone();
        async move { gate.request_gate(GateName::PlayerChoice).await }
    });
    tokio::task::yield_now().await;

    assert_eq!(
        gate.status(GateName::PlayerChoice).unwrap().state,
        GateState::Requesting
    );

    // Returns at once instead of starting a second check.
    gate.request_gate(GateName::PlayerChoice).await.unwrap();
    assert_eq!(
        gate.status(GateName::PlayerChoice).unwrap().state,
        GateState::Requesting
    );

    first.abort();
}

#[tokio::test(start_paused = true)]
async fn test_dropping_every_handle_cancels_timers() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe(Topic::Gate);
    drop(startup_gate(bus));

    tokio::time::sleep(Duration::from_secs(11)).await;

    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_reset_rearms_timeout() {
    let gate = startup_gate(EventBus::new());
    gate.pass_gate(GateName::LocationPermission, PassKind::Granted, "ok")
        .unwrap();

    gate.reset_gate(GateName::LocationPermission).unwrap();
    assert_eq!(
        gate.status(GateName::LocationPermission).unwrap().state,
        GateState::Pending
    );

    gate.wait_passed(GateName::LocationPermission).await.unwrap();
    assert_eq!(
        gate.status(GateName::LocationPermission).unwrap().state,
        GateState::Passed(PassKind::Skipped)
    );
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_request_can_be_retried() {
    let bus = EventBus::new();
    let mut rx = bus.subscribe(Topic::Gate);
    let gate = startup_gate(bus);
    let (slow, _) = SlowGrant::new(Duration::from_secs(60));
    gate.set_check(GateName::PlayerChoice, Arc::new(slow));

    let cancelled = tokio::time::timeout(
        Duration::from_secs(1),
        gate.request_gate(GateName::PlayerChoice),
    )
    .await;
    assert!(cancelled.is_err());

    let choice = gate.status(GateName::PlayerChoice).unwrap();
    assert_eq!(choice.state, GateState::Failed);
    assert_eq!(choice.status_message, "Request cancelled");

    let mut failures = 0;
    while let Ok(event) = rx.try_recv() {
        if let Event::Gate(GateEvent::Failed { name, .. }) = event {
            assert_eq!(name, GateName::PlayerChoice);
            failures += 1;
        }
    }
    assert_eq!(failures, 1);

    let (quick, started) = SlowGrant::new(Duration::from_millis(10));
    gate.set_check(GateName::PlayerChoice, Arc::new(quick));
    gate.request_gate(GateName::PlayerChoice).await.unwrap();

    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(
        gate.status(GateName::PlayerChoice).unwrap().state,
        GateState::Passed(PassKind::Granted)
    );
}

#[tokio::test(start_paused = true)]
async fn test_reset_during_request_keeps_one_check_running() {
    let gate = startup_gate(EventBus::new());
    let (slow, started) = SlowGrant::new(Duration::from_secs(5));
    gate.set_check(GateName::PlayerChoice, Arc::new(slow));

    let first = tokio::spawn({
        let gate = gate.clone();
        async move { gate.request_gate(GateName::PlayerChoice).await }
    });
    tokio::task::yield_now().await;
    assert_eq!(started.load(Ordering::SeqCst), 1);

    let refused = gate.reset_gate(GateName::PlayerChoice);
    assert!(matches!(
        refused,
        Err(RuntimeError::Gate(GateError::RequestInFlight(GateName::PlayerChoice)))
    ));

    gate.request_gate(GateName::PlayerChoice).await.unwrap();
    assert_eq!(started.load(Ordering::SeqCst), 1);

    first.await.unwrap().unwrap();
    assert_eq!(
        gate.status(GateName::PlayerChoice).unwrap().state,
        GateState::Passed(PassKind::Granted)
    );
    assert_eq!(started.load(Ordering::SeqCst), 1);
}

#[tokio::test(start_paused = true)]
async fn test_result_of_superseded_request_is_ignored() {
    let gate = startup_gate(EventBus::new());
    let (slow, _) = SlowGrant::new(Duration::from_secs(30));
    gate.set_check(GateName::PlayerChoice, Arc::new(slow));

    let stale = tokio::spawn({
        let gate = gate.clone();
        async move { gate.request_gate(GateName::PlayerChoice).await }
    });
    tokio::task::yield_now().await;

    // Settled by hand, then reset while the first check is still running.
    gate.pass_gate(GateName::PlayerChoice, PassKind::Granted, "chosen elsewhere")
        .unwrap();
    gate.reset_gate(GateName::PlayerChoice).unwrap();

    stale.await.unwrap().unwrap();

    let choice = gate.status(GateName::PlayerChoice).unwrap();
    assert_eq!(choice.state, GateState::Pending);
    assert_eq!(choice.status_message, "Pending");
}

/// Location granted, player choice never answered: the choice times out and
/// initialization completes exactly once.
#[tokio::test(start_paused = true)]
async fn test_unanswered_choice_times_out_and_completes_once() {
    let gate = PermissionGate::new(EventBus::new());
    gate.register_gate_with_check(
        GateName::LocationPermission,
        GateSpec::required()
            .degrade_on_failure()
            .with_timeout(Duration::from_secs(10)),
        SlowGrant::new(Duration::ZERO).0,
    );
    gate.register_gate_with_check(
        GateName::PlayerChoice,
        GateSpec::required().with_timeout(Duration::from_secs(10)),
        NeverAnswers,
    );
    let fired = counter(&gate);

    gate.request_gate(GateName::LocationPermission).await.unwrap();
    assert_eq!(
        gate.status(GateName::LocationPermission).unwrap().state,
        GateState::Passed(PassKind::Granted)
    );

    let waiting = tokio::spawn({
        let gate = gate.clone();
        async move { gate.request_gate(GateName::PlayerChoice).await }
    });

    tokio::time::sleep(Duration::from_millis(10_100)).await;

    assert!(gate.all_gates_passed());
    assert_eq!(
        gate.status(GateName::PlayerChoice).unwrap().state,
        GateState::Passed(PassKind::Skipped)
    );
    assert_eq!(fired.load(Ordering::SeqCst), 1);

    // Cancelling the abandoned prompt leaves the skipped gate alone.
    waiting.abort();
    assert!(waiting.await.unwrap_err().is_cancelled());
    assert_eq!(
        gate.status(GateName::PlayerChoice).unwrap().state,
        GateState::Passed(PassKind::Skipped)
    );
    assert_eq!(fired.load(Ordering::SeqCst), 1);
}
