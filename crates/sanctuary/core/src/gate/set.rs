use super::{
    Gate, GateError, GateFlags, GateName, GateSnapshot, GateSpec, GateState, GateTransition,
    PassKind, RequestTicket,
};

/// Outcome of [`GateSet::register`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Registration {
    Added,
    /// The name was already registered; the existing gate is unchanged.
    AlreadyRegistered,
}

/// Ordered collection of startup gates.
///
/// Gates are kept in registration order so presentation layers can show the
/// sequence as steps. Completion is latched: [`GateSet::try_complete`]
/// returns `true` exactly once per set, the first time every required gate
/// has passed.
#[derive(Clone, Debug, Default)]
pub struct GateSet {
    gates: Vec<Gate>,
    initialization_complete: bool,
    next_request: u64,
}

impl GateSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a gate. Re-registering an existing name is a no-op.
    pub fn register(&mut self, name: GateName, spec: GateSpec) -> Registration {
        if self.gates.iter().any(|g| g.name == name) {
            return Registration::AlreadyRegistered;
        }
        self.gates.push(Gate::new(name, spec));
        Registration::Added
    }

    pub fn get(&self, name: GateName) -> Option<&Gate> {
        self.gates.iter().find(|g| g.name == name)
    }

    pub fn contains(&self, name: GateName) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Gate> {
        self.gates.iter()
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    fn gate_mut(&mut self, name: GateName) -> Result<&mut Gate, GateError> {
        self.gates
            .iter_mut()
            .find(|g| g.name == name)
            .ok_or(GateError::UnknownGate(name))
    }

    /// Marks a request as in flight.
    ///
    /// Fails if the gate already passed or another request is outstanding,
    /// which keeps at most one permission prompt per gate. The returned
    /// ticket reports the result through [`complete_request`](Self::complete_request),
    /// [`fail_request`](Self::fail_request) or [`abort_request`](Self::abort_request).
    pub fn begin_request(
        &mut self,
        name: GateName,
    ) -> Result<(RequestTicket, GateTransition), GateError> {
        let id = self.next_request;
        let gate = self.gate_mut(name)?;
        match gate.state {
            GateState::Passed(_) => Err(GateError::AlreadyPassed(name)),
            GateState::Requesting => Err(GateError::RequestInFlight(name)),
            GateState::Pending | GateState::Failed => {
                gate.state = GateState::Requesting;
                gate.status_message = String::from("Requesting...");
                gate.request = Some(id);
                self.next_request += 1;
                Ok((RequestTicket { name, id }, GateTransition::Requesting { name }))
            }
        }
    }

    /// Returns true while `ticket` is the gate's outstanding request.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.get(ticket.name)
            .is_some_and(|gate| gate.request == Some(ticket.id))
    }

    /// Passes the gate with the result of its request.
    ///
    /// Returns `Ok(None)` for a stale ticket: the gate was passed, timed out
    /// or reset while the check was running.
    pub fn complete_request(
        &mut self,
        ticket: RequestTicket,
        kind: PassKind,
        message: impl Into<String>,
    ) -> Result<Option<GateTransition>, GateError> {
        if !self.is_current(ticket) {
            return Ok(None);
        }
        self.pass(ticket.name, kind, message)
    }

    /// Records a failed request. A stale ticket changes nothing.
    pub fn fail_request(
        &mut self,
        ticket: RequestTicket,
        message: impl Into<String>,
    ) -> Result<Vec<GateTransition>, GateError> {
        if !self.is_current(ticket) {
            return Ok(Vec::new());
        }
        self.fail(ticket.name, message)
    }

    /// Abandons a request whose check never finished.
    ///
    /// The gate becomes [`GateState::Failed`] and may be requested again;
    /// degrade-on-failure does not apply. A stale ticket changes nothing.
    pub fn abort_request(&mut self, ticket: RequestTicket) -> Option<GateTransition> {
        if !self.is_current(ticket) {
            return None;
        }
        let gate = self.gate_mut(ticket.name).ok()?;
        let message = String::from("Request cancelled");
        gate.request = None;
        gate.state = GateState::Failed;
        gate.status_message = message.clone();

        Some(GateTransition::Failed {
            name: ticket.name,
            message,
        })
    }

    /// Passes a gate.
    ///
    /// Returns `Ok(None)` if the gate had already passed; the first pass wins.
    pub fn pass(
        &mut self,
        name: GateName,
        kind: PassKind,
        message: impl Into<String>,
    ) -> Result<Option<GateTransition>, GateError> {
        let gate = self.gate_mut(name)?;
        if gate.passed() {
            return Ok(None);
        }

        let message = message.into();
        gate.request = None;
        gate.state = GateState::Passed(kind);
        gate.status_message = message.clone();

        Ok(Some(GateTransition::Passed {
            name,
            kind,
            message,
        }))
    }

    /// Records a failed check.
    ///
    /// Gates flagged [`GateFlags::DEGRADE_ON_FAILURE`] pass in degraded mode;
    /// the returned transitions then contain both the failure and the pass.
    /// Other gates become [`GateState::Failed`] and may be requested again.
    /// A gate that already passed is left untouched.
    pub fn fail(
        &mut self,
        name: GateName,
        message: impl Into<String>,
    ) -> Result<Vec<GateTransition>, GateError> {
        let gate = self.gate_mut(name)?;
        if gate.passed() {
            return Ok(Vec::new());
        }

        let message = message.into();
        gate.request = None;
        let mut transitions = vec![GateTransition::Failed {
            name,
            message: message.clone(),
        }];

        if gate.spec.flags.contains(GateFlags::DEGRADE_ON_FAILURE) {
            let degraded = format!("{message} (continuing without it)");
            gate.state = GateState::Passed(PassKind::Degraded);
            gate.status_message = degraded.clone();
            transitions.push(GateTransition::Passed {
                name,
                kind: PassKind::Degraded,
                message: degraded,
            });
        } else {
            gate.state = GateState::Failed;
            gate.status_message = message;
        }

        Ok(transitions)
    }

    /// Forces a `required && blocking` gate open after its timeout.
    ///
    /// Returns `None` when the gate is unknown, already passed, or not
    /// eligible for the forced pass.
    pub fn force_timeout_pass(&mut self, name: GateName) -> Option<GateTransition> {
        let gate = self.gate_mut(name).ok()?;
        if gate.passed() || !gate.spec.is_required() || !gate.spec.is_blocking() {
            return None;
        }

        let message = String::from("Timed out - skipped");
        gate.request = None;
        gate.state = GateState::Passed(PassKind::Skipped);
        gate.status_message = message.clone();

        Some(GateTransition::Passed {
            name,
            kind: PassKind::Skipped,
            message,
        })
    }

    /// Returns a gate to `Pending`. The completion latch is not re-armed.
    ///
    /// Refused while a request is in flight, so a reset never lets a second
    /// prompt start next to the first.
    pub fn reset(&mut self, name: GateName) -> Result<GateTransition, GateError> {
        let gate = self.gate_mut(name)?;
        if gate.state == GateState::Requesting {
            return Err(GateError::RequestInFlight(name));
        }
        gate.state = GateState::Pending;
        gate.status_message = String::from("Pending");
        Ok(GateTransition::Reset { name })
    }

    /// True iff every required gate has passed.
    pub fn all_gates_passed(&self) -> bool {
        self.gates
            .iter()
            .filter(|g| g.spec.is_required())
            .all(Gate::passed)
    }

    /// Latches completion.
    ///
    /// Returns `true` only on the first call at which [`all_gates_passed`](Self::all_gates_passed) holds.
    pub fn try_complete(&mut self) -> bool {
        if self.initialization_complete || !self.all_gates_passed() {
            return false;
        }
        self.initialization_complete = true;
        true
    }

    pub fn is_initialization_complete(&self) -> bool {
        self.initialization_complete
    }

    pub fn snapshot(&self) -> Vec<GateSnapshot> {
        self.gates.iter().map(Gate::snapshot).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn startup_set() -> GateSet {
        let mut set = GateSet::new();
        set.register(GateName::LocationPermission, GateSpec::required().degrade_on_failure());
        set.register(GateName::PlayerChoice, GateSpec::required());
        set.register(GateName::MapReady, GateSpec::optional());
        set
    }

    #[test]
    fn test_reregistration_is_noop() {
        let mut set = startup_set();
        set.pass(GateName::PlayerChoice, PassKind::Granted, "chose").unwrap();

        let outcome = set.register(GateName::PlayerChoice, GateSpec::optional());
        assert_eq!(outcome, Registration::AlreadyRegistered);

        let gate = set.get(GateName::PlayerChoice).unwrap();
        assert!(gate.passed());
        assert!(gate.spec.is_required());
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn test_all_gates_passed_requires_every_required_gate() {
        let mut set = startup_set();
        assert!(!set.all_gates_passed());

        set.pass(GateName::LocationPermission, PassKind::Granted, "ok").unwrap();
        assert!(!set.all_gates_passed());

        set.pass(GateName::PlayerChoice, PassKind::Granted, "ok").unwrap();
        // MapReady is optional and still pending.
        assert!(set.all_gates_passed());
    }

    #[test]
    fn test_empty_set_is_vacuously_passed() {
        let set = GateSet::new();
        assert!(set.all_gates_passed());
    }

    #[test]
    fn test_completion_latches_once() {
        let mut set = startup_set();
        assert!(!set.try_complete());

        set.pass(GateName::LocationPermission, PassKind::Granted, "ok").unwrap();
        set.pass(GateName::PlayerChoice, PassKind::Granted, "ok").unwrap();
        assert!(set.try_complete());
        assert!(!set.try_complete());

        set.pass(GateName::MapReady, PassKind::Granted, "ok").unwrap();
        assert!(!set.try_complete());
        assert!(set.is_initialization_complete());
    }

    #[test]
    fn test_single_outstanding_request() {
        let mut set = startup_set();
        set.begin_request(GateName::LocationPermission).unwrap();
        assert_eq!(
            set.begin_request(GateName::LocationPermission),
            Err(GateError::RequestInFlight(GateName::LocationPermission))
        );
    }

    #[test]
    fn test_failure_without_degrade_is_retryable() {
        let mut set = startup_set();
        set.begin_request(GateName::PlayerChoice).unwrap();

        let transitions = set.fail(GateName::PlayerChoice, "no answer").unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(
            set.get(GateName::PlayerChoice).unwrap().state,
            GateState::Failed
        );

        assert!(set.begin_request(GateName::PlayerChoice).is_ok());
    }

    #[test]
    fn test_failure_with_degrade_passes() {
        let mut set = startup_set();
        set.begin_request(GateName::LocationPermission).unwrap();

        let transitions = set.fail(GateName::LocationPermission, "denied").unwrap();
        assert!(matches!(transitions[0], GateTransition::Failed { .. }));
        assert!(matches!(
            transitions[1],
            GateTransition::Passed {
                kind: PassKind::Degraded,
                ..
            }
        ));
        assert_eq!(
            set.get(GateName::LocationPermission).unwrap().state,
            GateState::Passed(PassKind::Degraded)
        );
    }

    #[test]
    fn test_passed_gate_never_unpasses() {
        let mut set = startup_set();
        set.pass(GateName::LocationPermission, PassKind::Granted, "ok").unwrap();

        assert!(set.fail(GateName::LocationPermission, "late error").unwrap().is_empty());
        assert!(set
            .pass(GateName::LocationPermission, PassKind::Degraded, "again")
            .unwrap()
            .is_none());
        assert_eq!(
            set.begin_request(GateName::LocationPermission),
            Err(GateError::AlreadyPassed(GateName::LocationPermission))
        );
        assert_eq!(
            set.get(GateName::LocationPermission).unwrap().state,
            GateState::Passed(PassKind::Granted)
        );
    }

    #[test]
    fn test_force_timeout_only_for_required_blocking() {
        let mut set = startup_set();

        assert!(set.force_timeout_pass(GateName::MapReady).is_none());
        assert!(matches!(
            set.force_timeout_pass(GateName::PlayerChoice),
            Some(GateTransition::Passed {
                kind: PassKind::Skipped,
                ..
            })
        ));
        assert!(set.force_timeout_pass(GateName::PlayerChoice).is_none());
    }

    #[test]
    fn test_reset_returns_to_pending() {
        let mut set = startup_set();
        set.pass(GateName::LocationPermission, PassKind::Granted, "ok").unwrap();
        set.reset(GateName::LocationPermission).unwrap();

        let gate = set.get(GateName::LocationPermission).unwrap();
        assert_eq!(gate.state, GateState::Pending);
        assert!(!set.all_gates_passed());
    }

    #[test]
    fn test_reset_refused_while_requesting() {
        let mut set = startup_set();
        let (ticket, _) = set.begin_request(GateName::PlayerChoice).unwrap();

        assert_eq!(
            set.reset(GateName::PlayerChoice),
            Err(GateError::RequestInFlight(GateName::PlayerChoice))
        );
        assert!(set.is_current(ticket));
    }

    #[test]
    fn test_aborted_request_is_retryable() {
        let mut set = startup_set();
        let (ticket, _) = set.begin_request(GateName::LocationPermission).unwrap();

        let aborted = set.abort_request(ticket);
        assert!(matches!(aborted, Some(GateTransition::Failed { .. })));

        // No degraded pass for a cancellation, even on a degrading gate.
        let gate = set.get(GateName::LocationPermission).unwrap();
        assert_eq!(gate.state, GateState::Failed);
        assert_eq!(gate.status_message, "Request cancelled");
        assert!(set.abort_request(ticket).is_none());

        let (retry, _) = set.begin_request(GateName::LocationPermission).unwrap();
        assert_ne!(retry, ticket);
        assert!(set
            .complete_request(retry, PassKind::Granted, "ok")
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut set = startup_set();
        let (stale, _) = set.begin_request(GateName::PlayerChoice).unwrap();
        set.force_timeout_pass(GateName::PlayerChoice).unwrap();
        set.reset(GateName::PlayerChoice).unwrap();
        let (current, _) = set.begin_request(GateName::PlayerChoice).unwrap();

        assert!(set
            .complete_request(stale, PassKind::Granted, "late")
            .unwrap()
            .is_none());
        assert!(set.fail_request(stale, "late").unwrap().is_empty());
        assert!(set.abort_request(stale).is_none());
        assert_eq!(
            set.get(GateName::PlayerChoice).unwrap().state,
            GateState::Requesting
        );

        let transitions = set.fail_request(current, "no answer").unwrap();
        assert_eq!(transitions.len(), 1);
        assert_eq!(set.get(GateName::PlayerChoice).unwrap().state, GateState::Failed);
    }

    #[test]
    fn test_unknown_gate() {
        let mut set = GateSet::new();
        assert_eq!(
            set.begin_request(GateName::MapReady),
            Err(GateError::UnknownGate(GateName::MapReady))
        );
    }

    #[test]
    fn test_gate_name_strings() {
        assert_eq!(GateName::LocationPermission.to_string(), "locationPermission");
        assert_eq!("playerChoice".parse::<GateName>().unwrap(), GateName::PlayerChoice);
    }
}
