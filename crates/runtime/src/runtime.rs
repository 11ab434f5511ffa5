//! High-level runtime orchestrator.
//!
//! The runtime wires the session services together, registers the startup
//! gates and starts proximity monitoring once every required gate passed.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::task::JoinHandle;

use sanctuary_content::PointOfInterest;
use sanctuary_core::{Clock, CoreConfig, GateName, GateSpec, HandlerError, ProximityHit};

use crate::api::{ChoiceProvider, GeolocationProvider, Result, RuntimeError, RuntimeHandle};
use crate::clock::SystemClock;
use crate::dialog::{DialogPresenter, DialogRenderer, DialogTrigger, TracingDialogRenderer};
use crate::events::EventBus;
use crate::gate::{LocationPermissionCheck, PermissionGate, PlayerChoiceCheck, ReadinessCheck};
use crate::map::{IconSpec, MapAdapter};
use crate::position::PositionStore;
use crate::readiness::Readiness;
use crate::repository::{InMemoryKeyValueStore, KeyValueStore};
use crate::utils::lock;
use crate::workers::ProximityMonitor;

/// Runtime configuration shared across the orchestrator and workers.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub core: CoreConfig,
    /// Forced-pass deadline of the location permission gate.
    pub gate_timeout: Duration,
    /// Forced-pass deadline of the player choice gate. `None` waits for the player.
    pub player_choice_timeout: Option<Duration>,
    /// Upper bound on a single platform location request.
    pub geolocation_timeout: Duration,
    /// Period of the proximity monitor.
    pub poll_interval: Duration,
    pub event_buffer_size: usize,
}

impl RuntimeConfig {
    pub const DEFAULT_GATE_TIMEOUT: Duration = Duration::from_secs(10);
    pub const DEFAULT_GEOLOCATION_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            core: CoreConfig::default(),
            gate_timeout: Self::DEFAULT_GATE_TIMEOUT,
            player_choice_timeout: None,
            geolocation_timeout: Self::DEFAULT_GEOLOCATION_TIMEOUT,
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            event_buffer_size: 100,
        }
    }
}

/// Main runtime that orchestrates the client session
///
/// Design: Runtime owns the background proximity worker.
/// [`RuntimeHandle`] provides a cloneable façade for clients.
pub struct Runtime {
    handle: RuntimeHandle,
    config: RuntimeConfig,
    monitor_worker: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl Runtime {
    /// Create a new runtime builder
    pub fn builder() -> RuntimeBuilder {
        RuntimeBuilder::new()
    }

    /// Get a cloneable handle to this runtime
    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run the startup gate sequence.
    ///
    /// Location permission is requested first, then the player choice. Each
    /// step ends when its check finishes or its gate passes by timeout. Map
    /// readiness is awaited in the background. A failed player choice leaves
    /// the gate failed and is listed by [`RuntimeHandle::failed_gates`];
    /// request it again through [`RuntimeHandle::gate`].
    pub async fn start(&self) -> Result<()> {
        let gate = self.handle.gate().clone();
        tokio::spawn(async move {
            if let Err(e) = gate.request_gate(GateName::MapReady).await {
                tracing::warn!("Map readiness request failed: {}", e);
            }
        });

        self.request_step(GateName::LocationPermission).await?;
        self.request_step(GateName::PlayerChoice).await?;
        Ok(())
    }

    /// Wait until every required gate has passed
    pub async fn wait_ready(&self) {
        self.handle.wait_ready().await;
    }

    async fn request_step(&self, name: GateName) -> Result<()> {
        let gate = self.handle.gate();
        let request = gate.request_gate(name);
        tokio::pin!(request);

        tokio::select! {
            result = &mut request => result,
            result = gate.wait_passed(name) => result,
        }
    }

    /// Shutdown the runtime gracefully
    pub async fn shutdown(self) -> Result<()> {
        self.handle.gate().cancel_timers();
        self.handle.dialogs().close();

        let worker = lock(&self.monitor_worker).take();
        if let Some(worker) = worker {
            worker.abort();
            match worker.await {
                Ok(()) => {}
                Err(e) if e.is_cancelled() => {}
                Err(e) => return Err(RuntimeError::WorkerJoin(e)),
            }
        }

        tracing::info!("Runtime shut down");
        Ok(())
    }
}

/// Builder for [`Runtime`] with flexible configuration.
pub struct RuntimeBuilder {
    config: RuntimeConfig,
    storage: Option<Arc<dyn KeyValueStore>>,
    clock: Option<Arc<dyn Clock>>,
    geolocation: Option<Arc<dyn GeolocationProvider>>,
    chooser: Option<Arc<dyn ChoiceProvider>>,
    renderer: Option<Arc<dyn DialogRenderer>>,
    map: Option<Arc<dyn MapAdapter>>,
    points: Vec<PointOfInterest>,
}

impl RuntimeBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            storage: None,
            clock: None,
            geolocation: None,
            chooser: None,
            renderer: None,
            map: None,
            points: Vec::new(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Durable storage (default: in-memory)
    pub fn storage(mut self, storage: impl KeyValueStore + 'static) -> Self {
        self.storage = Some(Arc::new(storage));
        self
    }

    /// Time source (default: system clock)
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Set required geolocation provider
    pub fn geolocation(mut self, provider: impl GeolocationProvider + 'static) -> Self {
        self.geolocation = Some(Arc::new(provider));
        self
    }

    /// Set required continue/new choice provider
    pub fn choice_provider(mut self, provider: impl ChoiceProvider + 'static) -> Self {
        self.chooser = Some(Arc::new(provider));
        self
    }

    /// Dialog renderer (default: logs dialogs through `tracing`)
    pub fn dialog_renderer(mut self, renderer: impl DialogRenderer + 'static) -> Self {
        self.renderer = Some(Arc::new(renderer));
        self
    }

    /// Map surface mirroring the player marker and point-of-interest radii (optional)
    pub fn map(mut self, map: Arc<dyn MapAdapter>) -> Self {
        self.map = Some(map);
        self
    }

    /// Points of interest watched by the proximity monitor
    pub fn points(mut self, points: Vec<PointOfInterest>) -> Self {
        self.points.extend(points);
        self
    }

    /// Build the runtime
    ///
    /// Gate timeouts start counting here.
    pub async fn build(self) -> Result<Runtime> {
        let geolocation = self.geolocation.ok_or(RuntimeError::MissingGeolocation)?;
        let chooser = self.chooser.ok_or(RuntimeError::MissingChoiceProvider)?;
        let storage = self
            .storage
            .unwrap_or_else(|| Arc::new(InMemoryKeyValueStore::new()));
        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let renderer = self
            .renderer
            .unwrap_or_else(|| Arc::new(TracingDialogRenderer));
        let config = self.config;

        let events = EventBus::with_capacity(config.event_buffer_size);

        let positions = match &self.map {
            Some(map) => PositionStore::with_map(
                storage.clone(),
                clock.clone(),
                config.core.clone(),
                events.clone(),
                map.clone(),
            ),
            None => PositionStore::new(
                storage.clone(),
                clock.clone(),
                config.core.clone(),
                events.clone(),
            ),
        };
        let dialogs = DialogPresenter::new(renderer, events.clone());
        let proximity = ProximityMonitor::new(
            positions.clone(),
            dialogs.clone(),
            clock.clone(),
            events.clone(),
        );

        for point in self.points {
            let PointOfInterest { target, dialog } = point;
            if let Some(map) = &self.map {
                map.add_marker(&target.id, target.location, &IconSpec::PointOfInterest);
                map.add_circle(
                    &format!("{}:radius", target.id),
                    target.location,
                    target.trigger_radius_m,
                );
            }

            match dialog {
                Some(dialog) => {
                    let trigger = DialogTrigger::new(dialogs.clone(), dialog);
                    proximity.add_target(target, trigger).await?;
                }
                None => proximity.add_target(target, without_dialog).await?,
            }
        }

        // Gates
        let gate = PermissionGate::new(events.clone());

        let location = LocationPermissionCheck::new(
            geolocation,
            storage.clone(),
            positions.clone(),
            clock.clone(),
            config.core.clone(),
            config.geolocation_timeout,
        );
        gate.register_gate_with_check(
            GateName::LocationPermission,
            GateSpec::required()
                .degrade_on_failure()
                .with_timeout(config.gate_timeout),
            location,
        );

        let choice_spec = match config.player_choice_timeout {
            Some(timeout) => GateSpec::required().with_timeout(timeout),
            None => GateSpec::required(),
        };
        gate.register_gate_with_check(
            GateName::PlayerChoice,
            choice_spec,
            PlayerChoiceCheck::new(chooser, storage.clone(), clock.clone()),
        );

        let map_ready = Readiness::new();
        gate.register_gate_with_check(
            GateName::MapReady,
            GateSpec::optional(),
            ReadinessCheck::new(map_ready.clone(), "Map system loaded"),
        );

        let monitor_worker = Arc::new(Mutex::new(None));
        {
            let proximity = proximity.clone();
            let slot = Arc::clone(&monitor_worker);
            let every = config.poll_interval;
            gate.on_all_gates_passed(move || {
                let Ok(runtime) = tokio::runtime::Handle::try_current() else {
                    tracing::warn!("No async runtime; proximity monitoring not started");
                    return;
                };
                *lock(&slot) = Some(runtime.spawn(proximity.run(every)));
            });
        }

        let handle = RuntimeHandle::new(gate, positions, dialogs, proximity, map_ready, events);

        tracing::info!("Runtime built");

        Ok(Runtime {
            handle,
            config,
            monitor_worker,
        })
    }
}

fn without_dialog(_: &ProximityHit) -> std::result::Result<(), HandlerError> {
    Ok(())
}
