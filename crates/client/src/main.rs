//! Eldritch Sanctuary terminal client.
//!
//! Composition root that assembles:
//! 1. Configuration from the environment (`.env` supported)
//! 2. Point catalog (built-in or `SANCTUARY_CATALOG`)
//! 3. Runtime with file storage, a simulated GPS and terminal adapters
//!
//! # Commands
//!
//! - `1`..`4` answer the open dialog, `x` closes it
//! - `s` prints gate and position status
//! - `q` quits

use std::sync::Arc;

use anyhow::{Context, Result, bail};
use tokio::task::JoinHandle;

use runtime::{
    Event, FileKeyValueStore, FixedGeolocation, GeolocationError, InMemoryKeyValueStore,
    MapAdapter, MarkerLayer, Runtime, RuntimeHandle, Topic,
};
use sanctuary_client::presentation::render_gate_snapshot;
use sanctuary_client::{
    BUILTIN_CATALOG, ClientConfig, RouteWalker, TerminalChoiceProvider, TerminalDialogRenderer,
    TerminalInput, logging, render_gate_event,
};
use sanctuary_content::{CatalogLoader, PointCatalog};
use sanctuary_core::{CoreConfig, PlayerPosition};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let config = ClientConfig::from_env();
    let log_file = logging::setup_logging(&config.session_id)?;

    println!("Eldritch Sanctuary");
    println!("(logs: {})", log_file.display());

    run(config).await
}

async fn run(config: ClientConfig) -> Result<()> {
    let catalog = load_catalog(&config)?;
    let (points, skipped) = catalog.resolve(&CoreConfig::default());
    for error in &skipped {
        tracing::warn!("Skipping point: {}", error);
    }
    tracing::info!("Loaded {} points of interest", points.len());

    let start = config
        .start
        .or_else(|| catalog.demo_route.first().copied())
        .context("no start position: set SANCTUARY_START_LAT/LNG or add a demo_route")?;
    let geolocation = if config.gps_denied {
        FixedGeolocation::failing(GeolocationError::PermissionDenied)
    } else {
        FixedGeolocation::new(PlayerPosition::new(start.lat, start.lng, 10.0, 0))
    };

    let layer = Arc::new(MarkerLayer::new());
    if !catalog.demo_route.is_empty() {
        layer.add_polyline("demo_route", &catalog.demo_route);
    }

    let input = TerminalInput::stdin();
    let builder = Runtime::builder()
        .config(config.runtime_config())
        .geolocation(geolocation)
        .choice_provider(TerminalChoiceProvider::new(input.clone()))
        .dialog_renderer(TerminalDialogRenderer)
        .map(layer.clone())
        .points(points);

    let storage_dir = match &config.data_dir {
        Some(dir) => Ok(dir.clone()),
        None => FileKeyValueStore::default_dir(),
    };
    let builder = match storage_dir.and_then(FileKeyValueStore::new) {
        Ok(store) => {
            tracing::info!("Storing records in {}", store.base_dir().display());
            builder.storage(store)
        }
        Err(e) => {
            tracing::warn!("Durable storage unavailable ({}); records last for this run only", e);
            builder.storage(InMemoryKeyValueStore::new())
        }
    };

    let runtime = builder.build().await?;
    let handle = runtime.handle();
    let gate_printer = print_gate_events(&handle);

    // The map surface is headless and ready as soon as it exists.
    handle.map_ready().resolve();

    runtime.start().await?;
    let failed = handle.failed_gates();
    if let Some(gate) = failed.first() {
        gate_printer.abort();
        runtime.shutdown().await?;
        bail!("startup gate {} failed: {}", gate.name, gate.status_message);
    }
    if !handle.is_ready() {
        println!("Waiting for the remaining gates...");
    }
    runtime.wait_ready().await;
    gate_printer.abort();

    let walker = RouteWalker::new(&catalog.demo_route, config.walk_substeps, config.walk_step);
    println!(
        "Walking {} steps. Answer dialogs with their number, 's' for status, 'q' to quit.",
        walker.len()
    );
    let walk = walker.spawn(handle.clone());

    command_loop(&handle, &input, &layer).await;

    walk.abort();
    runtime.shutdown().await?;
    Ok(())
}

fn load_catalog(config: &ClientConfig) -> Result<PointCatalog> {
    match &config.catalog_path {
        Some(path) => CatalogLoader::load(path)
            .with_context(|| format!("loading catalog {}", path.display())),
        None => CatalogLoader::parse(BUILTIN_CATALOG).context("parsing built-in catalog"),
    }
}

fn print_gate_events(handle: &RuntimeHandle) -> JoinHandle<()> {
    let mut rx = handle.subscribe(Topic::Gate);
    tokio::spawn(async move {
        while let Ok(event) = rx.recv().await {
            if let Event::Gate(event) = event {
                println!("{}", render_gate_event(&event));
            }
        }
    })
}

async fn command_loop(handle: &RuntimeHandle, input: &TerminalInput, layer: &MarkerLayer) {
    while let Some(line) = input.next_line().await {
        match line.as_str() {
            "" => {}
            "q" | "quit" => break,
            "x" => {
                if !handle.dialogs().close() {
                    println!("No dialog is open.");
                }
            }
            "s" | "status" => print_status(handle, layer).await,
            other => match other.parse::<usize>() {
                Ok(n) if n > 0 => match handle.dialogs().choose(n - 1) {
                    Some(outcome) => tracing::info!("Dialog answered: {:?}", outcome),
                    None => println!("Nothing to answer with {}.", n),
                },
                _ => println!("Unknown command '{}'.", other),
            },
        }
    }
}

async fn print_status(handle: &RuntimeHandle, layer: &MarkerLayer) {
    for gate in handle.gate().snapshot() {
        println!("  {}", render_gate_snapshot(&gate));
    }

    match handle.positions().get() {
        Some(position) => println!(
            "  position: {:.5}, {:.5} (±{:.0} m)",
            position.lat, position.lng, position.accuracy
        ),
        None => println!("  position: unknown"),
    }

    for target in handle.proximity().targets().await {
        let distance = handle
            .positions()
            .get()
            .map(|p| format!("{:.0} m", p.point().distance_to(&target.location)))
            .unwrap_or_else(|| String::from("?"));
        println!("  {}: {} away", target.id, distance);
    }
    println!("  map primitives: {}", layer.len());
}
