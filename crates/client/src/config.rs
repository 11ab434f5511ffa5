//! Client configuration loaded from the environment.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use runtime::RuntimeConfig;
use sanctuary_core::GeoPoint;

/// Configuration of the terminal host.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub session_id: Option<String>,
    pub data_dir: Option<PathBuf>,
    pub catalog_path: Option<PathBuf>,
    /// First fix reported by the simulated GPS. Defaults to the route start.
    pub start: Option<GeoPoint>,
    /// Simulate a user who refuses location access.
    pub gps_denied: bool,
    pub walk_step: Duration,
    /// Points inserted between two route waypoints.
    pub walk_substeps: usize,
    pub gate_timeout: Duration,
    pub player_choice_timeout: Option<Duration>,
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            session_id: None,
            data_dir: None,
            catalog_path: None,
            start: None,
            gps_denied: false,
            walk_step: Duration::from_secs(2),
            walk_substeps: 3,
            gate_timeout: RuntimeConfig::DEFAULT_GATE_TIMEOUT,
            player_choice_timeout: None,
            poll_interval: RuntimeConfig::DEFAULT_POLL_INTERVAL,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SANCTUARY_SESSION_ID` - Session identifier for log files (default: auto-generated)
    /// - `SANCTUARY_DATA_DIR` - Directory for durable records (default: platform-specific)
    /// - `SANCTUARY_CATALOG` - RON point catalog (default: built-in)
    /// - `SANCTUARY_START_LAT` / `SANCTUARY_START_LNG` - Simulated first fix
    /// - `SANCTUARY_GPS_DENIED` - Simulate a denied location prompt (default: false)
    /// - `SANCTUARY_WALK_STEP_MS` - Delay between simulated fixes (default: 2000)
    /// - `SANCTUARY_WALK_SUBSTEPS` - Fixes between two waypoints (default: 3)
    /// - `SANCTUARY_GATE_TIMEOUT_SECS` - Location gate timeout (default: 10)
    /// - `SANCTUARY_CHOICE_TIMEOUT_SECS` - Player choice gate timeout (default: none)
    /// - `SANCTUARY_POLL_MS` - Proximity polling period (default: 5000)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        config.session_id = env::var("SANCTUARY_SESSION_ID").ok();
        config.data_dir = env::var("SANCTUARY_DATA_DIR").ok().map(PathBuf::from);
        config.catalog_path = env::var("SANCTUARY_CATALOG").ok().map(PathBuf::from);

        if let (Some(lat), Some(lng)) = (
            read_env::<f64>("SANCTUARY_START_LAT"),
            read_env::<f64>("SANCTUARY_START_LNG"),
        ) {
            config.start = Some(GeoPoint::new(lat, lng));
        }

        if let Some(denied) = read_env::<bool>("SANCTUARY_GPS_DENIED") {
            config.gps_denied = denied;
        } else if env::var("SANCTUARY_GPS_DENIED").is_ok() {
            // Also accept just setting the variable without value as "true"
            config.gps_denied = true;
        }

        if let Some(ms) = read_env::<u64>("SANCTUARY_WALK_STEP_MS") {
            config.walk_step = Duration::from_millis(ms);
        }
        if let Some(substeps) = read_env::<usize>("SANCTUARY_WALK_SUBSTEPS") {
            config.walk_substeps = substeps;
        }
        if let Some(secs) = read_env::<u64>("SANCTUARY_GATE_TIMEOUT_SECS") {
            config.gate_timeout = Duration::from_secs(secs);
        }
        config.player_choice_timeout =
            read_env::<u64>("SANCTUARY_CHOICE_TIMEOUT_SECS").map(Duration::from_secs);
        if let Some(ms) = read_env::<u64>("SANCTUARY_POLL_MS") {
            config.poll_interval = Duration::from_millis(ms.max(100));
        }

        config
    }

    pub fn runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            gate_timeout: self.gate_timeout,
            player_choice_timeout: self.player_choice_timeout,
            poll_interval: self.poll_interval,
            ..RuntimeConfig::default()
        }
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
