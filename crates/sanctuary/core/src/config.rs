/// Tunable parameters and constants shared by the core state machines.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CoreConfig {
    /// Default trigger radius for proximity targets without an explicit one.
    pub default_trigger_radius_m: f64,
    /// Default per-target cooldown between two firings.
    pub default_cooldown_ms: u64,
    /// Maximum age of a persisted record that may still be trusted.
    pub freshness_window_ms: u64,
}

impl CoreConfig {
    // ===== compile-time constants =====
    /// Mean Earth radius used by the haversine formula.
    pub const EARTH_RADIUS_M: f64 = 6_371_000.0;
    /// Maximum number of choices a dialog can offer.
    pub const MAX_DIALOG_CHOICES: usize = 4;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_TRIGGER_RADIUS_M: f64 = 50.0;
    pub const DEFAULT_COOLDOWN_MS: u64 = 10_000;
    pub const DEFAULT_FRESHNESS_WINDOW_MS: u64 = 24 * 60 * 60 * 1000;

    pub fn new() -> Self {
        Self {
            default_trigger_radius_m: Self::DEFAULT_TRIGGER_RADIUS_M,
            default_cooldown_ms: Self::DEFAULT_COOLDOWN_MS,
            freshness_window_ms: Self::DEFAULT_FRESHNESS_WINDOW_MS,
        }
    }

    /// Returns true when a record stamped at `timestamp_ms` is still fresh at `now_ms`.
    pub fn is_fresh(&self, timestamp_ms: u64, now_ms: u64) -> bool {
        now_ms.saturating_sub(timestamp_ms) < self.freshness_window_ms
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new()
    }
}
