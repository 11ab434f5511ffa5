//! Point-of-interest catalog loader.

use std::path::Path;

use sanctuary_core::{CoreConfig, Dialog, GeoPoint, ProximityError, ProximityTarget};
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Catalog structure for RON files.
///
/// Example:
/// ```ron
/// (
///     defaults: (radius_m: Some(40.0), cooldown_ms: Some(10000)),
///     points: [
///         (
///             id: "shrine",
///             lat: Some(61.4720),
///             lng: Some(23.7240),
///             dialog: Some((
///                 title: "Forgotten Shrine",
///                 body: "The air hums.",
///                 choices: [("pray", "Pray"), ("leave", "Leave")],
///             )),
///         ),
///     ],
/// )
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointCatalog {
    #[serde(default)]
    pub defaults: PointDefaults,
    #[serde(default)]
    pub points: Vec<PointSpec>,
    /// Waypoints for simulated walks, in visiting order.
    #[serde(default)]
    pub demo_route: Vec<GeoPoint>,
}

/// Values applied to points that omit them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointDefaults {
    pub radius_m: Option<f64>,
    pub cooldown_ms: Option<u64>,
}

/// One authored point. Coordinates are optional so that incomplete entries
/// can be reported and skipped instead of failing the whole catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointSpec {
    pub id: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub radius_m: Option<f64>,
    #[serde(default)]
    pub cooldown_ms: Option<u64>,
    #[serde(default)]
    pub dialog: Option<DialogSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogSpec {
    pub title: String,
    #[serde(default)]
    pub body: String,
    /// `(key, label)` pairs.
    #[serde(default)]
    pub choices: Vec<(String, String)>,
}

/// A validated point ready to be registered with the proximity engine.
#[derive(Debug, Clone)]
pub struct PointOfInterest {
    pub target: ProximityTarget,
    pub dialog: Option<Dialog>,
}

impl PointCatalog {
    /// Converts every point into a [`PointOfInterest`].
    ///
    /// Points with missing or out-of-range coordinates, or with more dialog
    /// choices than a dialog can hold, are returned as errors; the remaining
    /// points are unaffected.
    pub fn resolve(&self, config: &CoreConfig) -> (Vec<PointOfInterest>, Vec<ProximityError>) {
        let mut points = Vec::with_capacity(self.points.len());
        let mut rejected = Vec::new();

        for spec in &self.points {
            match spec.resolve(&self.defaults, config) {
                Ok(point) => points.push(point),
                Err(e) => rejected.push(e),
            }
        }

        (points, rejected)
    }
}

impl PointSpec {
    fn invalid(&self, reason: impl Into<String>) -> ProximityError {
        ProximityError::InvalidTargetData {
            id: self.id.clone(),
            reason: reason.into(),
        }
    }

    fn resolve(
        &self,
        defaults: &PointDefaults,
        config: &CoreConfig,
    ) -> Result<PointOfInterest, ProximityError> {
        let (Some(lat), Some(lng)) = (self.lat, self.lng) else {
            return Err(self.invalid("missing lat/lng"));
        };
        let location = GeoPoint::new(lat, lng);
        if !location.is_valid() {
            return Err(self.invalid(format!("coordinates out of range: {lat}, {lng}")));
        }

        let radius = self
            .radius_m
            .or(defaults.radius_m)
            .unwrap_or(config.default_trigger_radius_m);
        if !radius.is_finite() || radius < 0.0 {
            return Err(self.invalid(format!("invalid radius: {radius}")));
        }
        let cooldown = self
            .cooldown_ms
            .or(defaults.cooldown_ms)
            .unwrap_or(config.default_cooldown_ms);

        let dialog = match &self.dialog {
            Some(spec) => Some(self.build_dialog(spec)?),
            None => None,
        };

        Ok(PointOfInterest {
            target: ProximityTarget::new(self.id.clone(), location, radius, cooldown),
            dialog,
        })
    }

    fn build_dialog(&self, spec: &DialogSpec) -> Result<Dialog, ProximityError> {
        let mut dialog = Dialog::new(self.id.clone(), spec.title.clone(), spec.body.clone());
        for (key, label) in &spec.choices {
            dialog = dialog
                .with_choice(key.clone(), label.clone())
                .map_err(|e| self.invalid(e.to_string()))?;
        }
        Ok(dialog)
    }
}

/// Loader for point catalogs from RON files.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load a catalog from a RON file.
    pub fn load(path: &Path) -> LoadResult<PointCatalog> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Parse a catalog from RON text.
    pub fn parse(content: &str) -> LoadResult<PointCatalog> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse point catalog RON: {}", e))
    }
}
