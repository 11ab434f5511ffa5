//! Map rendering adapter.
//!
//! The runtime draws the player marker and point-of-interest circles through
//! [`MapAdapter`]; the concrete map widget lives in the client. [`MarkerLayer`]
//! is a headless implementation that simply records what was drawn.

use std::collections::BTreeMap;
use std::sync::RwLock;

use sanctuary_core::GeoPoint;

use crate::utils::{read, write};

/// Marker id used for the player's own position.
pub const PLAYER_MARKER_ID: &str = "player";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IconSpec {
    Player,
    PointOfInterest,
    Custom(String),
}

/// Drawing surface for geographic primitives.
///
/// Every primitive has a caller-chosen id; adding with an existing id
/// replaces the previous primitive.
pub trait MapAdapter: Send + Sync {
    fn add_marker(&self, id: &str, at: GeoPoint, icon: &IconSpec);

    /// Removes the primitive with `id`. Returns `false` if nothing was drawn under it.
    fn remove_marker(&self, id: &str) -> bool;

    fn add_polyline(&self, id: &str, points: &[GeoPoint]);

    fn add_circle(&self, id: &str, center: GeoPoint, radius_m: f64);
}

#[derive(Clone, Debug, PartialEq)]
pub enum MapPrimitive {
    Marker { at: GeoPoint, icon: IconSpec },
    Polyline(Vec<GeoPoint>),
    Circle { center: GeoPoint, radius_m: f64 },
}

/// In-memory [`MapAdapter`].
#[derive(Debug, Default)]
pub struct MarkerLayer {
    primitives: RwLock<BTreeMap<String, MapPrimitive>>,
}

impl MarkerLayer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &str) -> Option<MapPrimitive> {
        read(&self.primitives).get(id).cloned()
    }

    pub fn ids(&self) -> Vec<String> {
        read(&self.primitives).keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        read(&self.primitives).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, id: &str, primitive: MapPrimitive) {
        tracing::trace!("map: drawing {}", id);
        write(&self.primitives).insert(id.to_string(), primitive);
    }
}

impl MapAdapter for MarkerLayer {
    fn add_marker(&self, id: &str, at: GeoPoint, icon: &IconSpec) {
        self.insert(
            id,
            MapPrimitive::Marker {
                at,
                icon: icon.clone(),
            },
        );
    }

    fn remove_marker(&self, id: &str) -> bool {
        write(&self.primitives).remove(id).is_some()
    }

    fn add_polyline(&self, id: &str, points: &[GeoPoint]) {
        self.insert(id, MapPrimitive::Polyline(points.to_vec()));
    }

    fn add_circle(&self, id: &str, center: GeoPoint, radius_m: f64) {
        self.insert(id, MapPrimitive::Circle { center, radius_m });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_id_replaces() {
        let layer = MarkerLayer::new();
        layer.add_marker(PLAYER_MARKER_ID, GeoPoint::new(1.0, 1.0), &IconSpec::Player);
        layer.add_marker(PLAYER_MARKER_ID, GeoPoint::new(2.0, 2.0), &IconSpec::Player);

        assert_eq!(layer.len(), 1);
        assert_eq!(
            layer.get(PLAYER_MARKER_ID),
            Some(MapPrimitive::Marker {
                at: GeoPoint::new(2.0, 2.0),
                icon: IconSpec::Player
            })
        );

        assert!(layer.remove_marker(PLAYER_MARKER_ID));
        assert!(!layer.remove_marker(PLAYER_MARKER_ID));
        assert!(layer.is_empty());
    }

    #[test]
    fn test_mixed_primitives() {
        let layer = MarkerLayer::new();
        layer.add_circle("shrine", GeoPoint::new(61.47, 23.72), 30.0);
        layer.add_polyline("route", &[GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.001)]);

        assert_eq!(layer.ids(), vec!["route".to_string(), "shrine".to_string()]);
        assert!(matches!(layer.get("route"), Some(MapPrimitive::Polyline(p)) if p.len() == 2));
    }
}
