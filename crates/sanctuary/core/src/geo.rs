//! Geographic coordinates and great-circle distance.

use crate::config::CoreConfig;

/// A WGS84 coordinate in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Returns true if both components are finite and inside their ranges.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        haversine_distance(self, other)
    }
}

/// Last known player fix.
///
/// Always replaced wholesale; `timestamp` is unix milliseconds.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlayerPosition {
    pub lat: f64,
    pub lng: f64,
    pub accuracy: f64,
    pub timestamp: u64,
}

impl PlayerPosition {
    pub const fn new(lat: f64, lng: f64, accuracy: f64, timestamp: u64) -> Self {
        Self {
            lat,
            lng,
            accuracy,
            timestamp,
        }
    }

    pub const fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lng)
    }

    /// Returns a copy stamped with `timestamp`.
    pub const fn stamped(mut self, timestamp: u64) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Haversine distance in meters between two points given in degrees.
///
/// Uses the `atan2` form, which stays accurate for very small separations.
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).max(0.0).sqrt());

    CoreConfig::EARTH_RADIUS_M * c
}
