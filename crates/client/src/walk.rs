//! Simulated walk feeding location fixes into the runtime.
use std::time::Duration;

use tokio::task::JoinHandle;

use runtime::RuntimeHandle;
use sanctuary_core::{GeoPoint, PlayerPosition};

/// Route with `substeps` evenly spaced points inserted between each pair of
/// waypoints. Waypoints themselves are kept.
pub fn interpolate(route: &[GeoPoint], substeps: usize) -> Vec<GeoPoint> {
    let Some(last) = route.last() else {
        return Vec::new();
    };

    let mut points = Vec::with_capacity(route.len() + (route.len() - 1) * substeps);
    for pair in route.windows(2) {
        let (from, to) = (pair[0], pair[1]);
        points.push(from);
        for step in 1..=substeps {
            let t = step as f64 / (substeps + 1) as f64;
            points.push(GeoPoint::new(
                from.lat + (to.lat - from.lat) * t,
                from.lng + (to.lng - from.lng) * t,
            ));
        }
    }
    points.push(*last);
    points
}

pub struct RouteWalker {
    points: Vec<GeoPoint>,
    step: Duration,
    accuracy_m: f64,
}

impl RouteWalker {
    pub fn new(route: &[GeoPoint], substeps: usize, step: Duration) -> Self {
        Self {
            points: interpolate(route, substeps),
            step,
            accuracy_m: 8.0,
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Reports each point as a fix, one every `step`.
    pub async fn walk(self, handle: RuntimeHandle) {
        for point in self.points {
            handle.update_position(PlayerPosition::new(point.lat, point.lng, self.accuracy_m, 0));
            tokio::time::sleep(self.step).await;
        }
        tracing::info!("Simulated walk finished");
    }

    pub fn spawn(self, handle: RuntimeHandle) -> JoinHandle<()> {
        tokio::spawn(self.walk(handle))
    }
}
