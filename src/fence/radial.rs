use super::Coord;
use serde::Deserialize;
use serde::Serialize;
use std::f64::consts::PI;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A circular fence with a center and a radius in kilometers.
#[derive(Serialize, Deserialize, PartialEq, Clone, Copy, Debug)]
pub struct RadialFence {
    pub center: Coord,
    pub radius: f64,
}

/// Returns whether a point lies within a radial fence. A point exactly on
/// the circle counts as inside.
pub fn in_radius(point: Coord, fence: &RadialFence) -> bool {
    distance_km(fence.center, point) <= fence.radius
}

/// Great-circle distance between two points in kilometers, computed with the
/// haversine formula on a spherical Earth.
pub fn distance_km(c1: Coord, c2: Coord) -> f64 {
    let lat1 = degrees_to_radians(c1.lat);
    let lon1 = degrees_to_radians(c1.lon);
    let lat2 = degrees_to_radians(c2.lat);
    let lon2 = degrees_to_radians(c2.lon);

    let diff_lat = lat2 - lat1;
    let diff_lon = lon2 - lon1;

    let a = (diff_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (diff_lon / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    c * EARTH_RADIUS_KM
}

fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * PI / 180.0
}
