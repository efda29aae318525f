use serde::{Deserialize, Serialize};

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Geographic position of a stop, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Great-circle distance in meters between two coordinates.
pub fn distance(from: Coordinates, to: Coordinates) -> f64 {
    if from == to {
        return 0.0;
    }

    let from_lat = from.lat.to_radians();
    let to_lat = to.lat.to_radians();
    let delta_lng = (from.lng - to.lng).abs().to_radians();

    (from_lat.sin() * to_lat.sin() + from_lat.cos() * to_lat.cos() * delta_lng.cos()).acos()
        * EARTH_RADIUS_M
}
