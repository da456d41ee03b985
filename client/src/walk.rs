//! Small helpers for moving a position by a number of meters

use rand::Rng;
use shared::{Coordinate, EARTH_RADIUS_METERS};

/// Moves `origin` by the given meters north and east (flat-Earth
/// approximation, accurate over the short distances used here).
pub fn offset(origin: Coordinate, north_meters: f64, east_meters: f64) -> Coordinate {
    let delta_lat = (north_meters / EARTH_RADIUS_METERS).to_degrees();
    let delta_lon =
        (east_meters / (EARTH_RADIUS_METERS * origin.latitude.to_radians().cos())).to_degrees();

    Coordinate::new(origin.latitude + delta_lat, origin.longitude + delta_lon)
}

/// Random position within `max_meters` north/south and east/west of `origin`
pub fn jitter<R: Rng>(origin: Coordinate, max_meters: f64, rng: &mut R) -> Coordinate {
    if max_meters <= 0.0 {
        return origin;
    }

    let north = rng.gen_range(-max_meters..=max_meters);
    let east = rng.gen_range(-max_meters..=max_meters);
    offset(origin, north, east)
}
