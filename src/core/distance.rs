use geo::{HaversineDistance, Point};
use crate::models::Coordinate;

/// Meters in one statute mile
const METERS_PER_MILE: f64 = 1609.344;

impl From<Coordinate> for Point<f64> {
    fn from(c: Coordinate) -> Self {
        Point::new(c.longitude, c.latitude)
    }
}

/// Great-circle distance between two coordinates in miles
///
/// # Arguments
/// * `from` - First coordinate in degrees
/// * `to` - Second coordinate in degrees
///
/// # Returns
/// Distance in statute miles. Identical coordinates yield exactly `0.0`.
#[inline]
pub fn haversine_miles(from: Coordinate, to: Coordinate) -> f64 {
    let a: Point<f64> = from.into();
    let b: Point<f64> = to.into();
    a.haversine_distance(&b) / METERS_PER_MILE
}

/// Check whether `candidate` lies within `radius_miles` of `reference` (inclusive)
#[inline]
pub fn is_within_radius(reference: Coordinate, candidate: Coordinate, radius_miles: f64) -> bool {
    haversine_miles(reference, candidate) <= radius_miles
}
