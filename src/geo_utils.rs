//! Geographic utilities: great-circle distance, speed and degree conversion.

use crate::Track;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Conversion factor from meters per second to knots.
pub const KNOTS_PER_MPS: f64 = 1.943_844_492_440_6;

/// Meters per degree of latitude (approximately constant).
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// Great-circle distance in meters between two lon/lat pairs (degrees).
pub fn haversine(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * a.sqrt().min(1.0).asin()
}

/// Speed in knots for a distance covered in an elapsed time.
///
/// Elapsed time is clamped to at least one second so that duplicate
/// timestamps yield a finite (large) speed instead of infinity.
pub fn knots(meters: f64, seconds: f64) -> f64 {
    meters / seconds.max(1.0) * KNOTS_PER_MPS
}

/// Distances in meters between consecutive positions of `indices`.
///
/// Returns one value per consecutive pair, so `indices.len() - 1` values.
pub fn delta_meters(track: &Track, indices: &[usize]) -> Vec<f64> {
    indices
        .windows(2)
        .map(|w| haversine(track.lon[w[0]], track.lat[w[0]], track.lon[w[1]], track.lat[w[1]]))
        .collect()
}

/// Elapsed seconds between consecutive positions of `indices`.
pub fn delta_seconds(track: &Track, indices: &[usize]) -> Vec<f64> {
    indices
        .windows(2)
        .map(|w| (track.time[w[1]] - track.time[w[0]]) as f64)
        .collect()
}

/// Speed in knots between consecutive positions of `indices`.
pub fn delta_knots(track: &Track, indices: &[usize]) -> Vec<f64> {
    delta_meters(track, indices)
        .into_iter()
        .zip(delta_seconds(track, indices))
        .map(|(m, s)| knots(m, s))
        .collect()
}

/// Convert a distance in meters to degrees of longitude at a latitude.
pub fn meters_to_degrees(meters: f64, latitude: f64) -> f64 {
    let meters_per_deg = METERS_PER_DEG_LAT * latitude.to_radians().cos();
    if meters_per_deg.abs() < 1e-10 {
        return 0.0;
    }
    meters / meters_per_deg
}

/// Convert a distance in meters to degrees of latitude.
pub fn meters_to_deg_lat(meters: f64) -> f64 {
    meters / METERS_PER_DEG_LAT
}
