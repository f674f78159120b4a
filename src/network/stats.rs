//! Per-run statistics over a track's index subset.

use chrono::{DateTime, Utc};

use crate::geo_utils::{delta_knots, delta_meters, haversine};
use crate::{GraphError, Result, Track};

/// Shore distance bands in kilometres, as `(near, far)` inclusive bounds.
pub const SHORE_BANDS: [(f64, f64); 3] = [(0.01, 5.0), (0.03, 20.0), (0.1, 50.0)];

/// Largest gap in seconds between two in-band samples of one band segment.
pub const BAND_MAX_GAP_SECONDS: i64 = 60;

/// Timestamp format of the first/last seen columns.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Minimum, mean and maximum of a sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MinAvgMax {
    pub min: f64,
    pub avg: f64,
    pub max: f64,
}

impl MinAvgMax {
    /// Summarize a sample; `None` when it is empty.
    pub fn of(values: impl IntoIterator<Item = f64>) -> Option<Self> {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for v in values {
            count += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }
        (count > 0).then(|| MinAvgMax {
            min,
            avg: sum / count as f64,
            max,
        })
    }
}

/// Strip quotes, backticks and commas from a vessel name. A bare `"0"`
/// (the placeholder some sources emit) becomes empty.
pub fn sanitize_vessel_name(name: &str) -> String {
    if name == "0" {
        return String::new();
    }
    name.chars()
        .filter(|c| !matches!(c, '\'' | '"' | '`' | ','))
        .collect()
}

/// Numeric zone id from a possibly decorated zone name (`"Zone 12a"` -> 12).
///
/// `None` when the name has no digits or the id does not fit.
pub fn zone_number(label: &str) -> Option<u64> {
    let digits: String = label.chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}

/// Convert epoch seconds to a UTC datetime.
pub fn epoch_to_utc(epoch: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(epoch, 0).ok_or(GraphError::InvalidTimestamp(epoch))
}

/// Great-circle distance between the first and last position.
pub fn total_distance_meters(track: &Track, indices: &[usize]) -> f64 {
    match (indices.first(), indices.last()) {
        (Some(&a), Some(&b)) => haversine(track.lon[a], track.lat[a], track.lon[b], track.lat[b]),
        _ => 0.0,
    }
}

/// Sum of great-circle distances over consecutive positions.
pub fn cumulative_distance_meters(track: &Track, indices: &[usize]) -> f64 {
    delta_meters(track, indices).iter().sum()
}

/// Summary of an optional per-position attribute over `indices`.
pub fn attribute_stats(values: Option<&Vec<f64>>, indices: &[usize]) -> Option<MinAvgMax> {
    let values = values?;
    MinAvgMax::of(indices.iter().map(|&i| values[i]))
}

/// Depth summary with topographic heights (negative depths) clamped to zero.
pub fn depth_stats(track: &Track, indices: &[usize]) -> Option<MinAvgMax> {
    let depth = track.depth_metres.as_ref()?;
    MinAvgMax::of(indices.iter().map(|&i| depth[i].max(0.0)))
}

/// Velocity summary in knots; `None` with fewer than two positions.
pub fn velocity_stats(track: &Track, indices: &[usize]) -> Option<MinAvgMax> {
    if indices.len() < 2 {
        return None;
    }
    MinAvgMax::of(delta_knots(track, indices))
}

/// Elapsed minutes between first and last position; `None` for one position.
pub fn minutes_spent(track: &Track, indices: &[usize]) -> Option<f64> {
    match indices {
        [first, .., last] => Some((track.time[*last] - track.time[*first]) as f64 / 60.0),
        _ => None,
    }
}

/// Minutes spent within a shore distance band.
///
/// In-band samples form segments broken wherever consecutive samples are
/// more than [`BAND_MAX_GAP_SECONDS`] apart. Reports arrive about once a
/// minute, so each in-band sample of a segment counts as one minute, a lone
/// sample included. `None` when shore distance is absent.
pub fn shore_band_minutes(track: &Track, indices: &[usize], near: f64, far: f64) -> Option<f64> {
    let shore = track.km_from_shore.as_ref()?;
    let times: Vec<i64> = indices
        .iter()
        .filter(|&&i| (near..=far).contains(&shore[i]))
        .map(|&i| track.time[i])
        .collect();

    let samples: usize = times
        .chunk_by(|a, b| b - a <= BAND_MAX_GAP_SECONDS)
        .map(<[i64]>::len)
        .sum();
    Some(samples as f64)
}
