//! Rejoin scoring between trajectory fragments.
//!
//! A score measures how plausible it is that a fragment continues an
//! earlier pathway. It decreases monotonically with both great-circle
//! distance and elapsed time:
//!
//! ```text
//! score = 1 / sqrt(max(d, 1 m) * max(dt, 1 s))
//! ```
//!
//! Steps that exceed the configured distance or speed limits score zero.
//! Scores are quantized to 16-bit floats before comparison, so nearby
//! candidates tie more often; ties go to the most recent pathway.

use half::f16;

use crate::SegmentConfig;
use crate::Track;
use crate::geo_utils::{haversine, knots};

/// A pathway's quantized score against the head of a new fragment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathwayCandidate {
    pub score: f16,
    /// Track index of the pathway's most recent position.
    pub last_index: usize,
}

/// Unquantized score for stepping from position `from` to position `to`.
pub fn rejoin_score(track: &Track, from: usize, to: usize, config: &SegmentConfig) -> f64 {
    let meters = haversine(track.lon[from], track.lat[from], track.lon[to], track.lat[to]);
    let seconds = (track.time[to] - track.time[from]).abs() as f64;

    if meters > config.cutdistance || knots(meters, seconds) > config.cutknots {
        return 0.0;
    }
    1.0 / (meters.max(1.0) * seconds.max(1.0)).sqrt()
}

/// Reduce a score to half precision.
pub fn quantize_score(score: f64) -> f16 {
    f16::from_f64(score)
}

/// Score of a pathway against the first position of a fragment.
///
/// Averages the scores of the two most recent pathway positions to damp
/// noise at the pathway's edge, then quantizes.
pub fn pathway_score(track: &Track, pathway: &[usize], head: usize, config: &SegmentConfig) -> f16 {
    let nearest = &pathway[pathway.len().saturating_sub(2)..];
    if nearest.is_empty() {
        return f16::ZERO;
    }
    let total: f64 = nearest
        .iter()
        .map(|&i| rejoin_score(track, i, head, config))
        .sum();
    quantize_score(total / nearest.len() as f64)
}

/// Pick the best candidate, or `None` when no score reaches `minscore`.
///
/// Highest quantized score wins; equal scores prefer the candidate whose
/// last position is latest in the trajectory.
pub fn select_pathway(candidates: &[PathwayCandidate], minscore: f64) -> Option<usize> {
    let (best, candidate) = candidates.iter().enumerate().max_by(|(_, a), (_, b)| {
        a.score
            .to_f32()
            .total_cmp(&b.score.to_f32())
            .then(a.last_index.cmp(&b.last_index))
    })?;

    if candidate.score.to_f64() < minscore {
        None
    } else {
        Some(best)
    }
}
