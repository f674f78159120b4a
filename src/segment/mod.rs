//! # Trajectory Segmentation
//!
//! Removes spurious jumps from a vessel trajectory (GPS glitches, message
//! gaps, MMSI collisions) while keeping genuine continuous motion intact.
//!
//! ## Algorithm
//! 1. Hard time cut wherever consecutive positions are more than `cuttime`
//!    seconds apart. Time-cut pieces are never rejoined.
//! 2. Within each piece, split wherever the step distance exceeds
//!    `cutdistance` or the implied speed exceeds `cutknots`.
//! 3. Walk the candidate fragments in order. Each fragment is attached to
//!    the earlier pathway with the best rejoin score (see [`score`]), or
//!    starts a new pathway when no score reaches `minscore`.
//! 4. Each pathway becomes one output track. Positions are never
//!    reordered and every input position lands in exactly one pathway.

pub mod score;

use std::ops::Range;

use log::debug;

use crate::geo_utils::{haversine, knots};
use crate::{SegmentConfig, Track};

pub use score::{PathwayCandidate, pathway_score, quantize_score, rejoin_score, select_pathway};

/// Split a track wherever consecutive timestamps are more than `cuttime`
/// seconds apart.
///
/// A track without such gaps is returned unchanged as the only piece.
pub fn split_timegaps(track: Track, cuttime: f64) -> Vec<Track> {
    let cuts: Vec<usize> = (1..track.len())
        .filter(|&i| (track.time[i] - track.time[i - 1]) as f64 > cuttime)
        .collect();
    if cuts.is_empty() {
        return vec![track];
    }

    let mut pieces = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        pieces.push(track.slice(start..cut));
        start = cut;
    }
    pieces.push(track.slice(start..track.len()));
    pieces
}

/// Candidate fragments: index ranges separated by implausible steps.
pub fn split_distance(track: &Track, config: &SegmentConfig) -> Vec<Range<usize>> {
    let n = track.len();
    if n == 0 {
        return Vec::new();
    }

    let mut fragments = Vec::new();
    let mut start = 0;
    for i in 1..n {
        let meters = haversine(track.lon[i - 1], track.lat[i - 1], track.lon[i], track.lat[i]);
        let seconds = (track.time[i] - track.time[i - 1]) as f64;
        if meters > config.cutdistance || knots(meters, seconds) > config.cutknots {
            fragments.push(start..i);
            start = i;
        }
    }
    fragments.push(start..n);
    fragments
}

/// Assign candidate fragments to pathways by rejoin score.
///
/// Returns index lists, one per pathway, ordered by their first index.
pub fn rejoin_fragments(
    track: &Track,
    fragments: &[Range<usize>],
    config: &SegmentConfig,
) -> Vec<Vec<usize>> {
    let mut pathways: Vec<Vec<usize>> = Vec::new();

    for fragment in fragments {
        let candidates: Vec<PathwayCandidate> = pathways
            .iter()
            .map(|pathway| PathwayCandidate {
                score: pathway_score(track, pathway, fragment.start, config),
                last_index: pathway[pathway.len() - 1],
            })
            .collect();

        match select_pathway(&candidates, config.minscore) {
            Some(best) => pathways[best].extend(fragment.clone()),
            None => pathways.push(fragment.clone().collect()),
        }
    }

    pathways
}

/// Distance split and rejoin for one time-bounded track.
fn split_and_rejoin(track: Track, config: &SegmentConfig) -> Vec<Track> {
    let fragments = split_distance(&track, config);
    if fragments.len() <= 1 {
        return vec![track];
    }

    let pathways = rejoin_fragments(&track, &fragments, config);
    debug!(
        "[Segment] vessel {}: {} fragments rejoined into {} pathways",
        track.mmsi,
        fragments.len(),
        pathways.len()
    );

    pathways.iter().map(|p| track.select(p)).collect()
}

/// Full segmentation of one trajectory: time cut, then distance split and
/// rejoin within each time-bounded piece.
pub fn segment_track(track: Track, config: &SegmentConfig) -> Vec<Track> {
    split_timegaps(track, config.cuttime)
        .into_iter()
        .flat_map(|piece| split_and_rejoin(piece, config))
        .collect()
}

/// Apply the distance split and rejoin to every track of a stream.
///
/// Unlike [`segment_track`], no time cut is applied; compose with
/// [`split_timegaps`] when needed.
pub fn encode_greatcircledistance<'a, I>(
    tracks: I,
    config: &'a SegmentConfig,
) -> impl Iterator<Item = Track> + 'a
where
    I: IntoIterator<Item = Track>,
    I::IntoIter: 'a,
{
    tracks
        .into_iter()
        .flat_map(move |track| split_and_rejoin(track, config))
}
