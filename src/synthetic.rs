//! Synthetic fleet generator for stress testing and benchmarking.
//!
//! Generates a grid of square zones and a fleet of vessels sailing across
//! it, with optional GPS glitches, reporting gaps and enrichment layers.
//! Output is deterministic for a given seed.
//!
//! Feature-gated behind `synthetic`, not included in production builds.
//!
//! # Example
//!
//! ```rust
//! use transitgraph::synthetic::SyntheticFleet;
//! use transitgraph::GpsPoint;
//!
//! let fleet = SyntheticFleet {
//!     origin: GpsPoint::new(44.0, -63.0),
//!     vessel_count: 20,
//!     ..SyntheticFleet::default()
//! };
//!
//! let dataset = fleet.generate();
//! assert_eq!(dataset.tracks.len(), 20);
//! assert_eq!(dataset.zones.len(), 16);
//! ```

use std::f64::consts::PI;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::geo_utils::{meters_to_deg_lat, meters_to_degrees};
use crate::geofence::{Domain, Zone};
use crate::{GpsPoint, Result, Track, VesselInfo};

// ============================================================================
// Types
// ============================================================================

/// Fleet and zone layout to generate.
#[derive(Debug, Clone)]
pub struct SyntheticFleet {
    /// South-west corner of the zone grid.
    pub origin: GpsPoint,
    /// Zone grid columns and rows.
    pub grid: (usize, usize),
    /// Side length of one square zone in meters.
    pub zone_size_meters: f64,
    /// Number of vessels (one track each).
    pub vessel_count: usize,
    /// Positions per vessel.
    pub positions_per_vessel: usize,
    /// Seconds between consecutive reports.
    pub report_interval_secs: i64,
    /// Vessel speed range in knots.
    pub speed_knots: (f64, f64),
    /// Probability that a report is a far-off glitch.
    pub glitch_probability: f64,
    /// Probability of a multi-day reporting gap before a report.
    pub gap_probability: f64,
    /// Attach depth, shore distance and port distance layers.
    pub enriched: bool,
    /// First report time, epoch seconds.
    pub start_time: i64,
    /// RNG seed for deterministic reproduction.
    pub seed: u64,
}

impl Default for SyntheticFleet {
    fn default() -> Self {
        Self {
            origin: GpsPoint::new(44.0, -63.0),
            grid: (4, 4),
            zone_size_meters: 10_000.0,
            vessel_count: 50,
            positions_per_vessel: 200,
            report_interval_secs: 60,
            speed_knots: (6.0, 18.0),
            glitch_probability: 0.01,
            gap_probability: 0.0,
            enriched: true,
            start_time: 1_600_000_000,
            seed: 42,
        }
    }
}

/// Metadata about a generated dataset.
#[derive(Debug, Clone, Default)]
pub struct DatasetMetadata {
    /// Total positions across all tracks.
    pub total_positions: usize,
    /// Glitch reports injected.
    pub glitches: usize,
    /// Reporting gaps injected.
    pub gaps: usize,
}

/// A generated zone grid and fleet.
pub struct SyntheticDataset {
    /// Zones named `Z0`, `Z1`, ... in row-major order.
    pub zones: Vec<Zone>,
    /// One track per vessel, MMSIs ascending.
    pub tracks: Vec<Track>,
    pub metadata: DatasetMetadata,
}

impl SyntheticDataset {
    /// A domain over the generated zones.
    pub fn domain(&self, name: &str) -> Result<Domain> {
        Domain::new(name, self.zones.clone())
    }
}

// ============================================================================
// Generation
// ============================================================================

const MPS_PER_KNOT: f64 = 0.514_444;
const GAP_SECONDS: i64 = 8 * 24 * 3600;
const SHIP_TYPES: [&str; 4] = ["Cargo", "Tanker", "Fishing", "Passenger"];

fn zone_grid(fleet: &SyntheticFleet) -> Vec<Zone> {
    let (cols, rows) = fleet.grid;
    let dlat = meters_to_deg_lat(fleet.zone_size_meters);
    let dlng = meters_to_degrees(fleet.zone_size_meters, fleet.origin.latitude);

    let mut zones = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            let lat0 = fleet.origin.latitude + row as f64 * dlat;
            let lng0 = fleet.origin.longitude + col as f64 * dlng;
            zones.push(Zone::from_exterior(
                format!("Z{}", row * cols + col),
                &[
                    (lng0, lat0),
                    (lng0 + dlng, lat0),
                    (lng0 + dlng, lat0 + dlat),
                    (lng0, lat0 + dlat),
                ],
            ));
        }
    }
    zones
}

fn vessel_info(index: usize, rng: &mut StdRng) -> VesselInfo {
    // Every fifth name carries a comma to exercise field quoting
    let vessel_name = if index % 5 == 0 {
        format!("SEA, STAR {}", index)
    } else {
        format!("VESSEL {}", index)
    };
    VesselInfo {
        imo: Some(9_000_000 + index as u32),
        vessel_name: Some(vessel_name),
        ship_type_txt: Some(SHIP_TYPES[index % SHIP_TYPES.len()].to_string()),
        dim_bow: Some(rng.gen_range(20.0..200.0)),
        dim_stern: Some(rng.gen_range(5.0..50.0)),
        submerged_hull_m2: None,
        label: None,
    }
}

impl SyntheticFleet {
    /// Generate the zone grid and every vessel track.
    pub fn generate(&self) -> SyntheticDataset {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let zones = zone_grid(self);
        let mut metadata = DatasetMetadata::default();

        let (cols, rows) = self.grid;
        let width = cols as f64 * self.zone_size_meters;
        let height = rows as f64 * self.zone_size_meters;

        let mut tracks = Vec::with_capacity(self.vessel_count);
        for index in 0..self.vessel_count {
            let mmsi = 316_000_000 + index as u32;
            let info = vessel_info(index, &mut rng);

            // Position in meters east/north of the grid origin
            let mut x = rng.gen_range(0.0..width.max(1.0));
            let mut y = rng.gen_range(0.0..height.max(1.0));
            let mut heading: f64 = rng.gen_range(0.0..(2.0 * PI));
            let speed = rng.gen_range(self.speed_knots.0..=self.speed_knots.1) * MPS_PER_KNOT;

            let n = self.positions_per_vessel;
            let mut time = Vec::with_capacity(n);
            let mut lon = Vec::with_capacity(n);
            let mut lat = Vec::with_capacity(n);
            let mut t = self.start_time;

            for i in 0..n {
                if i > 0 {
                    t += self.report_interval_secs;
                    if rng.gen_bool(self.gap_probability) {
                        t += GAP_SECONDS;
                        metadata.gaps += 1;
                    }
                    heading += rng.gen_range(-0.1..0.1);
                    let step = speed * self.report_interval_secs as f64;
                    x += step * heading.cos();
                    y += step * heading.sin();

                    // Turn back toward the grid when sailing off it
                    if !(0.0..=width).contains(&x) || !(0.0..=height).contains(&y) {
                        heading += PI;
                    }
                }

                let mut p_lat = self.origin.latitude + meters_to_deg_lat(y);
                let mut p_lng = self.origin.longitude + meters_to_degrees(x, self.origin.latitude);
                if i > 0 && rng.gen_bool(self.glitch_probability) {
                    p_lat += rng.gen_range(2.0..5.0);
                    p_lng += rng.gen_range(2.0..5.0);
                    metadata.glitches += 1;
                }

                time.push(t);
                lon.push(p_lng);
                lat.push(p_lat);
            }

            let mut track = Track::new(mmsi, time, lon, lat).with_info(info);
            if self.enriched {
                track = enrich(track, &mut rng);
            }
            metadata.total_positions += track.len();
            tracks.push(track);
        }

        SyntheticDataset {
            zones,
            tracks,
            metadata,
        }
    }
}

/// Attach smooth depth, shore and port distance layers.
///
/// Depth dips below zero now and then so clamping is exercised.
fn enrich(track: Track, rng: &mut StdRng) -> Track {
    let phase: f64 = rng.r#gen::<f64>() * 2.0 * PI;
    let n = track.len();
    let wave = |i: usize, period: f64| ((i as f64) / period + phase).sin();

    let depth = (0..n).map(|i| 40.0 * wave(i, 25.0) + 30.0).collect();
    let shore = (0..n).map(|i| 25.0 * wave(i, 40.0) + 26.0).collect();
    let port = (0..n).map(|i| 60.0 * wave(i, 60.0) + 61.0).collect();

    track
        .with_depth(depth)
        .with_shore_distance(shore)
        .with_port_distance(port)
}
