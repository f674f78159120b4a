//! # Transit Graph
//!
//! Vessel traffic network graphs from AIS trajectories.
//!
//! Nodes of the graph are user-defined geographic zones; edges are
//! aggregated statistics describing vessel transits between zones.
//!
//! This library provides:
//! - Trajectory segmentation with noise-tolerant fragment rejoining
//! - Geofencing and zone-transition detection
//! - Per-transit statistics (distance, speed, depth, shore/port distance, dwell time)
//! - Per-vessel intermediate edge stores written by parallel workers
//! - Aggregation of all stores into one filtered edge table
//!
//! ## Features
//!
//! - **`parallel`** - Fan out the per-vessel pipeline with rayon
//! - **`synthetic`** - Synthetic fleet generator for tests and benchmarks
//!
//! ## Quick Start
//!
//! ```rust
//! use transitgraph::geofence::{Domain, Zone, fence_track, transit_runs};
//! use transitgraph::Track;
//!
//! let domain = Domain::new(
//!     "harbour",
//!     vec![
//!         Zone::from_exterior("Z1", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]),
//!         Zone::from_exterior("Z2", &[(1.0, 0.0), (2.0, 0.0), (2.0, 1.0), (1.0, 1.0)]),
//!     ],
//! )
//! .unwrap();
//!
//! let track = Track::new(
//!     316_001_234,
//!     vec![0, 600, 1200, 1800],
//!     vec![0.5, 0.9, 1.1, 1.5],
//!     vec![0.5, 0.5, 0.5, 0.5],
//! );
//!
//! let labeled = fence_track(track, &domain);
//! let runs = transit_runs(&labeled.in_zone);
//! assert_eq!(runs.len(), 2);
//! assert_eq!(runs[0].destination.label(), Some("Z2"));
//! assert!(runs[1].destination.is_open());
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{GraphError, OptionExt, Result};

// Geographic utilities (distance, speed, bounds)
pub mod geo_utils;

// Pipeline configuration
pub mod config;
pub use config::{GraphConfig, OutputConfig, SegmentConfig};

// Position rows -> per-vessel tracks
pub mod track_gen;
pub use track_gen::{PositionReport, assemble_tracks};

// Trajectory segmentation and fragment rejoining
pub mod segment;
pub use segment::{encode_greatcircledistance, segment_track, split_timegaps};

// Zones, domains and the point-in-zone oracle
pub mod geofence;
pub use geofence::{
    Destination, Domain, Geofence, LabeledTrack, TransitRun, Zone, ZoneLabel, ZoneSpec,
    fence_track, transit_runs,
};

// Network edges: serialization, stores, dispatch and aggregation
pub mod network;
pub use network::{
    AggregateSummary, DispatchSummary, EdgeFilter, EdgeStoreReader, EdgeStoreWriter, NetworkEdge,
    aggregate_output, graph, graph_with_progress, process_track, serialize_network_edges,
};

// Progress reporting for long-running pipeline phases
pub mod progress;
pub use progress::{AtomicProgressTracker, NoopProgress, PipelinePhase, PipelineProgressCallback};

// Synthetic fleet generator
#[cfg(feature = "synthetic")]
pub mod synthetic;

// ============================================================================
// Core Types
// ============================================================================

/// A GPS coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use transitgraph::GpsPoint;
/// let point = GpsPoint::new(44.6488, -63.5752); // Halifax
/// assert!(point.is_valid());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GpsPoint {
    /// Create a new GPS point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Smallest box containing both boxes.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_lat: self.min_lat.min(other.min_lat),
            max_lat: self.max_lat.max(other.max_lat),
            min_lng: self.min_lng.min(other.min_lng),
            max_lng: self.max_lng.max(other.max_lng),
        }
    }
}

/// Static (categorical) vessel information.
///
/// Every field is optional; report sources rarely carry all of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VesselInfo {
    pub imo: Option<u32>,
    pub vessel_name: Option<String>,
    /// Ship type as descriptive text (e.g. "Cargo", "Tanker")
    pub ship_type_txt: Option<String>,
    /// Distance from the GPS antenna to the bow, meters
    pub dim_bow: Option<f64>,
    /// Distance from the GPS antenna to the stern, meters
    pub dim_stern: Option<f64>,
    /// Submerged hull surface area, square meters
    pub submerged_hull_m2: Option<f64>,
    /// Free-form user label
    pub label: Option<String>,
}

/// One vessel's trajectory as parallel sequences indexed by position.
///
/// Invariants (checked by [`Track::validate`]): every parallel sequence has
/// the same length, `time` is non-decreasing and every coordinate is a
/// finite lon/lat in range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub mmsi: u32,
    #[serde(default)]
    pub info: VesselInfo,
    /// Epoch seconds
    pub time: Vec<i64>,
    pub lon: Vec<f64>,
    pub lat: Vec<f64>,
    /// Bathymetric depth, positive below sea level
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depth_metres: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km_from_shore: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub km_from_port: Option<Vec<f64>>,
}

impl Track {
    /// Create a track with positions only.
    pub fn new(mmsi: u32, time: Vec<i64>, lon: Vec<f64>, lat: Vec<f64>) -> Self {
        Self {
            mmsi,
            info: VesselInfo::default(),
            time,
            lon,
            lat,
            depth_metres: None,
            km_from_shore: None,
            km_from_port: None,
        }
    }

    pub fn with_info(mut self, info: VesselInfo) -> Self {
        self.info = info;
        self
    }

    pub fn with_depth(mut self, depth_metres: Vec<f64>) -> Self {
        self.depth_metres = Some(depth_metres);
        self
    }

    pub fn with_shore_distance(mut self, km_from_shore: Vec<f64>) -> Self {
        self.km_from_shore = Some(km_from_shore);
        self
    }

    pub fn with_port_distance(mut self, km_from_port: Vec<f64>) -> Self {
        self.km_from_port = Some(km_from_port);
        self
    }

    /// Number of positions.
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Position `i` as a GPS point.
    pub fn point(&self, i: usize) -> GpsPoint {
        GpsPoint::new(self.lat[i], self.lon[i])
    }

    /// Check the parallel-sequence invariants.
    pub fn validate(&self) -> Result<()> {
        let n = self.time.len();
        let inconsistent = |reason: String| GraphError::InconsistentTrack {
            mmsi: self.mmsi,
            reason,
        };

        let optional = [
            ("depth_metres", &self.depth_metres),
            ("km_from_shore", &self.km_from_shore),
            ("km_from_port", &self.km_from_port),
        ];
        if self.lon.len() != n || self.lat.len() != n {
            return Err(inconsistent(format!(
                "time/lon/lat lengths differ ({}/{}/{})",
                n,
                self.lon.len(),
                self.lat.len()
            )));
        }
        for (name, values) in optional {
            if let Some(values) = values {
                if values.len() != n {
                    return Err(inconsistent(format!(
                        "{} has {} values for {} positions",
                        name,
                        values.len(),
                        n
                    )));
                }
            }
        }
        if let Some(i) = (1..n).find(|&i| self.time[i] < self.time[i - 1]) {
            return Err(inconsistent(format!("time decreases at index {}", i)));
        }
        if let Some(i) = (0..n).find(|&i| !self.point(i).is_valid()) {
            return Err(inconsistent(format!(
                "invalid coordinate ({}, {}) at index {}",
                self.lon[i], self.lat[i], i
            )));
        }
        Ok(())
    }

    /// Build a new track from the positions at `indices`, in the given order.
    ///
    /// Static information and the vessel identifier are carried over.
    pub fn select(&self, indices: &[usize]) -> Track {
        let pick_f64 = |values: &Vec<f64>| indices.iter().map(|&i| values[i]).collect::<Vec<_>>();
        Track {
            mmsi: self.mmsi,
            info: self.info.clone(),
            time: indices.iter().map(|&i| self.time[i]).collect(),
            lon: pick_f64(&self.lon),
            lat: pick_f64(&self.lat),
            depth_metres: self.depth_metres.as_ref().map(pick_f64),
            km_from_shore: self.km_from_shore.as_ref().map(pick_f64),
            km_from_port: self.km_from_port.as_ref().map(pick_f64),
        }
    }

    /// Build a new track from a contiguous index range.
    pub fn slice(&self, range: std::ops::Range<usize>) -> Track {
        let indices: Vec<usize> = range.collect();
        self.select(&indices)
    }
}
