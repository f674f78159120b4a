//! Zones, domains and zone-transition detection.
//!
//! A [`Domain`] is an immutable, ordered set of named [`Zone`]s: the nodes
//! of the network graph. It answers "which zone contains this point" via
//! the [`Geofence`] trait, using an R-tree of zone envelopes as a
//! pre-filter before exact point-in-polygon tests.
//!
//! [`fence_track`] labels every position of a track with its zone and
//! [`transit_runs`] cuts the label sequence into transit runs.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geo::{BoundingRect, Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use rstar::{AABB, RTree, RTreeObject};
use serde::{Deserialize, Serialize};

use crate::{Bounds, GraphError, Result, Track};

/// Text used for positions outside every zone.
pub const NO_ZONE: &str = "none";

/// Zone label of one position: the enclosing zone's name, or `None`.
pub type ZoneLabel = Option<String>;

/// Render a label, using [`NO_ZONE`] for positions outside every zone.
pub fn label_text(label: &ZoneLabel) -> &str {
    label.as_deref().unwrap_or(NO_ZONE)
}

/// Point-in-zone oracle.
///
/// Implementations decide how overlapping zones resolve; [`Domain`]
/// returns the first zone in domain order.
pub trait Geofence: Send + Sync {
    /// Name of the zone containing the point, if any.
    fn zone_at(&self, lon: f64, lat: f64) -> Option<&str>;
}

// ============================================================================
// Zones
// ============================================================================

/// A named polygon (or polygon set).
#[derive(Debug, Clone)]
pub struct Zone {
    name: String,
    geometry: MultiPolygon<f64>,
    bounds: Option<Bounds>,
}

impl Zone {
    pub fn new(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let bounds = geometry.bounding_rect().map(|rect| Bounds {
            min_lat: rect.min().y,
            max_lat: rect.max().y,
            min_lng: rect.min().x,
            max_lng: rect.max().x,
        });
        Self {
            name: name.into(),
            geometry,
            bounds,
        }
    }

    /// A single polygon without holes from `(lon, lat)` vertices.
    ///
    /// The ring is closed automatically.
    pub fn from_exterior(name: impl Into<String>, ring: &[(f64, f64)]) -> Self {
        let exterior: LineString<f64> = ring.iter().map(|&(x, y)| Coord { x, y }).collect();
        Self::new(name, MultiPolygon::new(vec![Polygon::new(exterior, vec![])]))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// Bounding box, `None` for an empty geometry.
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounds
    }

    /// Exact point-in-polygon test.
    pub fn contains(&self, lon: f64, lat: f64) -> bool {
        self.geometry.contains(&Point::new(lon, lat))
    }
}

/// Serialized zone definition: a name and one or more polygons given as
/// `[lon, lat]` rings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneSpec {
    pub name: String,
    pub polygons: Vec<PolygonSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolygonSpec {
    pub exterior: Vec<[f64; 2]>,
    #[serde(default)]
    pub interiors: Vec<Vec<[f64; 2]>>,
}

fn ring(points: &[[f64; 2]]) -> LineString<f64> {
    points.iter().map(|&[x, y]| Coord { x, y }).collect()
}

impl From<ZoneSpec> for Zone {
    fn from(spec: ZoneSpec) -> Self {
        let polygons = spec
            .polygons
            .iter()
            .map(|p| Polygon::new(ring(&p.exterior), p.interiors.iter().map(|r| ring(r)).collect()))
            .collect();
        Zone::new(spec.name, MultiPolygon::new(polygons))
    }
}

// ============================================================================
// Domain
// ============================================================================

/// Envelope of one zone in the domain's R-tree.
#[derive(Debug, Clone)]
struct ZoneEnvelope {
    zone: usize,
    bounds: Bounds,
}

impl RTreeObject for ZoneEnvelope {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(
            [self.bounds.min_lng, self.bounds.min_lat],
            [self.bounds.max_lng, self.bounds.max_lat],
        )
    }
}

/// An immutable, named collection of zones shared read-only by all workers.
#[derive(Debug)]
pub struct Domain {
    name: String,
    zones: Vec<Zone>,
    index: RTree<ZoneEnvelope>,
}

impl Domain {
    /// Build a domain. At least one zone is required.
    pub fn new(name: impl Into<String>, zones: Vec<Zone>) -> Result<Self> {
        let name = name.into();
        if zones.is_empty() {
            return Err(GraphError::EmptyDomain { name });
        }

        let envelopes: Vec<ZoneEnvelope> = zones
            .iter()
            .enumerate()
            .filter_map(|(zone, z)| z.bounds().map(|bounds| ZoneEnvelope { zone, bounds }))
            .collect();

        Ok(Self {
            name,
            zones,
            index: RTree::bulk_load(envelopes),
        })
    }

    /// Build a domain from serialized zone definitions.
    pub fn from_specs(name: impl Into<String>, specs: Vec<ZoneSpec>) -> Result<Self> {
        Self::new(name, specs.into_iter().map(Zone::from).collect())
    }

    /// Load zone definitions from a JSON file holding a list of [`ZoneSpec`].
    pub fn from_json_file(name: impl Into<String>, path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let specs: Vec<ZoneSpec> = serde_json::from_reader(reader)?;
        Self::from_specs(name, specs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    /// Bounding box of every zone, used to size position queries.
    pub fn bounds(&self) -> Option<Bounds> {
        self.zones
            .iter()
            .filter_map(Zone::bounds)
            .reduce(|a, b| a.union(&b))
    }

    /// Index of the first zone (domain order) containing the point.
    pub fn zone_index_at(&self, lon: f64, lat: f64) -> Option<usize> {
        let query = AABB::from_point([lon, lat]);
        self.index
            .locate_in_envelope_intersecting(&query)
            .map(|e| e.zone)
            .filter(|&zone| self.zones[zone].contains(lon, lat))
            .min()
    }
}

impl Geofence for Domain {
    fn zone_at(&self, lon: f64, lat: f64) -> Option<&str> {
        self.zone_index_at(lon, lat).map(|i| self.zones[i].name())
    }
}

// ============================================================================
// Transition detection
// ============================================================================

/// A track with one zone label per position.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledTrack {
    pub track: Track,
    pub in_zone: Vec<ZoneLabel>,
}

impl LabeledTrack {
    /// Attach labels produced elsewhere. Lengths must match.
    pub fn new(track: Track, in_zone: Vec<ZoneLabel>) -> Result<Self> {
        if in_zone.len() != track.len() {
            return Err(GraphError::InconsistentTrack {
                mmsi: track.mmsi,
                reason: format!(
                    "{} zone labels for {} positions",
                    in_zone.len(),
                    track.len()
                ),
            });
        }
        Ok(Self { track, in_zone })
    }
}

/// Label every position of a track with its enclosing zone.
pub fn fence_track<G: Geofence + ?Sized>(track: Track, fence: &G) -> LabeledTrack {
    let in_zone = (0..track.len())
        .map(|i| fence.zone_at(track.lon[i], track.lat[i]).map(str::to_string))
        .collect();
    LabeledTrack { track, in_zone }
}

/// Where a transit run ends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The vessel moved on to another label (possibly outside every zone).
    Zone(ZoneLabel),
    /// The data ends before the vessel leaves the zone.
    Open,
}

impl Destination {
    /// Name of the destination zone, if the run exits into one.
    pub fn label(&self) -> Option<&str> {
        match self {
            Destination::Zone(label) => label.as_deref(),
            Destination::Open => None,
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self, Destination::Open)
    }
}

/// A maximal span of positions sharing one zone label.
///
/// `end` is inclusive: for an exiting run it is the first position inside
/// the destination, so statistics cover the boundary crossing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitRun {
    pub start: usize,
    pub end: usize,
    pub source: ZoneLabel,
    pub destination: Destination,
}

impl TransitRun {
    /// Number of positions covered, boundary included.
    pub fn len(&self) -> usize {
        self.end - self.start + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn indices(&self) -> Vec<usize> {
        (self.start..=self.end).collect()
    }
}

/// Cut a label sequence into transit runs.
///
/// Boundaries are the indices `i` where `labels[i - 1] != labels[i]`. With
/// boundaries `b1 < ... < bm` the runs are `[0, b1]`, `[b1, b2]`, ...,
/// `[bm, n - 1]`; the last run is always [`Destination::Open`]. A sequence
/// without boundaries yields one open run over every position.
pub fn transit_runs(labels: &[ZoneLabel]) -> Vec<TransitRun> {
    if labels.is_empty() {
        return Vec::new();
    }

    let mut runs = Vec::new();
    let mut start = 0;
    for i in 1..labels.len() {
        if labels[i - 1] != labels[i] {
            runs.push(TransitRun {
                start,
                end: i,
                source: labels[start].clone(),
                destination: Destination::Zone(labels[i].clone()),
            });
            start = i;
        }
    }
    runs.push(TransitRun {
        start,
        end: labels.len() - 1,
        source: labels[start].clone(),
        destination: Destination::Open,
    });
    runs
}
