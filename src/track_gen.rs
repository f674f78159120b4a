//! Assemble per-vessel tracks from a stream of position reports.
//!
//! Reports arrive ordered by vessel and then by time, the way the storage
//! layer returns them for a time/bounding-box query. Each consecutive run
//! of one MMSI becomes one [`Track`].

use std::iter::Peekable;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{Track, VesselInfo};

/// One decoded position row, optionally enriched with raster layers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionReport {
    pub mmsi: u32,
    /// Epoch seconds
    pub time: i64,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub depth_metres: Option<f64>,
    #[serde(default)]
    pub km_from_shore: Option<f64>,
    #[serde(default)]
    pub km_from_port: Option<f64>,
    #[serde(default)]
    pub imo: Option<u32>,
    #[serde(default)]
    pub vessel_name: Option<String>,
    #[serde(default)]
    pub ship_type_txt: Option<String>,
    #[serde(default)]
    pub dim_bow: Option<f64>,
    #[serde(default)]
    pub dim_stern: Option<f64>,
    #[serde(default, rename = "submerged_hull_m^2", alias = "submerged_hull_m2")]
    pub submerged_hull_m2: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
}

impl PositionReport {
    /// A bare position without enrichment or static data.
    pub fn new(mmsi: u32, time: i64, lon: f64, lat: f64) -> Self {
        Self {
            mmsi,
            time,
            lon,
            lat,
            depth_metres: None,
            km_from_shore: None,
            km_from_port: None,
            imo: None,
            vessel_name: None,
            ship_type_txt: None,
            dim_bow: None,
            dim_stern: None,
            submerged_hull_m2: None,
            label: None,
        }
    }
}

/// Lazily group an MMSI-ordered report stream into tracks.
///
/// # Example
/// ```
/// use transitgraph::{PositionReport, assemble_tracks};
///
/// let rows = vec![
///     PositionReport::new(1, 0, -63.5, 44.6),
///     PositionReport::new(1, 60, -63.4, 44.6),
///     PositionReport::new(2, 0, -60.0, 45.0),
/// ];
/// let tracks: Vec<_> = assemble_tracks(rows).collect();
/// assert_eq!(tracks.len(), 2);
/// assert_eq!(tracks[0].len(), 2);
/// ```
pub fn assemble_tracks<I>(rows: I) -> TrackAssembler<I::IntoIter>
where
    I: IntoIterator<Item = PositionReport>,
{
    TrackAssembler {
        rows: rows.into_iter().peekable(),
    }
}

/// Iterator returned by [`assemble_tracks`].
pub struct TrackAssembler<I: Iterator<Item = PositionReport>> {
    rows: Peekable<I>,
}

impl<I: Iterator<Item = PositionReport>> Iterator for TrackAssembler<I> {
    type Item = Track;

    fn next(&mut self) -> Option<Track> {
        let first = self.rows.next()?;
        let mmsi = first.mmsi;
        let mut group = vec![first];
        while let Some(row) = self.rows.next_if(|r| r.mmsi == mmsi) {
            group.push(row);
        }
        Some(build_track(mmsi, group))
    }
}

/// Keep an enrichment column only when every row carries a value.
fn complete_column(rows: &[PositionReport], get: fn(&PositionReport) -> Option<f64>) -> Option<Vec<f64>> {
    rows.iter().map(get).collect()
}

fn last_some<T>(rows: &[PositionReport], get: impl Fn(&PositionReport) -> Option<T>) -> Option<T> {
    rows.iter().rev().find_map(get)
}

fn build_track(mmsi: u32, rows: Vec<PositionReport>) -> Track {
    let info = VesselInfo {
        imo: last_some(&rows, |r| r.imo),
        vessel_name: last_some(&rows, |r| r.vessel_name.clone().filter(|s| !s.is_empty())),
        ship_type_txt: last_some(&rows, |r| r.ship_type_txt.clone().filter(|s| !s.is_empty())),
        dim_bow: last_some(&rows, |r| r.dim_bow),
        dim_stern: last_some(&rows, |r| r.dim_stern),
        submerged_hull_m2: last_some(&rows, |r| r.submerged_hull_m2),
        label: last_some(&rows, |r| r.label.clone().filter(|s| !s.is_empty())),
    };

    let depth_metres = complete_column(&rows, |r| r.depth_metres);
    let km_from_shore = complete_column(&rows, |r| r.km_from_shore);
    let km_from_port = complete_column(&rows, |r| r.km_from_port);

    if km_from_shore.is_none() && rows.iter().any(|r| r.km_from_shore.is_some()) {
        debug!("[TrackGen] vessel {} has partial shore distance, dropping column", mmsi);
    }

    Track {
        mmsi,
        info,
        time: rows.iter().map(|r| r.time).collect(),
        lon: rows.iter().map(|r| r.lon).collect(),
        lat: rows.iter().map(|r| r.lat).collect(),
        depth_metres,
        km_from_shore,
        km_from_port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_enrichment_is_dropped() {
        let mut a = PositionReport::new(7, 0, 0.0, 0.0);
        a.km_from_shore = Some(1.0);
        a.depth_metres = Some(20.0);
        let mut b = PositionReport::new(7, 60, 0.1, 0.0);
        b.depth_metres = Some(-3.0);

        let track = assemble_tracks(vec![a, b]).next().unwrap();
        assert_eq!(track.depth_metres, Some(vec![20.0, -3.0]));
        assert!(track.km_from_shore.is_none());
    }

    #[test]
    fn test_static_info_takes_last_value() {
        let mut a = PositionReport::new(9, 0, 0.0, 0.0);
        a.vessel_name = Some("OLD NAME".to_string());
        let mut b = PositionReport::new(9, 60, 0.0, 0.0);
        b.vessel_name = Some("NEW NAME".to_string());
        b.dim_bow = Some(100.0);
        let c = PositionReport::new(9, 120, 0.0, 0.0);

        let track = assemble_tracks(vec![a, b, c]).next().unwrap();
        assert_eq!(track.info.vessel_name.as_deref(), Some("NEW NAME"));
        assert_eq!(track.info.dim_bow, Some(100.0));
        assert_eq!(track.info.dim_stern, None);
    }
}
