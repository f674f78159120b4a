//! Network edge records: one per transit run.

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use super::stats::{
    MinAvgMax, SHORE_BANDS, TIMESTAMP_FORMAT, attribute_stats, cumulative_distance_meters,
    depth_stats, epoch_to_utc, minutes_spent, sanitize_vessel_name, shore_band_minutes,
    total_distance_meters, velocity_stats, zone_number,
};
use super::store::EdgeStoreWriter;
use crate::geofence::{Destination, LabeledTrack, TransitRun, label_text, transit_runs};
use crate::{Result, Track};

/// Aggregated statistics of one vessel transit through a zone.
///
/// Absent optional attributes stay `None`. Numbers render as `NULL` and
/// text as an empty field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkEdge {
    // static vessel information
    pub mmsi: u32,
    pub imo: Option<u32>,
    pub label: Option<String>,
    pub vessel_name: Option<String>,
    pub vessel_type: Option<String>,
    /// Bow plus stern offset, meters
    pub vessel_length: Option<f64>,
    pub hull_submerged_surface_area: Option<f64>,

    // geofencing
    pub src_zone: Option<u64>,
    /// `None` when the data ends inside the source zone or the vessel
    /// exits into no zone
    pub rcv_zone: Option<u64>,
    /// The data ends inside the source zone. Stored with the record but not
    /// a table column.
    pub open_destination: bool,
    pub transit_nodes: String,
    pub num_datapoints: u32,

    // timestamps of the first and last position
    pub first_seen_in_zone: String,
    pub last_seen_in_zone: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,

    // distance travelled, truncated to whole meters
    pub total_distance_meters: i64,
    pub cumulative_distance_meters: i64,

    pub min_shore_dist: Option<f64>,
    pub avg_shore_dist: Option<f64>,
    pub max_shore_dist: Option<f64>,
    pub min_port_dist: Option<f64>,
    pub avg_port_dist: Option<f64>,
    pub max_port_dist: Option<f64>,
    pub min_depth: Option<f64>,
    pub avg_depth: Option<f64>,
    pub max_depth: Option<f64>,

    pub velocity_knots_min: Option<f64>,
    pub velocity_knots_avg: Option<f64>,
    pub velocity_knots_max: Option<f64>,

    pub minutes_spent_in_zone: Option<f64>,
    pub minutes_within_10m_5km_shoredist: Option<f64>,
    pub minutes_within_30m_20km_shoredist: Option<f64>,
    pub minutes_within_100m_50km_shoredist: Option<f64>,
}

fn split(summary: Option<MinAvgMax>) -> (Option<f64>, Option<f64>, Option<f64>) {
    match summary {
        Some(s) => (Some(s.min), Some(s.avg), Some(s.max)),
        None => (None, None, None),
    }
}

impl NetworkEdge {
    /// Column names in record order.
    pub const FIELDS: [&'static str; 34] = [
        "mmsi",
        "imo",
        "label",
        "vessel_name",
        "vessel_type",
        "vessel_length",
        "hull_submerged_surface_area",
        "src_zone",
        "rcv_zone",
        "transit_nodes",
        "num_datapoints",
        "first_seen_in_zone",
        "last_seen_in_zone",
        "year",
        "month",
        "day",
        "total_distance_meters",
        "cumulative_distance_meters",
        "min_shore_dist",
        "avg_shore_dist",
        "max_shore_dist",
        "min_port_dist",
        "avg_port_dist",
        "max_port_dist",
        "min_depth",
        "avg_depth",
        "max_depth",
        "velocity_knots_min",
        "velocity_knots_avg",
        "velocity_knots_max",
        "minutes_spent_in_zone",
        "minutes_within_10m_5km_shoredist",
        "minutes_within_30m_20km_shoredist",
        "minutes_within_100m_50km_shoredist",
    ];

    /// Reduce one transit run of a labeled track to an edge record.
    pub fn from_run(labeled: &LabeledTrack, run: &TransitRun) -> Result<Self> {
        let track: &Track = &labeled.track;
        let indices = run.indices();
        let info = &track.info;

        let first = epoch_to_utc(track.time[run.start])?;
        let last = epoch_to_utc(track.time[run.end])?;

        let src_text = label_text(&run.source);
        let src_zone = zone_number(src_text);
        let (rcv_zone, transit_nodes) = match &run.destination {
            Destination::Zone(dst) => {
                let dst_text = label_text(dst);
                (zone_number(dst_text), format!("{}_{}", src_text, dst_text))
            }
            Destination::Open => (
                None,
                src_zone.map_or_else(|| src_text.to_string(), |id| id.to_string()),
            ),
        };

        let (min_shore_dist, avg_shore_dist, max_shore_dist) =
            split(attribute_stats(track.km_from_shore.as_ref(), &indices));
        let (min_port_dist, avg_port_dist, max_port_dist) =
            split(attribute_stats(track.km_from_port.as_ref(), &indices));
        let (min_depth, avg_depth, max_depth) = split(depth_stats(track, &indices));
        let (velocity_knots_min, velocity_knots_avg, velocity_knots_max) =
            split(velocity_stats(track, &indices));

        let [near, mid, far] =
            SHORE_BANDS.map(|(lo, hi)| shore_band_minutes(track, &indices, lo, hi));

        Ok(NetworkEdge {
            mmsi: track.mmsi,
            imo: info.imo,
            label: info.label.clone(),
            vessel_name: info.vessel_name.as_deref().map(sanitize_vessel_name),
            vessel_type: info.ship_type_txt.clone(),
            vessel_length: info.dim_bow.zip(info.dim_stern).map(|(bow, stern)| bow + stern),
            hull_submerged_surface_area: info.submerged_hull_m2,
            src_zone,
            rcv_zone,
            open_destination: run.destination.is_open(),
            transit_nodes,
            num_datapoints: indices.len() as u32,
            first_seen_in_zone: first.format(TIMESTAMP_FORMAT).to_string(),
            last_seen_in_zone: last.format(TIMESTAMP_FORMAT).to_string(),
            year: first.year(),
            month: first.month(),
            day: first.day(),
            total_distance_meters: total_distance_meters(track, &indices) as i64,
            cumulative_distance_meters: cumulative_distance_meters(track, &indices) as i64,
            min_shore_dist,
            avg_shore_dist,
            max_shore_dist,
            min_port_dist,
            avg_port_dist,
            max_port_dist,
            min_depth,
            avg_depth,
            max_depth,
            velocity_knots_min,
            velocity_knots_avg,
            velocity_knots_max,
            minutes_spent_in_zone: minutes_spent(track, &indices),
            minutes_within_10m_5km_shoredist: near,
            minutes_within_30m_20km_shoredist: mid,
            minutes_within_100m_50km_shoredist: far,
        })
    }

    /// Field values as text, in [`NetworkEdge::FIELDS`] order.
    ///
    /// Velocities keep 2 decimals and the other floating statistics 4.
    pub fn values(&self) -> Vec<String> {
        fn text(v: &Option<String>) -> String {
            v.clone().unwrap_or_default()
        }
        fn int<T: ToString>(v: &Option<T>) -> String {
            v.as_ref().map_or_else(|| "NULL".to_string(), T::to_string)
        }
        fn f4(v: &Option<f64>) -> String {
            v.map_or_else(|| "NULL".to_string(), |x| format!("{:.4}", x))
        }
        fn f2(v: &Option<f64>) -> String {
            v.map_or_else(|| "NULL".to_string(), |x| format!("{:.2}", x))
        }

        vec![
            self.mmsi.to_string(),
            int(&self.imo),
            text(&self.label),
            text(&self.vessel_name),
            text(&self.vessel_type),
            f4(&self.vessel_length),
            f4(&self.hull_submerged_surface_area),
            int(&self.src_zone),
            int(&self.rcv_zone),
            self.transit_nodes.clone(),
            self.num_datapoints.to_string(),
            self.first_seen_in_zone.clone(),
            self.last_seen_in_zone.clone(),
            self.year.to_string(),
            self.month.to_string(),
            self.day.to_string(),
            self.total_distance_meters.to_string(),
            self.cumulative_distance_meters.to_string(),
            f4(&self.min_shore_dist),
            f4(&self.avg_shore_dist),
            f4(&self.max_shore_dist),
            f4(&self.min_port_dist),
            f4(&self.avg_port_dist),
            f4(&self.max_port_dist),
            f4(&self.min_depth),
            f4(&self.avg_depth),
            f4(&self.max_depth),
            f2(&self.velocity_knots_min),
            f2(&self.velocity_knots_avg),
            f2(&self.velocity_knots_max),
            f4(&self.minutes_spent_in_zone),
            f4(&self.minutes_within_10m_5km_shoredist),
            f4(&self.minutes_within_30m_20km_shoredist),
            f4(&self.minutes_within_100m_50km_shoredist),
        ]
    }

    /// One comma-separated output line (without the newline).
    pub fn to_row(&self) -> String {
        join_row(self.values().iter().map(String::as_str))
    }

    /// The header line matching [`NetworkEdge::to_row`].
    pub fn header() -> String {
        join_row(Self::FIELDS)
    }
}

/// Quote a field when it contains a delimiter, a quote or a line break;
/// embedded quotes are doubled.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn join_row<'a>(fields: impl IntoIterator<Item = &'a str>) -> String {
    fields
        .into_iter()
        .map(escape_field)
        .collect::<Vec<_>>()
        .join(",")
}

/// Edge records for every transit run of a labeled track.
pub fn network_edges(labeled: &LabeledTrack) -> Result<Vec<NetworkEdge>> {
    transit_runs(&labeled.in_zone)
        .iter()
        .map(|run| NetworkEdge::from_run(labeled, run))
        .collect()
}

/// Append one record per transit run to the vessel's store.
///
/// Returns the number of records written.
pub fn serialize_network_edges(labeled: &LabeledTrack, store: &mut EdgeStoreWriter) -> Result<usize> {
    let edges = network_edges(labeled)?;
    for edge in &edges {
        store.append(edge)?;
    }
    Ok(edges.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geofence::ZoneLabel;

    fn labeled(labels: &[&str]) -> LabeledTrack {
        let n = labels.len();
        let track = Track::new(
            316_000_001,
            (0..n as i64).map(|i| 1_600_000_000 + i * 60).collect(),
            (0..n).map(|i| i as f64 * 0.001).collect(),
            vec![0.0; n],
        );
        let in_zone: Vec<ZoneLabel> = labels.iter().map(|l| Some(l.to_string())).collect();
        LabeledTrack::new(track, in_zone).unwrap()
    }

    #[test]
    fn test_fields_match_values() {
        let edges = network_edges(&labeled(&["Z1", "Z1"])).unwrap();
        assert_eq!(edges[0].values().len(), NetworkEdge::FIELDS.len());
    }

    #[test]
    fn test_fields_match_serde_names() {
        let edges = network_edges(&labeled(&["Z1", "Z2"])).unwrap();
        let value = serde_json::to_value(&edges[0]).unwrap();
        let object = value.as_object().unwrap();
        // Every column plus the open destination marker
        assert_eq!(object.len(), NetworkEdge::FIELDS.len() + 1);
        assert!(object.contains_key("open_destination"));
        for field in NetworkEdge::FIELDS {
            assert!(object.contains_key(field), "missing {}", field);
        }
    }

    #[test]
    fn test_escape_field() {
        assert_eq!(escape_field("plain"), "plain");
        assert_eq!(escape_field("A,B"), "\"A,B\"");
        assert_eq!(escape_field("say \"hi\""), "\"say \"\"hi\"\"\"");
    }

    #[test]
    fn test_single_point_run_has_null_velocity() {
        let edges = network_edges(&labeled(&["Z1", "Z1", "Z2"])).unwrap();
        let last = &edges[1];
        assert_eq!(last.num_datapoints, 1);
        assert_eq!(last.velocity_knots_max, None);
        assert_eq!(last.minutes_spent_in_zone, None);
        assert_eq!(last.transit_nodes, "2");
    }
}
