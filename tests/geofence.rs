//! Tests for zones, domains and transition detection

use std::io::Write;

use transitgraph::geofence::{Destination, NO_ZONE, label_text};
use transitgraph::{
    Domain, Geofence, GraphError, LabeledTrack, Track, Zone, ZoneLabel, fence_track, transit_runs,
};

fn square(name: &str, lon0: f64, lat0: f64, side: f64) -> Zone {
    Zone::from_exterior(
        name,
        &[
            (lon0, lat0),
            (lon0 + side, lat0),
            (lon0 + side, lat0 + side),
            (lon0, lat0 + side),
        ],
    )
}

fn harbour() -> Domain {
    Domain::new(
        "harbour",
        vec![square("Z1", 0.0, 0.0, 1.0), square("Z2", 1.0, 0.0, 1.0)],
    )
    .unwrap()
}

fn labels(names: &[Option<&str>]) -> Vec<ZoneLabel> {
    names.iter().map(|n| n.map(str::to_string)).collect()
}

#[test]
fn test_empty_domain_rejected() {
    let err = Domain::new("empty", vec![]).unwrap_err();
    assert!(matches!(err, GraphError::EmptyDomain { .. }));
}

#[test]
fn test_zone_lookup() {
    let domain = harbour();
    assert_eq!(domain.zone_at(0.5, 0.5), Some("Z1"));
    assert_eq!(domain.zone_at(1.5, 0.5), Some("Z2"));
    assert_eq!(domain.zone_at(2.5, 0.5), None);
    assert_eq!(domain.zone_at(0.5, -0.5), None);
}

#[test]
fn test_domain_bounds() {
    let bounds = harbour().bounds().unwrap();
    assert_eq!((bounds.min_lng, bounds.max_lng), (0.0, 2.0));
    assert_eq!((bounds.min_lat, bounds.max_lat), (0.0, 1.0));
}

#[test]
fn test_zone_with_hole() {
    let json = r#"[
        {"name": "ring", "polygons": [{
            "exterior": [[0, 0], [4, 0], [4, 4], [0, 4]],
            "interiors": [[[1, 1], [3, 1], [3, 3], [1, 3]]]
        }]}
    ]"#;
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    let domain = Domain::from_json_file("holes", file.path()).unwrap();
    assert_eq!(domain.name(), "holes");
    assert_eq!(domain.zone_at(0.5, 0.5), Some("ring"));
    assert_eq!(domain.zone_at(2.0, 2.0), None);
}

#[test]
fn test_fence_track_labels_every_position() {
    let track = Track::new(1, vec![0, 60, 120], vec![0.5, 1.5, 3.0], vec![0.5, 0.5, 0.5]);
    let labeled = fence_track(track, &harbour());
    assert_eq!(labeled.in_zone, labels(&[Some("Z1"), Some("Z2"), None]));
    assert_eq!(label_text(&labeled.in_zone[2]), NO_ZONE);
}

#[test]
fn test_labeled_track_length_checked() {
    let track = Track::new(1, vec![0, 60], vec![0.0, 0.0], vec![0.0, 0.0]);
    assert!(LabeledTrack::new(track.clone(), labels(&[Some("Z1")])).is_err());
    assert!(LabeledTrack::new(track, labels(&[Some("Z1"), None])).is_ok());
}

#[test]
fn test_zero_transitions_single_open_run() {
    let runs = transit_runs(&labels(&[Some("Z1"); 5]));
    assert_eq!(runs.len(), 1);
    assert_eq!((runs[0].start, runs[0].end), (0, 4));
    assert_eq!(runs[0].destination, Destination::Open);
}

#[test]
fn test_crossing_at_k_includes_boundary() {
    // Z1 for indices 0..3, Z2 from index 3
    let runs = transit_runs(&labels(&[
        Some("Z1"),
        Some("Z1"),
        Some("Z1"),
        Some("Z2"),
        Some("Z2"),
    ]));
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[0].indices(), vec![0, 1, 2, 3]);
    assert_eq!(runs[0].source.as_deref(), Some("Z1"));
    assert_eq!(runs[0].destination.label(), Some("Z2"));
    assert_eq!(runs[1].indices(), vec![3, 4]);
    assert!(runs[1].destination.is_open());
}

#[test]
fn test_exit_to_no_zone_is_a_transition() {
    let runs = transit_runs(&labels(&[Some("Z1"), None, None, Some("Z1")]));
    assert_eq!(runs.len(), 3);
    assert_eq!(runs[0].destination, Destination::Zone(None));
    assert_eq!(runs[1].source, None);
    assert_eq!(runs[1].destination.label(), Some("Z1"));
    assert_eq!((runs[2].start, runs[2].end), (3, 3));
}
