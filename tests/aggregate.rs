//! Tests for store discovery, filtering and the exported edge table

use std::fs;
use std::path::Path;

use transitgraph::network::{discover_stores, network_edges};
use transitgraph::{
    EdgeFilter, EdgeStoreWriter, GraphError, LabeledTrack, NetworkEdge, OutputConfig, Track,
    ZoneLabel, aggregate_output,
};

/// A vessel sailing 0.001 degrees of longitude every `interval` seconds.
fn edges_for(mmsi: u32, interval: i64, zones: &[&str]) -> Vec<NetworkEdge> {
    let n = zones.len();
    let track = Track::new(
        mmsi,
        (0..n as i64).map(|i| i * interval).collect(),
        (0..n).map(|i| i as f64 * 0.001).collect(),
        vec![0.0; n],
    );
    let in_zone: Vec<ZoneLabel> = zones.iter().map(|z| Some(z.to_string())).collect();
    network_edges(&LabeledTrack::new(track, in_zone).unwrap()).unwrap()
}

fn write_store(dir: &Path, mmsi: u32, edges: &[NetworkEdge]) {
    let mut writer = EdgeStoreWriter::open(dir, mmsi).unwrap();
    for edge in edges {
        writer.append(edge).unwrap();
    }
    writer.finish().unwrap();
}

fn output_in(dir: &Path) -> OutputConfig {
    OutputConfig {
        output_dir: dir.join("out"),
        filename: "edges.csv".to_string(),
        ..OutputConfig::default()
    }
}

fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

#[test]
fn test_no_stores_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = aggregate_output(&dir.path().join("stores"), &output_in(dir.path())).unwrap_err();
    assert!(matches!(err, GraphError::NothingToAggregate { .. }));
}

#[test]
fn test_discovery_is_sorted_and_skips_partials() {
    let dir = tempfile::tempdir().unwrap();
    let edges = edges_for(1, 60, &["Z1", "Z1"]);
    write_store(dir.path(), 20, &edges);
    write_store(dir.path(), 3, &edges);
    fs::write(dir.path().join("000000005_partial.edges"), b"x").unwrap();
    fs::write(dir.path().join("notes.txt"), b"x").unwrap();

    let stores = discover_stores(dir.path()).unwrap();
    let names: Vec<_> = stores
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["000000003.edges", "000000020.edges"]);
}

#[test]
fn test_concatenates_all_stores_and_deletes() {
    let dir = tempfile::tempdir().unwrap();
    let stores = dir.path().join("stores");
    write_store(&stores, 2, &edges_for(2, 60, &["Z1", "Z1", "Z2"]));
    write_store(&stores, 1, &edges_for(1, 60, &["Z3", "Z3"]));

    let summary = aggregate_output(&stores, &output_in(dir.path())).unwrap();
    assert_eq!(summary.stores, 2);
    assert_eq!(summary.rows_written, 3);
    assert_eq!(summary.rows_filtered, 0);

    let lines = read_lines(&summary.output);
    assert_eq!(lines[0], NetworkEdge::header());
    assert_eq!(lines.len(), 4);
    // Sorted store order: vessel 1 first
    assert!(lines[1].starts_with("1,"));
    assert!(lines[2].starts_with("2,"));

    assert!(discover_stores(&stores).unwrap().is_empty());
}

#[test]
fn test_keep_stores() {
    let dir = tempfile::tempdir().unwrap();
    let stores = dir.path().join("stores");
    write_store(&stores, 1, &edges_for(1, 60, &["Z3", "Z3"]));

    let output = OutputConfig {
        delete: false,
        ..output_in(dir.path())
    };
    aggregate_output(&stores, &output).unwrap();
    assert_eq!(discover_stores(&stores).unwrap().len(), 1);

    // A second pass over the kept stores gives the same table
    let first = read_lines(&output.output_path());
    aggregate_output(&stores, &output).unwrap();
    assert_eq!(read_lines(&output.output_path()), first);
}

#[test]
fn test_velocity_filter() {
    let dir = tempfile::tempdir().unwrap();
    let stores = dir.path().join("stores");
    // 111 m per minute is ~3.6 knots; per second ~216 knots
    let slow = edges_for(1, 60, &["Z1", "Z1", "Z1"]);
    let fast = edges_for(2, 1, &["Z1", "Z1", "Z1"]);
    write_store(&stores, 1, &slow);
    write_store(&stores, 2, &fast);

    let output = OutputConfig {
        filters: vec![EdgeFilter::max_velocity_knots(50.0)],
        ..output_in(dir.path())
    };
    let summary = aggregate_output(&stores, &output).unwrap();
    assert_eq!(summary.rows_written, 1);
    assert_eq!(summary.rows_filtered, 1);

    let lines = read_lines(&summary.output);
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1], slow[0].to_row());
}

#[test]
fn test_filters_combine_with_or() {
    let dir = tempfile::tempdir().unwrap();
    let stores = dir.path().join("stores");
    write_store(&stores, 1, &edges_for(1, 60, &["Z0", "Z0"])); // never leaves Z0
    write_store(&stores, 2, &edges_for(2, 1, &["Z1", "Z1"])); // too fast
    write_store(&stores, 3, &edges_for(3, 60, &["Z0", "Z1"])); // transits Z0 -> Z1, then stays in Z1

    let output = OutputConfig {
        filters: vec![
            EdgeFilter::max_velocity_knots(50.0),
            EdgeFilter::non_transit_from(0),
        ],
        ..output_in(dir.path())
    };
    let summary = aggregate_output(&stores, &output).unwrap();
    assert_eq!(summary.rows_filtered, 2);
    assert_eq!(summary.rows_written, 2);

    let lines = read_lines(&summary.output);
    assert!(lines[1..].iter().all(|l| l.starts_with("3,")));
}

#[test]
fn test_non_transit_filter_keeps_exit_to_open_water() {
    let dir = tempfile::tempdir().unwrap();
    let stores = dir.path().join("stores");
    let track = Track::new(4, vec![0, 60, 120], vec![0.0, 0.001, 0.002], vec![0.0; 3]);
    let in_zone = vec![Some("Z0".to_string()), Some("Z0".to_string()), None];
    let edges = network_edges(&LabeledTrack::new(track, in_zone).unwrap()).unwrap();
    write_store(&stores, 4, &edges);

    let output = OutputConfig {
        filters: vec![EdgeFilter::non_transit_from(0)],
        ..output_in(dir.path())
    };
    let summary = aggregate_output(&stores, &output).unwrap();
    assert_eq!(summary.rows_filtered, 0);
    assert_eq!(summary.rows_written, 2);

    let lines = read_lines(&summary.output);
    assert_eq!(lines[1], edges[0].to_row());
}

#[test]
fn test_everything_filtered_leaves_header_only() {
    let dir = tempfile::tempdir().unwrap();
    let stores = dir.path().join("stores");
    write_store(&stores, 1, &edges_for(1, 1, &["Z1", "Z1"]));

    let output = OutputConfig {
        filters: vec![EdgeFilter::new("everything", |_| true)],
        ..output_in(dir.path())
    };
    let summary = aggregate_output(&stores, &output).unwrap();
    assert_eq!(summary.rows_written, 0);
    assert_eq!(read_lines(&summary.output), vec![NetworkEdge::header()]);
}

#[test]
fn test_embedded_delimiter_is_quoted() {
    let dir = tempfile::tempdir().unwrap();
    let stores = dir.path().join("stores");
    let mut edges = edges_for(1, 60, &["Z1", "Z1"]);
    edges[0].vessel_type = Some("Tug, towing".to_string());
    write_store(&stores, 1, &edges);

    let summary = aggregate_output(&stores, &output_in(dir.path())).unwrap();
    let lines = read_lines(&summary.output);
    assert!(lines[1].contains(",\"Tug, towing\","));
}
