//! Tests for configuration loading

use std::io::Write;
use std::path::PathBuf;

use transitgraph::{GraphConfig, GraphError, OutputConfig, SegmentConfig};

#[test]
fn test_defaults() {
    let segment = SegmentConfig::default();
    assert_eq!(segment.cuttime, 604_800.0);
    assert_eq!(segment.cutdistance, 250_000.0);
    assert_eq!(segment.cutknots, 50.0);
    assert_eq!(segment.minscore, 5e-7);

    let output = OutputConfig::default();
    assert!(output.delete);
    assert!(output.filters.is_empty());
    assert_eq!(output.output_path(), PathBuf::from("./output.csv"));

    assert_eq!(GraphConfig::default().parallel, 0);
}

#[test]
fn test_partial_json_keeps_defaults() {
    let config = GraphConfig::from_json_str(
        r#"{"parallel": 4, "segment": {"cutknots": 45.0}, "output": {"filename": "edges.csv"}}"#,
    )
    .unwrap();
    assert_eq!(config.parallel, 4);
    assert_eq!(config.segment.cutknots, 45.0);
    assert_eq!(config.segment.cutdistance, 250_000.0);
    assert_eq!(config.output.filename, "edges.csv");
    assert!(config.output.delete);
}

#[test]
fn test_from_json_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    write!(file, r#"{{"tmp_dir": "/var/tmp/edges", "output": {{"delete": false}}}}"#).unwrap();

    let config = GraphConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.tmp_dir, PathBuf::from("/var/tmp/edges"));
    assert!(!config.output.delete);
}

#[test]
fn test_invalid_json() {
    let err = GraphConfig::from_json_str(r#"{"parallel": "many"}"#).unwrap_err();
    assert!(matches!(err, GraphError::Config(_)));
}

#[test]
fn test_round_trip_through_json() {
    let config = GraphConfig {
        parallel: 8,
        ..GraphConfig::default()
    };
    let json = serde_json::to_string(&config).unwrap();
    let back = GraphConfig::from_json_str(&json).unwrap();
    assert_eq!(back.parallel, 8);
    assert_eq!(back.segment, config.segment);
    assert_eq!(back.tmp_dir, config.tmp_dir);
}
