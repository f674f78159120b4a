//! Tests for error module

use std::path::PathBuf;
use transitgraph::error::{GraphError, OptionExt};

#[test]
fn test_error_display() {
    let err = GraphError::InconsistentTrack {
        mmsi: 316_001_234,
        reason: "time decreases at index 3".to_string(),
    };
    assert!(err.to_string().contains("316001234"));
    assert!(err.to_string().contains("index 3"));
}

#[test]
fn test_nothing_to_aggregate_mentions_directory() {
    let err = GraphError::NothingToAggregate {
        dir: PathBuf::from("/tmp/stores"),
    };
    assert!(err.to_string().contains("/tmp/stores"));
}

#[test]
fn test_worker_error_keeps_source() {
    let err = GraphError::Worker {
        mmsi: 7,
        source: Box::new(GraphError::InvalidTimestamp(-1)),
    };
    assert!(err.to_string().contains("vessel 7"));
    let source = std::error::Error::source(&err).expect("source");
    assert!(source.to_string().contains("-1"));
}

#[test]
fn test_io_error_converts() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let err: GraphError = io.into();
    assert!(matches!(err, GraphError::Io(_)));
}

#[test]
fn test_option_ext() {
    let none: Option<i32> = None;
    let result = none.ok_or_empty("edge store");
    assert!(matches!(
        result,
        Err(GraphError::EmptyInput { what: "edge store" })
    ));
    assert_eq!(Some(3).ok_or_empty("edge store").unwrap(), 3);
}
