//! Unified error handling for the transit graph pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or exporting a transit network graph.
#[derive(Debug, Error)]
pub enum GraphError {
    /// A required input list was empty.
    #[error("expected at least one {what}, got none")]
    EmptyInput { what: &'static str },

    /// A domain was constructed without zones.
    #[error("domain '{name}' has no zones")]
    EmptyDomain { name: String },

    /// Parallel sequences of a track disagree in length, time runs backwards
    /// or a coordinate is out of range.
    #[error("track for vessel {mmsi} is inconsistent: {reason}")]
    InconsistentTrack { mmsi: u32, reason: String },

    /// An epoch timestamp outside the representable calendar range.
    #[error("timestamp {0} is out of range")]
    InvalidTimestamp(i64),

    /// Aggregation found no intermediate stores at all.
    #[error("no edge stores found in {}; nothing was geofenced (try again with parallel = 0)", .dir.display())]
    NothingToAggregate { dir: PathBuf },

    /// The file does not start with the edge store magic bytes.
    #[error("{} is not an edge store", .path.display())]
    BadStoreHeader { path: PathBuf },

    /// The store was written by an unknown format version.
    #[error("edge store {} has unsupported version {found}", .path.display())]
    UnsupportedStoreVersion { path: PathBuf, found: u16 },

    /// End of file inside a record.
    #[error("edge store {} ends inside a record", .path.display())]
    TruncatedRecord { path: PathBuf },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("record encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),

    #[cfg(feature = "parallel")]
    #[error("failed to start worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),

    /// The per-vessel pipeline failed inside the dispatcher.
    #[error("pipeline failed for vessel {mmsi}: {source}")]
    Worker {
        mmsi: u32,
        #[source]
        source: Box<GraphError>,
    },
}

/// Result type alias for transit graph operations.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Extension trait for converting missing values into [`GraphError`].
pub trait OptionExt<T> {
    /// Convert `None` into [`GraphError::EmptyInput`].
    fn ok_or_empty(self, what: &'static str) -> Result<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_empty(self, what: &'static str) -> Result<T> {
        self.ok_or(GraphError::EmptyInput { what })
    }
}
