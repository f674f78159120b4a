//! Pipeline configuration.
//!
//! Every value is threaded explicitly into the dispatcher and aggregator;
//! there is no process-wide state. Configurations load from JSON and every
//! field falls back to its default when omitted.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Result;
use crate::network::EdgeFilter;

/// Thresholds for trajectory segmentation and fragment rejoining.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentConfig {
    /// Maximum elapsed seconds between consecutive positions before a hard
    /// time cut. No rejoin is attempted across a time cut.
    /// Default: one week
    pub cuttime: f64,

    /// Maximum plausible distance in meters between consecutive positions.
    /// Default: 250 km
    pub cutdistance: f64,

    /// Maximum plausible speed in knots between consecutive positions.
    /// Default: 50 knots
    pub cutknots: f64,

    /// Minimum (quantized) rejoin score for a fragment to be attached to an
    /// earlier pathway. Fragments scoring below start a new pathway.
    /// Default: 5e-7
    pub minscore: f64,
}

impl Default for SegmentConfig {
    fn default() -> Self {
        Self {
            cuttime: 7.0 * 24.0 * 3600.0,
            cutdistance: 250_000.0,
            cutknots: 50.0,
            minscore: 5e-7,
        }
    }
}

/// Where and how the final edge table is written.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the edge table.
    pub output_dir: PathBuf,

    /// File name of the edge table inside `output_dir`.
    /// Default: "output.csv"
    pub filename: String,

    /// Remove intermediate stores once they have been exported.
    /// Default: true
    pub delete: bool,

    /// Row exclusion predicates. A row is dropped when any filter matches.
    #[serde(skip)]
    pub filters: Vec<EdgeFilter>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            filename: "output.csv".to_string(),
            delete: true,
            filters: Vec::new(),
        }
    }
}

impl OutputConfig {
    /// Full path of the edge table.
    pub fn output_path(&self) -> PathBuf {
        self.output_dir.join(&self.filename)
    }
}

/// Complete configuration of a graph run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Number of worker threads. 0 runs every vessel on the calling thread.
    pub parallel: usize,

    /// Directory holding the per-vessel intermediate edge stores.
    pub tmp_dir: PathBuf,

    pub segment: SegmentConfig,

    pub output: OutputConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            parallel: 0,
            tmp_dir: std::env::temp_dir().join("transitgraph"),
            segment: SegmentConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl GraphConfig {
    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
