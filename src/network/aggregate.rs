//! Merge per-vessel edge stores into one filtered edge table.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info};

use super::edge::NetworkEdge;
use super::filter::excluded;
use super::store::{EdgeStoreReader, STORE_EXTENSION};
use crate::progress::{NoopProgress, PipelinePhase, PipelineProgressCallback};
use crate::{GraphError, OutputConfig, Result};

/// Counts from one aggregation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateSummary {
    /// Stores read
    pub stores: usize,
    pub rows_written: usize,
    /// Rows dropped by a filter
    pub rows_filtered: usize,
    /// The edge table written
    pub output: PathBuf,
}

/// Complete edge stores in `dir`, sorted by file name.
///
/// Names containing `_` mark partial or temporary files and are skipped.
/// A missing directory holds no stores.
pub fn discover_stores(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }

    let mut stores = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_store = path.is_file()
            && path.extension().is_some_and(|ext| ext == STORE_EXTENSION)
            && path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| !name.contains('_'));
        if is_store {
            stores.push(path);
        }
    }
    stores.sort();
    Ok(stores)
}

/// Concatenate every store in `tmp_dir` into `output.output_path()`.
///
/// Fails with [`GraphError::NothingToAggregate`] when there is no store at
/// all. When every row is filtered out the table holds only the header.
pub fn aggregate_output(tmp_dir: &Path, output: &OutputConfig) -> Result<AggregateSummary> {
    aggregate_output_with_progress(tmp_dir, output, &NoopProgress)
}

/// [`aggregate_output`] with one progress update per store.
pub fn aggregate_output_with_progress(
    tmp_dir: &Path,
    output: &OutputConfig,
    progress: &dyn PipelineProgressCallback,
) -> Result<AggregateSummary> {
    let start = Instant::now();
    let stores = discover_stores(tmp_dir)?;
    if stores.is_empty() {
        return Err(GraphError::NothingToAggregate {
            dir: tmp_dir.to_path_buf(),
        });
    }
    progress.on_phase(PipelinePhase::Aggregating, stores.len() as u32);

    fs::create_dir_all(&output.output_dir)?;
    let output_path = output.output_path();
    let mut table = BufWriter::new(File::create(&output_path)?);
    writeln!(table, "{}", NetworkEdge::header())?;

    let mut summary = AggregateSummary {
        stores: stores.len(),
        rows_written: 0,
        rows_filtered: 0,
        output: output_path,
    };

    for path in &stores {
        let mut rows = Vec::new();
        for edge in EdgeStoreReader::open(path)? {
            let edge = edge?;
            if excluded(&output.filters, &edge) {
                summary.rows_filtered += 1;
            } else {
                rows.push(edge.to_row());
            }
        }

        for row in &rows {
            writeln!(table, "{}", row)?;
        }
        summary.rows_written += rows.len();
        debug!("[Aggregate] {}: {} rows", path.display(), rows.len());

        if output.delete {
            fs::remove_file(path)?;
        }
        progress.on_progress();
    }
    table.flush()?;

    info!(
        "[Aggregate] {} stores -> {} rows ({} filtered) into {} in {:?}",
        summary.stores,
        summary.rows_written,
        summary.rows_filtered,
        summary.output.display(),
        start.elapsed()
    );
    Ok(summary)
}
