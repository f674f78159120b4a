//! Fan-out of the per-vessel pipeline.
//!
//! Every track runs segment -> fence -> serialize independently and the
//! only observable effect is an append to that vessel's store, so tasks
//! complete in any order. The caller pulls tracks from the (lazy, possibly
//! I/O-bound) iterator on its own thread; workers only do CPU work.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use log::{debug, info};

use super::edge::serialize_network_edges;
use super::store::EdgeStoreWriter;
use crate::geofence::{Geofence, fence_track};
use crate::progress::{NoopProgress, PipelinePhase, PipelineProgressCallback};
use crate::segment::segment_track;
use crate::{GraphConfig, GraphError, Result, Track};

/// Counts accumulated over a dispatch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    /// Vessel tracks processed
    pub tracks: usize,
    /// Tracks emitted by segmentation
    pub fragments: usize,
    /// Edge records written
    pub edges: usize,
}

impl DispatchSummary {
    fn absorb(&mut self, other: DispatchSummary) {
        self.tracks += other.tracks;
        self.fragments += other.fragments;
        self.edges += other.edges;
    }
}

/// The complete pipeline for one vessel: validate, segment, fence every
/// fragment and append its edges to the vessel's store.
pub fn process_track<G>(track: Track, fence: &G, config: &GraphConfig) -> Result<DispatchSummary>
where
    G: Geofence + ?Sized,
{
    track.validate()?;
    if track.is_empty() {
        debug!("[Dispatch] vessel {} has no positions, skipping", track.mmsi);
        return Ok(DispatchSummary {
            tracks: 1,
            ..Default::default()
        });
    }

    let mut store = EdgeStoreWriter::open(&config.tmp_dir, track.mmsi)?;
    let fragments = segment_track(track, &config.segment);

    let mut summary = DispatchSummary {
        tracks: 1,
        fragments: fragments.len(),
        edges: 0,
    };
    for fragment in fragments {
        let labeled = fence_track(fragment, fence);
        summary.edges += serialize_network_edges(&labeled, &mut store)?;
    }
    store.finish()?;
    Ok(summary)
}

fn worker_error(mmsi: u32, source: GraphError) -> GraphError {
    GraphError::Worker {
        mmsi,
        source: Box::new(source),
    }
}

/// Run the per-vessel pipeline over every track.
///
/// With `config.parallel == 0` tracks run on the calling thread; otherwise
/// a pool of that many workers runs one task per track. The call returns
/// after every task has finished. The first failure aborts the dispatch:
/// tasks not yet started are skipped and the error is returned.
///
/// A store is owned by the single task of its vessel and is never locked.
/// When the pool sees a vessel again, that track is held back and run on
/// the calling thread after the pool has joined, in input order, so the
/// stores match a sequential run.
pub fn graph<I, G>(tracks: I, fence: &G, config: &GraphConfig) -> Result<DispatchSummary>
where
    I: IntoIterator<Item = Track>,
    G: Geofence + ?Sized,
{
    graph_with_progress(tracks, fence, config, Arc::new(NoopProgress))
}

/// [`graph`] with progress reporting, one update per finished track.
pub fn graph_with_progress<I, G>(
    tracks: I,
    fence: &G,
    config: &GraphConfig,
    progress: Arc<dyn PipelineProgressCallback>,
) -> Result<DispatchSummary>
where
    I: IntoIterator<Item = Track>,
    G: Geofence + ?Sized,
{
    let start = Instant::now();
    progress.on_phase(PipelinePhase::Dispatching, 0);
    info!(
        "[Dispatch] Writing edge stores to {} ({} workers)",
        config.tmp_dir.display(),
        config.parallel
    );

    let summary = if config.parallel == 0 {
        run_sequential(tracks.into_iter(), fence, config, progress.as_ref())?
    } else {
        run_parallel(tracks.into_iter(), fence, config, progress.as_ref())?
    };

    info!(
        "[Dispatch] {} tracks -> {} fragments -> {} edges in {:?}",
        summary.tracks,
        summary.fragments,
        summary.edges,
        start.elapsed()
    );
    Ok(summary)
}

fn run_sequential<I, G>(
    tracks: I,
    fence: &G,
    config: &GraphConfig,
    progress: &dyn PipelineProgressCallback,
) -> Result<DispatchSummary>
where
    I: Iterator<Item = Track>,
    G: Geofence + ?Sized,
{
    let mut summary = DispatchSummary::default();
    for track in tracks {
        let mmsi = track.mmsi;
        summary.absorb(process_track(track, fence, config).map_err(|e| worker_error(mmsi, e))?);
        progress.on_progress();
    }
    Ok(summary)
}

#[cfg(not(feature = "parallel"))]
fn run_parallel<I, G>(
    tracks: I,
    fence: &G,
    config: &GraphConfig,
    progress: &dyn PipelineProgressCallback,
) -> Result<DispatchSummary>
where
    I: Iterator<Item = Track>,
    G: Geofence + ?Sized,
{
    log::warn!(
        "[Dispatch] parallel = {} requested but built without the `parallel` feature, running sequentially",
        config.parallel
    );
    run_sequential(tracks, fence, config, progress)
}

#[cfg(feature = "parallel")]
fn run_parallel<I, G>(
    tracks: I,
    fence: &G,
    config: &GraphConfig,
    progress: &dyn PipelineProgressCallback,
) -> Result<DispatchSummary>
where
    I: Iterator<Item = Track>,
    G: Geofence + ?Sized,
{
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.parallel)
        .thread_name(|i| format!("transitgraph-worker-{}", i))
        .build()?;

    let failed = AtomicBool::new(false);
    let first_error: Mutex<Option<GraphError>> = Mutex::new(None);
    let summary = Mutex::new(DispatchSummary::default());
    let in_flight = InFlight::new(config.parallel * 2);
    let mut dispatched: HashSet<u32> = HashSet::new();
    let mut repeated: Vec<Track> = Vec::new();

    pool.in_place_scope(|scope| {
        for track in tracks {
            if failed.load(Ordering::SeqCst) {
                break;
            }
            if !dispatched.insert(track.mmsi) {
                repeated.push(track);
                continue;
            }
            in_flight.acquire();

            let (failed, first_error, summary, in_flight) =
                (&failed, &first_error, &summary, &in_flight);
            scope.spawn(move |_| {
                let mmsi = track.mmsi;
                if !failed.load(Ordering::SeqCst) {
                    match process_track(track, fence, config) {
                        Ok(done) => {
                            summary.lock().unwrap_or_else(PoisonError::into_inner).absorb(done);
                            progress.on_progress();
                        }
                        Err(e) => {
                            failed.store(true, Ordering::SeqCst);
                            let mut slot = first_error.lock().unwrap_or_else(PoisonError::into_inner);
                            if slot.is_none() {
                                *slot = Some(worker_error(mmsi, e));
                            }
                        }
                    }
                }
                in_flight.release();
            });
        }
    });

    if let Some(e) = first_error.into_inner().unwrap_or_else(PoisonError::into_inner) {
        return Err(e);
    }
    let mut summary = summary.into_inner().unwrap_or_else(PoisonError::into_inner);

    if !repeated.is_empty() {
        debug!(
            "[Dispatch] {} tracks repeat an already dispatched vessel, running them in order",
            repeated.len()
        );
        summary.absorb(run_sequential(repeated.into_iter(), fence, config, progress)?);
    }
    Ok(summary)
}

/// Bounds the number of queued plus running tasks so the caller does not
/// drain the whole track stream into memory ahead of the workers.
#[cfg(feature = "parallel")]
struct InFlight {
    limit: usize,
    count: Mutex<usize>,
    freed: std::sync::Condvar,
}

#[cfg(feature = "parallel")]
impl InFlight {
    fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            count: Mutex::new(0),
            freed: std::sync::Condvar::new(),
        }
    }

    fn acquire(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        while *count >= self.limit {
            count = self.freed.wait(count).unwrap_or_else(PoisonError::into_inner);
        }
        *count += 1;
    }

    fn release(&self) {
        let mut count = self.count.lock().unwrap_or_else(PoisonError::into_inner);
        *count = count.saturating_sub(1);
        self.freed.notify_one();
    }
}
