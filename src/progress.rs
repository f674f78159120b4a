//! Progress reporting for the dispatch and aggregation phases.
//!
//! Progress is emitted from worker threads, so implementations must be
//! `Send + Sync`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, Ordering};

/// Pipeline phases, ordered by execution sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    /// Segmenting, geofencing and serializing vessel tracks
    Dispatching,
    /// Merging intermediate edge stores into the output table
    Aggregating,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::Dispatching => "dispatching",
            PipelinePhase::Aggregating => "aggregating",
        }
    }
}

/// Trait for receiving progress updates.
///
/// `total` is 0 when the number of items is not known up front (the track
/// stream is lazy).
pub trait PipelineProgressCallback: Send + Sync {
    /// Called when entering a new phase.
    fn on_phase(&self, phase: PipelinePhase, total: u32);
    /// Called after completing one item (a vessel or a store).
    fn on_progress(&self);
}

/// Ignores every update.
pub struct NoopProgress;

impl PipelineProgressCallback for NoopProgress {
    fn on_phase(&self, _phase: PipelinePhase, _total: u32) {}
    fn on_progress(&self) {}
}

/// Atomic progress tracker that can be polled from another thread.
pub struct AtomicProgressTracker {
    pub phase: Mutex<String>,
    pub completed: AtomicU32,
    pub total: AtomicU32,
}

impl Default for AtomicProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl AtomicProgressTracker {
    pub fn new() -> Self {
        Self {
            phase: Mutex::new(String::new()),
            completed: AtomicU32::new(0),
            total: AtomicU32::new(0),
        }
    }

    /// Name of the current phase.
    pub fn current_phase(&self) -> String {
        match self.phase.lock() {
            Ok(phase) => phase.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl PipelineProgressCallback for AtomicProgressTracker {
    fn on_phase(&self, phase: PipelinePhase, total: u32) {
        match self.phase.lock() {
            Ok(mut current) => *current = phase.as_str().to_string(),
            Err(poisoned) => *poisoned.into_inner() = phase.as_str().to_string(),
        }
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(total, Ordering::SeqCst);
    }

    fn on_progress(&self) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }
}
