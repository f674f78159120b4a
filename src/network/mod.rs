//! # Network Edges
//!
//! Turns labeled trajectories into network edge records and moves them
//! through the two-phase pipeline:
//!
//! 1. [`graph`] fans the per-vessel pipeline out over a worker pool; each
//!    vessel's edges are appended to its own intermediate store.
//! 2. [`aggregate_output`] reads every store back, drops filtered rows and
//!    writes one comma-separated edge table.

pub mod aggregate;
pub mod dispatch;
pub mod edge;
pub mod filter;
pub mod stats;
pub mod store;

pub use aggregate::{AggregateSummary, aggregate_output, aggregate_output_with_progress, discover_stores};
pub use dispatch::{DispatchSummary, graph, graph_with_progress, process_track};
pub use edge::{NetworkEdge, escape_field, network_edges, serialize_network_edges};
pub use filter::EdgeFilter;
pub use store::{EdgeStoreReader, EdgeStoreWriter, store_path};
