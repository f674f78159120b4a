//! transitgraph CLI - build vessel transit network graphs
//!
//! Usage:
//!   transitgraph-cli graph --positions <rows.jsonl> --zones <zones.json> [options]
//!   transitgraph-cli aggregate [options]
//!
//! `graph` segments and geofences every vessel, writes per-vessel edge
//! stores and aggregates them into one CSV edge table. `aggregate` only
//! performs the last step over stores left by an earlier run.

use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use transitgraph::{
    AtomicProgressTracker, Domain, EdgeFilter, GraphConfig, OptionExt, PositionReport, Result,
    aggregate_output, assemble_tracks, graph_with_progress,
};

#[derive(Parser)]
#[command(name = "transitgraph-cli")]
#[command(about = "Vessel transit network graphs from AIS positions", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose debug output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Segment, geofence and aggregate vessel positions
    Graph {
        /// Position rows, one JSON object per line
        #[arg(long)]
        positions: PathBuf,

        /// Zone definitions (JSON list of {name, polygons})
        #[arg(long)]
        zones: PathBuf,

        /// Domain name
        #[arg(long, default_value = "domain")]
        domain: String,

        /// Worker threads (0 = sequential)
        #[arg(long)]
        parallel: Option<usize>,

        /// Hard time cut in seconds
        #[arg(long)]
        cuttime: Option<f64>,

        /// Maximum plausible step distance in meters
        #[arg(long)]
        cutdistance: Option<f64>,

        /// Maximum plausible speed in knots
        #[arg(long)]
        cutknots: Option<f64>,

        /// Minimum rejoin score
        #[arg(long)]
        minscore: Option<f64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Aggregate edge stores left by an earlier run
    Aggregate {
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct OutputArgs {
    /// JSON configuration file; flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of intermediate edge stores
    #[arg(long)]
    tmp_dir: Option<PathBuf>,

    /// Directory receiving the edge table
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// File name of the edge table
    #[arg(long)]
    filename: Option<String>,

    /// Drop rows whose maximum velocity exceeds this many knots
    #[arg(long)]
    max_knots: Option<f64>,

    /// Drop vessels that never leave this zone id
    #[arg(long)]
    non_transit_zone: Option<u64>,

    /// Keep intermediate stores after aggregation
    #[arg(long)]
    keep_stores: bool,
}

impl OutputArgs {
    /// Load the configuration file (if any) and apply the flags on top.
    fn resolve(&self) -> Result<GraphConfig> {
        let mut config = match &self.config {
            Some(path) => GraphConfig::from_json_file(path)?,
            None => GraphConfig::default(),
        };
        if let Some(dir) = &self.tmp_dir {
            config.tmp_dir = dir.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.output_dir = dir.clone();
        }
        if let Some(name) = &self.filename {
            config.output.filename = name.clone();
        }
        if let Some(limit) = self.max_knots {
            config.output.filters.push(EdgeFilter::max_velocity_knots(limit));
        }
        if let Some(zone) = self.non_transit_zone {
            config.output.filters.push(EdgeFilter::non_transit_from(zone));
        }
        if self.keep_stores {
            config.output.delete = false;
        }
        Ok(config)
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| writeln!(buf, "[{:5}] {}", record.level(), record.args()))
        .init();

    let result = match cli.command {
        Commands::Graph {
            positions,
            zones,
            domain,
            parallel,
            cuttime,
            cutdistance,
            cutknots,
            minscore,
            output,
        } => output.resolve().and_then(|mut config| {
            if let Some(n) = parallel {
                config.parallel = n;
            }
            let segment = &mut config.segment;
            segment.cuttime = cuttime.unwrap_or(segment.cuttime);
            segment.cutdistance = cutdistance.unwrap_or(segment.cutdistance);
            segment.cutknots = cutknots.unwrap_or(segment.cutknots);
            segment.minscore = minscore.unwrap_or(segment.minscore);
            run_graph(&positions, &zones, &domain, &config)
        }),
        Commands::Aggregate { output } => output.resolve().and_then(|config| run_aggregate(&config)),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Read JSON-lines position rows, ordered by vessel then time.
fn load_positions(path: &Path) -> Result<Vec<PositionReport>> {
    let reader = BufReader::new(File::open(path)?);
    let mut rows = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        rows.push(serde_json::from_str::<PositionReport>(&line)?);
    }
    rows.first().ok_or_empty("position row")?;
    rows.sort_by_key(|r| (r.mmsi, r.time));
    log::info!("[CLI] Loaded {} position rows from {}", rows.len(), path.display());
    Ok(rows)
}

fn run_graph(positions: &Path, zones: &Path, domain: &str, config: &GraphConfig) -> Result<()> {
    let domain = Domain::from_json_file(domain, zones)?;
    log::info!("[CLI] Domain '{}' with {} zones", domain.name(), domain.zones().len());
    if let Some(b) = domain.bounds() {
        log::debug!(
            "[CLI] Domain bounds lat {:.4}..{:.4}, lon {:.4}..{:.4}",
            b.min_lat,
            b.max_lat,
            b.min_lng,
            b.max_lng
        );
    }

    let rows = load_positions(positions)?;
    let progress = Arc::new(AtomicProgressTracker::new());
    let dispatch = graph_with_progress(assemble_tracks(rows), &domain, config, progress.clone())?;

    println!("\n{}", "=".repeat(60));
    println!(
        "Processed {} vessels ({} completed in phase '{}') into {} fragments and {} edges",
        dispatch.tracks,
        progress.completed.load(Ordering::SeqCst),
        progress.current_phase(),
        dispatch.fragments,
        dispatch.edges
    );
    run_aggregate(config)
}

fn run_aggregate(config: &GraphConfig) -> Result<()> {
    let summary = aggregate_output(&config.tmp_dir, &config.output)?;
    println!(
        "Wrote {} rows ({} filtered) from {} stores to {}",
        summary.rows_written,
        summary.rows_filtered,
        summary.stores,
        summary.output.display()
    );
    Ok(())
}
