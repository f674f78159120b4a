//! Pipeline benchmarks over synthetic fleets.
//!
//! Run with: `cargo bench --bench pipeline --features synthetic`

use criterion::{BenchmarkId, Criterion, SamplingMode, criterion_group, criterion_main};
use std::time::Duration;
use transitgraph::synthetic::SyntheticFleet;
use transitgraph::{
    GraphConfig, OutputConfig, SegmentConfig, aggregate_output, fence_track, graph, segment_track,
};

// ============================================================================
// 1. Segmentation: glitch-heavy tracks
// ============================================================================

fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");

    for glitch_probability in [0.0, 0.01, 0.05] {
        let dataset = SyntheticFleet {
            vessel_count: 20,
            positions_per_vessel: 1_000,
            glitch_probability,
            ..SyntheticFleet::default()
        }
        .generate();
        let config = SegmentConfig::default();

        group.bench_with_input(
            BenchmarkId::new("glitch_probability", glitch_probability),
            &glitch_probability,
            |b, _| {
                b.iter(|| {
                    dataset
                        .tracks
                        .iter()
                        .map(|t| segment_track(t.clone(), &config).len())
                        .sum::<usize>()
                });
            },
        );
    }

    group.finish();
}

// ============================================================================
// 2. Geofencing: zone count scaling
// ============================================================================

fn bench_geofencing(c: &mut Criterion) {
    let mut group = c.benchmark_group("geofencing");

    for side in [2, 8, 32] {
        let dataset = SyntheticFleet {
            grid: (side, side),
            zone_size_meters: 40_000.0 / side as f64,
            vessel_count: 10,
            positions_per_vessel: 1_000,
            ..SyntheticFleet::default()
        }
        .generate();
        let Ok(domain) = dataset.domain("bench") else {
            continue;
        };

        group.bench_with_input(BenchmarkId::new("zones", side * side), &side, |b, _| {
            b.iter(|| {
                dataset
                    .tracks
                    .iter()
                    .map(|t| fence_track(t.clone(), &domain).in_zone.len())
                    .sum::<usize>()
            });
        });
    }

    group.finish();
}

// ============================================================================
// 3. End to end: dispatch + aggregate, sequential vs pooled
// ============================================================================

fn bench_end_to_end(c: &mut Criterion) {
    let mut group = c.benchmark_group("end_to_end");
    group.sampling_mode(SamplingMode::Flat);
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(20));

    let dataset = SyntheticFleet {
        vessel_count: 200,
        ..SyntheticFleet::default()
    }
    .generate();
    let Ok(domain) = dataset.domain("bench") else {
        return;
    };

    for parallel in [0, 2, 4, 8] {
        group.bench_with_input(BenchmarkId::new("parallel", parallel), &parallel, |b, &parallel| {
            b.iter(|| {
                let dir = tempfile::tempdir().expect("tempdir");
                let config = GraphConfig {
                    parallel,
                    tmp_dir: dir.path().join("stores"),
                    output: OutputConfig {
                        output_dir: dir.path().to_path_buf(),
                        ..OutputConfig::default()
                    },
                    ..GraphConfig::default()
                };
                graph(dataset.tracks.clone(), &domain, &config).expect("dispatch");
                aggregate_output(&config.tmp_dir, &config.output).expect("aggregate")
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_segmentation, bench_geofencing, bench_end_to_end);
criterion_main!(benches);
