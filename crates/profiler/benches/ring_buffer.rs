use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lod_config::ProfilerConfig;
use lod_profiler::PerformanceProfiler;

fn filled_profiler(capacity: usize) -> PerformanceProfiler {
    let config = ProfilerConfig {
        capacity,
        ..ProfilerConfig::default()
    };
    let mut profiler = PerformanceProfiler::new(&config, 60, 1 << 30).unwrap();
    for i in 0..capacity {
        let _ = profiler.record_frame(10.0 + (i % 13) as f64, 150, 400_000, 64 << 20);
    }
    profiler
}

// Steady-state append into a full ring
fn record_frame_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("record_frame");

    for capacity in [120, 1_000, 10_000].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(capacity),
            capacity,
            |b, &capacity| {
                let mut profiler = filled_profiler(capacity);
                b.iter(|| {
                    profiler
                        .record_frame(black_box(16.6), black_box(150), 400_000, 64 << 20)
                        .ok()
                });
            },
        );
    }

    group.finish();
}

fn statistics_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");
    let profiler = filled_profiler(120);

    group.bench_function("rolling_stats", |b| {
        b.iter(|| black_box(profiler.rolling_stats()))
    });

    group.bench_function("classify_bottleneck", |b| {
        b.iter(|| black_box(profiler.classify_bottleneck()))
    });

    group.finish();
}

criterion_group!(benches, record_frame_benchmark, statistics_benchmark);
criterion_main!(benches);
