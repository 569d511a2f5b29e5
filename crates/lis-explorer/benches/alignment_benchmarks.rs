//! Benchmarks for temporal alignment and gage file parsing.
//!
//! Run with: cargo bench --package lis-explorer
//! Or: cargo bench --package lis-explorer --bench alignment_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use lis_explorer::ingest::parse_gage_series;
use lis_explorer::{align, GageFileConfig, TemporalAligner};
use test_utils::{date, gage_rows, gage_series, model_series};

// =============================================================================
// ALIGNMENT BENCHMARKS
// =============================================================================

fn bench_align(c: &mut Criterion) {
    let mut group = c.benchmark_group("align");

    // Daily records; observations start a quarter of the span later
    for n in [365, 3650, 36500] {
        let model = model_series("Streamflow_tavg", date(1990, 1, 1), n, 0.0);
        let observed = gage_series("08158000", date(1990, 1, 1) + chrono::Duration::days(n as i64 / 4), n, 0.0);

        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("overlapping", n), &(model, observed), |b, (m, o)| {
            b.iter(|| align(black_box(m), black_box(o)))
        });
    }

    let model = model_series("Streamflow_tavg", date(1990, 1, 1), 3650, 0.0);
    let observed = gage_series("08158000", date(2010, 1, 1), 3650, 0.0);
    group.bench_function("disjoint_3650", |b| {
        b.iter(|| align(black_box(&model), black_box(&observed)))
    });

    group.finish();
}

fn bench_null_placeholder(c: &mut Criterion) {
    let mut group = c.benchmark_group("null_placeholder");
    let model = model_series("Streamflow_tavg", date(2000, 1, 1), 3650, 0.0);
    let observed = gage_series("08158000", date(2000, 1, 1), 3650, 0.0);

    group.bench_function("first_build", |b| {
        b.iter(|| {
            let mut aligner = TemporalAligner::new();
            let pair = aligner.align(&model, &observed);
            aligner.get_or_build_null(&pair).map(|n| n.len())
        })
    });

    group.finish();
}

// =============================================================================
// INGESTION BENCHMARKS
// =============================================================================

fn bench_parse_gage_file(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_gage_file");
    let config = GageFileConfig::default();

    for n in [365, 3650] {
        let text = gage_rows(&gage_series("08158000", date(2000, 1, 1), n, 1.0));
        group.throughput(Throughput::Bytes(text.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &text, |b, text| {
            b.iter(|| parse_gage_series("08158000", black_box(text), &config))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_align, bench_null_placeholder, bench_parse_gage_file);
criterion_main!(benches);
