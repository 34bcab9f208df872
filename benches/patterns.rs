//! Benchmarks for candlestick pattern analysis.

use candlescan::prelude::*;
use chrono::{Days, NaiveDate};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Generate realistic deterministic bars
fn generate_series(n: usize) -> CandleSeries {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    let mut candles = Vec::with_capacity(n);
    let mut price = 1000.0;

    for i in 0..n {
        let change = ((i * 7 + 13) % 100) as f64 / 50.0 - 1.0; // Deterministic "random"
        let volatility = 2.0 + ((i * 3) % 10) as f64 / 5.0;

        let o = price;
        let c = price + change;
        let h = o.max(c) + volatility * 0.5;
        let l = o.min(c) - volatility * 0.5;

        candles.push(
            Candle::new(start + Days::new(i as u64), o, h, l, c, 1_000)
                .expect("generated bars are valid"),
        );
        price = c;
    }

    CandleSeries::new(candles).expect("generated dates are ascending")
}

fn bench_analyze(c: &mut Criterion) {
    let analyzer = PatternAnalyzer::new(AnalyzerConfig::default()).unwrap();

    let mut group = c.benchmark_group("analyze");
    for size in [100, 1_000, 10_000] {
        let series = generate_series(size);

        group.bench_with_input(BenchmarkId::new("sequential", size), &series, |b, s| {
            b.iter(|| analyzer.analyze(black_box(s)).unwrap());
        });
        group.bench_with_input(BenchmarkId::new("parallel", size), &series, |b, s| {
            b.iter(|| analyzer.analyze_parallel(black_box(s)).unwrap());
        });
    }
    group.finish();
}

fn bench_summary(c: &mut Criterion) {
    let analyzer = PatternAnalyzer::new(AnalyzerConfig::default()).unwrap();
    let series = generate_series(10_000);
    let rows = analyzer.analyze(&series).unwrap();

    c.bench_function("summarize_10k", |b| {
        b.iter(|| summarize(black_box(&rows)));
    });
}

criterion_group!(benches, bench_analyze, bench_summary);
criterion_main!(benches);
