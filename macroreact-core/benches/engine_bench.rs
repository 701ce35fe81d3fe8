//! Criterion benchmarks for MacroReact hot paths.
//!
//! Benchmarks:
//! 1. Return panel build (union calendar + cumulative levels)
//! 2. Window builder (every metric, every event, every ticker)
//! 3. Impact estimator (HC3 fits + BH over all groups)

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use macroreact_core::domain::{Metric, PriceSeries, ReactionRow};
use macroreact_core::returns::build_windows;
use macroreact_core::{estimate_impact, AnalysisConfig, BenchmarkAdjustment, ReactionTable, ReturnPanel};

// ── Helpers ──────────────────────────────────────────────────────────

fn make_series(tickers: usize, days: usize) -> Vec<PriceSeries> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2015, 1, 2).unwrap();
    (0..tickers)
        .map(|t| {
            let pts = (0..days)
                .map(|i| {
                    let close = 100.0 + ((i + t * 7) as f64 * 0.1).sin() * 10.0;
                    (base_date + chrono::Duration::days(i as i64), close)
                })
                .collect();
            PriceSeries::new(format!("T{t:03}"), pts).unwrap()
        })
        .collect()
}

fn make_table(event_types: usize, sectors: usize, events_per_type: usize) -> ReactionTable {
    let config = AnalysisConfig::default();
    let metrics = Metric::all_for(&config.sorted_return_windows());
    let date = chrono::NaiveDate::from_ymd_opt(2020, 1, 2).unwrap();
    let mut rows = Vec::new();
    for et in 0..event_types {
        for e in 0..events_per_type {
            let z = ((e * 13 + et) as f64 * 0.37).sin() * 2.0;
            for s in 0..sectors {
                let values = metrics
                    .iter()
                    .enumerate()
                    .map(|(mi, &m)| {
                        let noise = ((e * 31 + s * 17 + mi) as f64).cos() * 0.003;
                        (m, Some(0.002 * s as f64 * z + noise))
                    })
                    .collect();
                rows.push(ReactionRow {
                    event_id: macroreact_core::domain::EventId::new(format!("E{et}-{e}")),
                    event_name: format!("Type {et}"),
                    event_type: format!("T{et}"),
                    importance: "high".into(),
                    event_date: date,
                    t0_date: date,
                    regime: "unknown".into(),
                    sector: format!("S{s:02}"),
                    surprise: Some(z),
                    surprise_z: Some(z),
                    values,
                    cycle: Default::default(),
                });
            }
        }
    }
    ReactionTable {
        metrics,
        cycle_windows: vec![],
        rows,
        diagnostics: Default::default(),
    }
}

// ── 1. Return Panel ──────────────────────────────────────────────────

fn bench_return_panel(c: &mut Criterion) {
    let mut group = c.benchmark_group("return_panel");
    for &tickers in &[10usize, 100] {
        let series = make_series(tickers, 2_500);
        group.bench_with_input(BenchmarkId::from_parameter(tickers), &series, |b, series| {
            b.iter(|| ReturnPanel::build(black_box(series)))
        });
    }
    group.finish();
}

// ── 2. Window Builder ────────────────────────────────────────────────

fn bench_window_builder(c: &mut Criterion) {
    let series = make_series(100, 2_500);
    let panel = ReturnPanel::build(&series);
    let members: Vec<(String, String)> = series
        .iter()
        .enumerate()
        .map(|(i, s)| (s.ticker().to_string(), format!("S{:02}", i % 11)))
        .collect();
    let metrics = Metric::all_for(&[1, 5, 10, 21]);
    let t0s: Vec<usize> = (30..2_400).step_by(20).collect();

    c.bench_function("window_builder_100x120", |b| {
        b.iter(|| {
            build_windows(
                black_box(&panel),
                &members,
                &BenchmarkAdjustment::None,
                &t0s,
                &metrics,
            )
        })
    });
}

// ── 3. Impact Estimator ──────────────────────────────────────────────

fn bench_impact(c: &mut Criterion) {
    let config = AnalysisConfig::default();
    let mut group = c.benchmark_group("impact");
    for &events in &[24usize, 120] {
        let table = make_table(8, 11, events);
        group.bench_with_input(BenchmarkId::from_parameter(events), &table, |b, table| {
            b.iter(|| estimate_impact(black_box(table), &config))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_return_panel, bench_window_builder, bench_impact);
criterion_main!(benches);
