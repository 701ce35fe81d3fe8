//! BDD tests for the reaction engine, end to end over synthetic markets.
//!
//! These tests verify:
//! - Surprise scores, windows and sector averages join into one table
//! - A planted surprise sensitivity is recovered and survives BH
//! - Momentum controls, quantiles and focus views read the same table
//! - Benchmark adjustment is applied exactly once

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use macroreact_core::domain::{Event, EventId, Metric, PriceSeries, RegimeCalendar, RegimeRange, SectorMap};
use macroreact_core::{
    assemble, estimate_impact, estimate_partial, focus_rankings, normalize_surprises, surprise_quantiles,
    AnalysisConfig, AssemblyInputs, BenchmarkAdjustment, FocusView, ReactionTable, ReturnPanel, SectorCycle,
};

const DAYS: usize = 420;
const EVENTS: usize = 36;
const TECH_SENSITIVITY: f64 = 0.01;

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2022, 1, 3).unwrap() + chrono::Duration::days(i as i64)
}

fn event_day(i: usize) -> usize {
    40 + 10 * i
}

struct Market {
    events: Vec<Event>,
    series: Vec<PriceSeries>,
    sector_map: SectorMap,
    regimes: RegimeCalendar,
}

/// Tech moves `TECH_SENSITIVITY` per unit of surprise z on t0; Energy only
/// carries noise. `XLK` is a flat Tech benchmark.
fn synthetic_market(seed: u64, config: &AnalysisConfig) -> Market {
    let mut rng = StdRng::seed_from_u64(seed);
    let events: Vec<Event> = (0..EVENTS)
        .map(|i| Event {
            event_id: EventId::new(format!("cpi-{i:02}")),
            event_name: "CPI YoY".into(),
            event_type: "CPI".into(),
            event_date: day(event_day(i)),
            importance: "high".into(),
            expected_value: Some(3.0),
            actual_value: Some(3.0 + rng.gen_range(-0.5..0.5)),
        })
        .collect();
    let scores = normalize_surprises(&events, &config.surprise);

    let mut tech = vec![0.0; DAYS];
    let mut energy = vec![0.0; DAYS];
    for d in 0..DAYS {
        tech[d] = rng.gen_range(-0.002..0.002);
        energy[d] = rng.gen_range(-0.002..0.002);
    }
    for (i, s) in scores.iter().enumerate() {
        if let Some(z) = s.surprise_z {
            tech[event_day(i)] += TECH_SENSITIVITY * z;
        }
    }

    let path = |ticker: &str, returns: &[f64]| {
        let mut p = 100.0;
        let pts = (0..DAYS)
            .map(|d| {
                if d > 0 {
                    p *= 1.0 + returns[d];
                }
                (day(d), p)
            })
            .collect();
        PriceSeries::new(ticker, pts).unwrap()
    };
    let series = vec![
        path("AAPL", &tech),
        path("MSFT", &tech),
        path("XOM", &energy),
        path("XLK", &vec![0.0; DAYS]),
    ];

    let pairs = |v: &[(&str, &str)]| v.iter().map(|(a, b)| (a.to_string(), b.to_string())).collect::<Vec<_>>();
    let sector_map = SectorMap::new(
        pairs(&[("AAPL", "Tech"), ("MSFT", "Tech"), ("XOM", "Energy")]),
        pairs(&[("Tech", "XLK")]),
    )
    .unwrap();

    let regimes = RegimeCalendar::new(vec![
        RegimeRange {
            start_date: day(0),
            end_date: day(209),
            regime_name: "tightening".into(),
        },
        RegimeRange {
            start_date: day(210),
            end_date: day(DAYS - 1),
            regime_name: "easing".into(),
        },
    ])
    .unwrap();

    Market {
        events,
        series,
        sector_map,
        regimes,
    }
}

fn run(market: &Market, adjustment: &BenchmarkAdjustment, config: &AnalysisConfig) -> ReactionTable {
    let scores = normalize_surprises(&market.events, &config.surprise);
    let panel = ReturnPanel::build(&market.series);
    let cycle = SectorCycle::build(&panel, &market.sector_map, &config.sorted_cycle_windows());
    assemble(
        AssemblyInputs {
            events: &market.events,
            scores: &scores,
            panel: &panel,
            sector_map: &market.sector_map,
            adjustment,
            regimes: &market.regimes,
            cycle: &cycle,
        },
        config,
    )
}

#[test]
fn bdd_scenario_planted_sensitivity_is_recovered() {
    // GIVEN a market where Tech reacts to CPI surprises and Energy does not
    let config = AnalysisConfig::default();
    let market = synthetic_market(42, &config);

    // WHEN the reaction table is assembled and impact estimated
    let table = run(&market, &BenchmarkAdjustment::None, &config);
    let impact = estimate_impact(&table, &config);

    // THEN every event yields one row per sector
    assert_eq!(table.len(), EVENTS * 2);
    assert_eq!(table.event_count(), EVENTS);

    // AND the Tech t0 slope matches the planted sensitivity
    let tech_t0 = impact
        .iter()
        .find(|r| r.sector == "Tech" && r.metric == Metric::T0)
        .expect("tech t0 impact");
    assert_eq!(tech_t0.n, EVENTS - config.surprise.min_periods);
    assert!((tech_t0.beta.unwrap() - TECH_SENSITIVITY).abs() < 0.002);
    assert!(tech_t0.significant_bh);

    // AND Energy's t0 response is flat
    let energy_t0 = impact
        .iter()
        .find(|r| r.sector == "Energy" && r.metric == Metric::T0)
        .expect("energy t0 impact");
    assert!(energy_t0.beta.unwrap().abs() < 0.002);
    assert!(energy_t0.t_stat.unwrap().abs() < tech_t0.t_stat.unwrap().abs());
}

#[test]
fn bdd_scenario_sector_benchmark_is_applied_once() {
    // GIVEN the same market with a flat Tech benchmark and a global one
    let config = AnalysisConfig {
        global_benchmark: Some("XOM".into()),
        ..AnalysisConfig::default()
    };
    let market = synthetic_market(7, &config);

    // WHEN both are configured, sector adjustment wins
    let (both, warning) = BenchmarkAdjustment::resolve(config.global_benchmark.as_deref(), &market.sector_map);
    let (sector_only, _) = BenchmarkAdjustment::resolve(None, &market.sector_map);
    assert!(warning.is_some());

    // THEN the reaction values equal the sector-only result
    let a = run(&market, &both, &config);
    let b = run(&market, &sector_only, &config);
    assert_eq!(a.rows, b.rows);

    // AND a flat benchmark leaves Tech reactions unchanged
    let raw = run(&market, &BenchmarkAdjustment::None, &config);
    for (adjusted, unadjusted) in a.rows.iter().zip(&raw.rows).filter(|(r, _)| r.sector == "Tech") {
        for m in &a.metrics {
            match (adjusted.value(*m), unadjusted.value(*m)) {
                (Some(x), Some(y)) => assert!((x - y).abs() < 1e-12),
                (x, y) => assert_eq!(x.is_some(), y.is_some()),
            }
        }
    }
}

#[test]
fn bdd_scenario_downstream_views_share_the_table() {
    // GIVEN an assembled table with regimes and cycle snapshots
    let config = AnalysisConfig::default();
    let market = synthetic_market(3, &config);
    let table = run(&market, &BenchmarkAdjustment::None, &config);

    // WHEN the partial, quantile and focus analyses run
    let partial = estimate_partial(&table, &config);
    let quantiles = surprise_quantiles(&table, &config);
    let focus = focus_rankings(&table, &config.focus);

    // THEN each row carries its regime and a momentum snapshot
    assert!(table.rows().iter().all(|r| r.regime == "tightening" || r.regime == "easing"));
    assert!(table.rows().iter().all(|r| r.cycle.contains_key(&21)));

    // AND partial fits exist overall and within a regime
    assert!(partial.iter().any(|r| r.scope.to_string() == "overall" && r.sector == "Tech"));
    assert!(partial.iter().any(|r| r.scope.to_string().starts_with("regime:")));

    // AND quantile buckets cover every scored event once per sector and metric
    let scored = table.rows().iter().filter(|r| r.sector == "Tech" && r.surprise_z.is_some()).count();
    let tech_t0: usize = quantiles
        .iter()
        .filter(|q| q.sector == "Tech" && q.metric == Metric::T0)
        .map(|q| q.n)
        .sum();
    assert_eq!(tech_t0, scored);

    // AND the event view's top reaction is the largest t0 move
    let top = focus
        .iter()
        .find(|f| f.view == FocusView::Event && f.metric == Metric::T0 && f.rank == 1)
        .expect("top focus row");
    let max = table
        .rows()
        .iter()
        .filter_map(|r| r.value(Metric::T0))
        .fold(f64::NEG_INFINITY, f64::max);
    assert_eq!(top.value, max);
}

#[test]
fn bdd_scenario_reruns_are_identical() {
    // GIVEN one market
    let config = AnalysisConfig::default();
    let market = synthetic_market(99, &config);

    // WHEN the engine runs twice
    let first = run(&market, &BenchmarkAdjustment::None, &config);
    let second = run(&market, &BenchmarkAdjustment::None, &config);

    // THEN tables and estimates are equal
    assert_eq!(first, second);
    assert_eq!(estimate_impact(&first, &config), estimate_impact(&second, &config));
}
