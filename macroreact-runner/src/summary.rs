//! Compact per-market summary for downstream rendering.
//!
//! Everything here is derived from a [`MarketRun`]; there are no wall-clock
//! fields, so the same inputs and config always serialize to the same bytes.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use macroreact_core::domain::{CyclePoint, Market, Metric};
use macroreact_core::{FocusView, RankType};

use crate::pipeline::MarketRun;

/// Current schema version for `summary.json`.
pub const SCHEMA_VERSION: u32 = 1;

const TOP_IMPACTS: usize = 15;
const REGIME_SECTORS: usize = 5;
const RECENT_EVENTS: usize = 10;

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub market: Market,
    pub dataset_hash: String,
    pub config_hash: String,
    pub benchmark_adjustment: String,
    pub counts: Counts,
    pub data_quality: DataQuality,
    /// Top impacts by |t|: significant ones when any, otherwise the
    /// strongest tests flagged `significant = false`.
    pub significant_impacts: Vec<ImpactHighlight>,
    pub focus: Vec<FocusHighlight>,
    pub current_regime: Option<RegimeHighlight>,
    pub momentum_snapshot: Option<MomentumSnapshot>,
    pub recent_events: Vec<RecentEvent>,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Counts {
    pub events: usize,
    pub event_types: usize,
    pub sectors: usize,
    pub reaction_rows: usize,
    pub impact_tests: usize,
    pub significant_impacts: usize,
    pub partial_tests: usize,
    pub significant_partials: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataQuality {
    pub total_events: usize,
    pub with_actual: usize,
    pub with_expected: usize,
    pub with_surprise_z: usize,
    pub first_event_date: Option<NaiveDate>,
    pub last_event_date: Option<NaiveDate>,
    /// Event types without a single released actual value.
    pub event_types_no_data: Vec<String>,
    pub events_without_t0: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactHighlight {
    pub event_type: String,
    pub sector: String,
    pub metric: Metric,
    pub n: usize,
    pub beta: Option<f64>,
    pub t_stat: Option<f64>,
    pub p_adj: Option<f64>,
    pub significant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorValue {
    pub sector: String,
    pub value: f64,
}

/// Top and bottom sectors of one event type, t0 reaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusHighlight {
    pub event_type: String,
    pub metric: Metric,
    pub top_sectors: Vec<SectorValue>,
    pub bottom_sectors: Vec<SectorValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeHighlight {
    pub regime: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub top_sectors: Vec<SectorValue>,
    pub bottom_sectors: Vec<SectorValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MomentumSnapshot {
    pub date: NaiveDate,
    /// sector → window → momentum and rank
    pub sectors: BTreeMap<String, BTreeMap<u32, CyclePoint>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentEvent {
    pub event_id: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub actual: Option<f64>,
    pub expected: Option<f64>,
    pub surprise_z: Option<f64>,
}

// ─── Builders ────────────────────────────────────────────────────────

pub fn build_summary(run: &MarketRun) -> Summary {
    let sectors: BTreeSet<&str> = run.table.rows().iter().map(|r| r.sector.as_str()).collect();
    let event_types: BTreeSet<&str> = run.events.iter().map(|e| e.event_type.as_str()).collect();

    Summary {
        schema_version: SCHEMA_VERSION,
        market: run.market,
        dataset_hash: run.dataset_hash.clone(),
        config_hash: run.config_hash.clone(),
        benchmark_adjustment: run.adjustment.label().to_string(),
        counts: Counts {
            events: run.events.len(),
            event_types: event_types.len(),
            sectors: sectors.len(),
            reaction_rows: run.table.len(),
            impact_tests: run.impact.len(),
            significant_impacts: run.impact.iter().filter(|r| r.significant_bh).count(),
            partial_tests: run.partial.len(),
            significant_partials: run.partial.iter().filter(|r| r.significant_bh).count(),
        },
        data_quality: data_quality(run),
        significant_impacts: significant_impacts(run, TOP_IMPACTS),
        focus: focus_highlights(run),
        current_regime: current_regime(run, REGIME_SECTORS),
        momentum_snapshot: momentum_snapshot(run),
        recent_events: recent_events(run, RECENT_EVENTS),
        warnings: run.data_quality_warnings.clone(),
    }
}

fn data_quality(run: &MarketRun) -> DataQuality {
    let mut released_by_type: BTreeMap<&str, usize> = BTreeMap::new();
    for ev in &run.events {
        *released_by_type.entry(ev.event_type.as_str()).or_default() += usize::from(ev.actual_value.is_some());
    }
    DataQuality {
        total_events: run.events.len(),
        with_actual: run.events.iter().filter(|e| e.actual_value.is_some()).count(),
        with_expected: run.events.iter().filter(|e| e.expected_value.is_some()).count(),
        with_surprise_z: run.scores.iter().filter(|s| s.surprise_z.is_some()).count(),
        first_event_date: run.events.iter().map(|e| e.event_date).min(),
        last_event_date: run.events.iter().map(|e| e.event_date).max(),
        event_types_no_data: released_by_type
            .into_iter()
            .filter(|(_, n)| *n == 0)
            .map(|(t, _)| t.to_string())
            .collect(),
        events_without_t0: run.table.diagnostics.events_without_t0.len(),
    }
}

fn significant_impacts(run: &MarketRun, top_n: usize) -> Vec<ImpactHighlight> {
    let any_significant = run.impact.iter().any(|r| r.significant_bh);
    let mut picked: Vec<_> = run
        .impact
        .iter()
        .filter(|r| r.t_stat.is_some() && (!any_significant || r.significant_bh))
        .collect();
    // |t| descending; key order breaks ties
    picked.sort_by(|a, b| {
        let ta = a.t_stat.map_or(0.0, f64::abs);
        let tb = b.t_stat.map_or(0.0, f64::abs);
        tb.total_cmp(&ta)
            .then_with(|| (&a.event_type, &a.sector, a.metric).cmp(&(&b.event_type, &b.sector, b.metric)))
    });
    picked
        .into_iter()
        .take(top_n)
        .map(|r| ImpactHighlight {
            event_type: r.event_type.clone(),
            sector: r.sector.clone(),
            metric: r.metric,
            n: r.n,
            beta: r.beta,
            t_stat: r.t_stat,
            p_adj: r.p_adj_bh,
            significant: r.significant_bh,
        })
        .collect()
}

fn focus_highlights(run: &MarketRun) -> Vec<FocusHighlight> {
    let mut by_type: BTreeMap<&str, FocusHighlight> = BTreeMap::new();
    for f in run
        .focus
        .iter()
        .filter(|f| f.view == FocusView::Sector && f.metric == Metric::T0)
    {
        let entry = by_type.entry(f.event_type.as_str()).or_insert_with(|| FocusHighlight {
            event_type: f.event_type.clone(),
            metric: f.metric,
            top_sectors: Vec::new(),
            bottom_sectors: Vec::new(),
        });
        let item = SectorValue {
            sector: f.sector.clone(),
            value: f.value,
        };
        match f.rank_type {
            RankType::Top => entry.top_sectors.push(item),
            RankType::Bottom => entry.bottom_sectors.push(item),
        }
    }
    by_type.into_values().collect()
}

/// The last regime range and its best and worst sectors by average daily return.
fn current_regime(run: &MarketRun, top_n: usize) -> Option<RegimeHighlight> {
    let range = run.regimes.ranges().last()?;
    let mut sectors: Vec<SectorValue> = run
        .regime_averages
        .iter()
        .filter(|a| a.regime == range.regime_name && a.start_date == range.start_date)
        .filter_map(|a| {
            Some(SectorValue {
                sector: a.sector.clone(),
                value: a.avg_daily_return?,
            })
        })
        .collect();
    sectors.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.sector.cmp(&b.sector)));
    let top_sectors: Vec<SectorValue> = sectors.iter().take(top_n).cloned().collect();
    let bottom_sectors: Vec<SectorValue> = sectors.iter().rev().take(top_n).cloned().collect();
    Some(RegimeHighlight {
        regime: range.regime_name.clone(),
        start_date: range.start_date,
        end_date: range.end_date,
        top_sectors,
        bottom_sectors,
    })
}

/// Momentum and rank of every sector on the latest date of the rank table.
fn momentum_snapshot(run: &MarketRun) -> Option<MomentumSnapshot> {
    let date = run.cycle_rows.iter().map(|r| r.date).max()?;
    let sectors = run
        .cycle_rows
        .iter()
        .filter(|r| r.date == date)
        .map(|r| {
            let points: BTreeMap<u32, CyclePoint> = run.cycle_windows.iter().copied().zip(r.points.iter().copied()).collect();
            (r.sector.clone(), points)
        })
        .collect();
    Some(MomentumSnapshot { date, sectors })
}

fn recent_events(run: &MarketRun, n: usize) -> Vec<RecentEvent> {
    let mut released: Vec<usize> = (0..run.events.len())
        .filter(|&i| run.events[i].actual_value.is_some())
        .collect();
    released.sort_by(|&a, &b| {
        let (ea, eb) = (&run.events[a], &run.events[b]);
        eb.event_date.cmp(&ea.event_date).then_with(|| ea.event_id.cmp(&eb.event_id))
    });
    released
        .into_iter()
        .take(n)
        .map(|i| {
            let ev = &run.events[i];
            RecentEvent {
                event_id: ev.event_id.to_string(),
                event_type: ev.event_type.clone(),
                event_date: ev.event_date,
                actual: ev.actual_value,
                expected: ev.expected_value,
                surprise_z: run.scores.get(i).and_then(|s| s.surprise_z),
            }
        })
        .collect()
}
