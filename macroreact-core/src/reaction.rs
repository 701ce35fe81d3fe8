//! Reaction Matrix Assembler — events × sectors × horizons.
//!
//! Joins per-ticker window returns (benchmark-adjusted once, upstream of
//! any window), surprise scores, regime labels and the sector momentum
//! snapshot into the canonical long-form table every estimator reads.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::benchmark::BenchmarkAdjustment;
use crate::config::AnalysisConfig;
use crate::cycle::SectorCycle;
use crate::domain::{Event, EventId, Metric, ReactionRecord, ReactionRow, RegimeCalendar, SectorMap};
use crate::returns::{build_windows, ReturnPanel};
use crate::surprise::SurpriseScore;

/// Everything the assembler needs, borrowed from the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct AssemblyInputs<'a> {
    pub events: &'a [Event],
    pub scores: &'a [SurpriseScore],
    pub panel: &'a ReturnPanel,
    pub sector_map: &'a SectorMap,
    pub adjustment: &'a BenchmarkAdjustment,
    pub regimes: &'a RegimeCalendar,
    pub cycle: &'a SectorCycle,
}

/// Inputs the assembler could not place in the table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssemblyDiagnostics {
    /// Events with no trading day on the aligned side of their date.
    pub events_without_t0: Vec<EventId>,
    /// Mapped tickers absent from the price table.
    pub unpriced_tickers: Vec<String>,
}

/// The canonical reaction table of one market run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReactionTable {
    pub metrics: Vec<Metric>,
    pub cycle_windows: Vec<u32>,
    pub rows: Vec<ReactionRow>,
    pub diagnostics: AssemblyDiagnostics,
}

impl ReactionTable {
    pub fn rows(&self) -> &[ReactionRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Offset-level records of every row.
    pub fn records(&self) -> Vec<ReactionRecord> {
        self.rows.iter().flat_map(ReactionRow::records).collect()
    }

    /// Number of distinct events present in the table.
    pub fn event_count(&self) -> usize {
        let mut ids: Vec<&EventId> = self.rows.iter().map(|r| &r.event_id).collect();
        ids.sort();
        ids.dedup();
        ids.len()
    }
}

/// Build the reaction table.
///
/// Sector values are the equal-weighted mean over constituents with a
/// non-null value for the cell. Tickers acting as the active benchmark are
/// reference series, not constituents, and are left out of the averages.
pub fn assemble(inputs: AssemblyInputs<'_>, config: &AnalysisConfig) -> ReactionTable {
    let AssemblyInputs {
        events,
        scores,
        panel,
        sector_map,
        adjustment,
        regimes,
        cycle,
    } = inputs;
    let calendar = panel.calendar();
    let metrics = Metric::all_for(&config.sorted_return_windows());

    let mut diagnostics = AssemblyDiagnostics::default();

    // Events in (date, id) order, each aligned to a t0 index.
    let mut order: Vec<usize> = (0..events.len()).collect();
    order.sort_by(|&a, &b| {
        events[a]
            .event_date
            .cmp(&events[b].event_date)
            .then_with(|| events[a].event_id.cmp(&events[b].event_id))
    });
    let mut aligned: Vec<(usize, usize)> = Vec::with_capacity(order.len());
    for idx in order {
        match calendar.align(events[idx].event_date, config.t0_alignment) {
            Some(t0) => aligned.push((idx, t0)),
            None => diagnostics.events_without_t0.push(events[idx].event_id.clone()),
        }
    }

    let reference = adjustment.tickers();
    let members: Vec<(String, String)> = sector_map
        .tickers()
        .filter(|(t, _)| !reference.contains(t))
        .map(|(t, s)| (t.to_string(), s.to_string()))
        .collect();
    diagnostics.unpriced_tickers = members
        .iter()
        .filter(|(t, _)| !panel.contains(t))
        .map(|(t, _)| t.clone())
        .collect();

    let t0s: Vec<usize> = aligned.iter().map(|&(_, t0)| t0).collect();
    let windows = build_windows(panel, &members, adjustment, &t0s, &metrics);

    let mut by_sector: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (t, s) in &members {
        by_sector.entry(s.as_str()).or_default().push(t.as_str());
    }

    let mut rows = Vec::with_capacity(aligned.len() * by_sector.len());
    for (pos, &(idx, t0)) in aligned.iter().enumerate() {
        let ev = &events[idx];
        let score = scores.get(idx).copied().unwrap_or_default();
        let Some(t0_date) = calendar.date(t0) else { continue };
        // Regime of the day the market reacts, not the announcement date.
        let regime = regimes.resolve(t0_date).to_string();

        for (&sector, tickers) in &by_sector {
            let values: BTreeMap<Metric, Option<f64>> = metrics
                .iter()
                .enumerate()
                .map(|(mi, &metric)| {
                    let cells: Vec<f64> = tickers
                        .iter()
                        .filter_map(|t| windows.get(*t).and_then(|w| w[pos][mi]))
                        .collect();
                    (metric, crate::stats::mean(&cells))
                })
                .collect();

            rows.push(ReactionRow {
                event_id: ev.event_id.clone(),
                event_name: ev.event_name.clone(),
                event_type: ev.event_type.clone(),
                importance: ev.importance.clone(),
                event_date: ev.event_date,
                t0_date,
                regime: regime.clone(),
                sector: sector.to_string(),
                surprise: score.surprise,
                surprise_z: score.surprise_z,
                values,
                cycle: cycle.snapshot(sector, t0.checked_sub(1)),
            });
        }
        debug!(event = %ev.event_id, t0 = %t0_date, "assembled event");
    }

    info!(
        rows = rows.len(),
        events = aligned.len(),
        dropped = diagnostics.events_without_t0.len(),
        adjustment = adjustment.label(),
        "reaction matrix assembled"
    );

    ReactionTable {
        metrics,
        cycle_windows: cycle.windows().to_vec(),
        rows,
        diagnostics,
    }
}
