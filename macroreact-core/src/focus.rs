//! Focus views — the largest and smallest reactions per event type.
//!
//! Two views over the same (optionally recency-filtered) reaction rows:
//! `event` ranks individual `(event, sector)` reactions; `sector` ranks
//! sectors by their mean reaction. Descriptive only.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::config::FocusConfig;
use crate::domain::{EventId, Metric, ReactionRow};
use crate::reaction::ReactionTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusView {
    Event,
    Sector,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankType {
    Top,
    Bottom,
}

impl fmt::Display for FocusView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FocusView::Event => "event",
            FocusView::Sector => "sector",
        })
    }
}

impl fmt::Display for RankType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RankType::Top => "top",
            RankType::Bottom => "bottom",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusRow {
    pub view: FocusView,
    pub event_type: String,
    pub metric: Metric,
    pub rank_type: RankType,
    /// 1 = most extreme in the `rank_type` direction.
    pub rank: usize,
    /// Set for the event view only.
    pub event_id: Option<EventId>,
    pub event_date: Option<NaiveDate>,
    pub sector: String,
    pub value: f64,
    /// Reactions behind `value`: 1 for the event view, the count averaged
    /// for the sector view.
    pub n: usize,
}

/// Rows surviving the recency filters.
///
/// `last_days` is measured back from the latest event date in the table;
/// `last_events` then keeps the rows on the most recent N distinct event
/// dates, counted across all event types.
pub fn recent_rows<'a>(table: &'a ReactionTable, config: &FocusConfig) -> Vec<&'a ReactionRow> {
    let mut rows: Vec<&ReactionRow> = table.rows().iter().collect();

    if let Some(days) = config.last_days {
        if let Some(latest) = rows.iter().map(|r| r.event_date).max() {
            let cutoff = latest - chrono::Duration::days(i64::from(days));
            rows.retain(|r| r.event_date >= cutoff);
        }
    }

    if let Some(keep) = config.last_events {
        // Most recent N distinct event dates across every event type.
        let dates: BTreeSet<NaiveDate> = rows.iter().map(|r| r.event_date).collect();
        if let Some(&first_kept) = dates.iter().rev().take(keep).last() {
            rows.retain(|r| r.event_date >= first_kept);
        }
    }

    rows
}

struct Candidate<'a> {
    value: f64,
    n: usize,
    sector: &'a str,
    event: Option<&'a ReactionRow>,
}

/// Ranks `candidates` both ways; ties break on sector, then event id.
fn rank_both<'a>(
    view: FocusView,
    event_type: &str,
    metric: Metric,
    mut candidates: Vec<Candidate<'a>>,
    top_n: usize,
    out: &mut Vec<FocusRow>,
) {
    candidates.sort_by(|a, b| {
        b.value
            .total_cmp(&a.value)
            .then_with(|| a.sector.cmp(b.sector))
            .then_with(|| a.event.map(|e| &e.event_id).cmp(&b.event.map(|e| &e.event_id)))
    });
    let take = top_n.min(candidates.len());
    let emit = |c: &Candidate<'a>, rank_type, rank| FocusRow {
        view,
        event_type: event_type.to_string(),
        metric,
        rank_type,
        rank,
        event_id: c.event.map(|e| e.event_id.clone()),
        event_date: c.event.map(|e| e.event_date),
        sector: c.sector.to_string(),
        value: c.value,
        n: c.n,
    };
    for (i, c) in candidates.iter().take(take).enumerate() {
        out.push(emit(c, RankType::Top, i + 1));
    }
    for (i, c) in candidates.iter().rev().take(take).enumerate() {
        out.push(emit(c, RankType::Bottom, i + 1));
    }
}

/// Top-N / bottom-N reactions per `(event_type, metric)` in both views.
pub fn focus_rankings(table: &ReactionTable, config: &FocusConfig) -> Vec<FocusRow> {
    let rows = recent_rows(table, config);

    let mut by_type: BTreeMap<&str, Vec<&ReactionRow>> = BTreeMap::new();
    for r in rows {
        by_type.entry(r.event_type.as_str()).or_default().push(r);
    }

    let mut out = Vec::new();
    for (event_type, rows) in &by_type {
        for &metric in &table.metrics {
            let events: Vec<Candidate> = rows
                .iter()
                .filter_map(|r| {
                    let value = r.value(metric).filter(|v| v.is_finite())?;
                    Some(Candidate {
                        value,
                        n: 1,
                        sector: &r.sector,
                        event: Some(r),
                    })
                })
                .collect();

            let mut per_sector: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
            for c in &events {
                per_sector.entry(c.sector).or_default().push(c.value);
            }
            let sectors: Vec<Candidate> = per_sector
                .into_iter()
                .map(|(sector, vals)| Candidate {
                    value: vals.iter().sum::<f64>() / vals.len() as f64,
                    n: vals.len(),
                    sector,
                    event: None,
                })
                .collect();

            rank_both(FocusView::Event, event_type, metric, events, config.top_n, &mut out);
            rank_both(FocusView::Sector, event_type, metric, sectors, config.top_n, &mut out);
        }
    }
    out
}
