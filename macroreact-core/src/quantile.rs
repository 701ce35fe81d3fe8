//! Surprise-quantile buckets — mean reaction by surprise size.
//!
//! Boundaries are computed per event type over that type's scored events,
//! so a "large" CPI surprise and a "large" payrolls surprise are each large
//! relative to their own history. The focus recency filters apply here too,
//! before any edge is computed. Descriptive only.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::config::{AnalysisConfig, QuantileBasis};
use crate::domain::{EventId, Metric, ReactionRow};
use crate::focus::recent_rows;
use crate::reaction::ReactionTable;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuantileRow {
    pub event_type: String,
    pub sector: String,
    pub metric: Metric,
    /// 1-based bucket, 1 = smallest basis values.
    pub quantile: usize,
    pub lower: f64,
    pub upper: f64,
    pub n: usize,
    pub mean_reaction: f64,
}

/// Linear-interpolation percentile of sorted data, `q ∈ [0, 1]`.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Bucket edges for `k` quantiles; duplicate edges are dropped, so fewer
/// than `k` buckets may result. `None` when fewer than two edges remain.
pub fn quantile_edges(values: &[f64], k: usize) -> Option<Vec<f64>> {
    if values.is_empty() || k == 0 {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mut edges: Vec<f64> = (0..=k).map(|i| percentile(&sorted, i as f64 / k as f64)).collect();
    edges.dedup();
    (edges.len() >= 2).then_some(edges)
}

/// 1-based bucket of `v`: `(e_{i-1}, e_i]`, with the first bucket closed
/// on the left. `None` outside the edge range.
pub fn bucket_of(v: f64, edges: &[f64]) -> Option<usize> {
    let (first, last) = (*edges.first()?, *edges.last()?);
    if v < first || v > last {
        return None;
    }
    if v == first {
        return Some(1);
    }
    // First edge ≥ v closes the bucket.
    let idx = edges.partition_point(|e| *e < v);
    Some(idx.max(1))
}

fn basis_value(z: f64, basis: QuantileBasis) -> f64 {
    match basis {
        QuantileBasis::Magnitude => z.abs(),
        QuantileBasis::Signed => z,
    }
}

/// Mean reaction and count per `(event_type, sector, metric, bucket)`.
///
/// Rows outside `config.focus.last_days` / `last_events` are dropped first.
/// Types with fewer scored events than `config.quantiles` are skipped.
pub fn surprise_quantiles(table: &ReactionTable, config: &AnalysisConfig) -> Vec<QuantileRow> {
    let mut by_type: BTreeMap<&str, Vec<&ReactionRow>> = BTreeMap::new();
    for row in recent_rows(table, &config.focus) {
        by_type.entry(row.event_type.as_str()).or_default().push(row);
    }

    let mut out = Vec::new();
    for (event_type, rows) in by_type {
        // One basis value per event, not per (event, sector) row.
        let mut per_event: BTreeMap<&EventId, f64> = BTreeMap::new();
        for r in &rows {
            if let Some(z) = r.surprise_z.filter(|z| z.is_finite()) {
                per_event.insert(&r.event_id, basis_value(z, config.quantile_basis));
            }
        }
        if per_event.len() < config.quantiles {
            debug!(event_type, scored = per_event.len(), "too few scored events for quantiles");
            continue;
        }
        let values: Vec<f64> = per_event.values().copied().collect();
        let Some(edges) = quantile_edges(&values, config.quantiles) else {
            continue;
        };

        // (sector, metric, bucket) -> reactions
        let mut cells: BTreeMap<(&str, Metric, usize), Vec<f64>> = BTreeMap::new();
        for r in &rows {
            let Some(b) = per_event.get(&r.event_id).and_then(|v| bucket_of(*v, &edges)) else {
                continue;
            };
            for &metric in &table.metrics {
                if let Some(v) = r.value(metric) {
                    cells.entry((r.sector.as_str(), metric, b)).or_default().push(v);
                }
            }
        }

        for ((sector, metric, bucket), vals) in cells {
            out.push(QuantileRow {
                event_type: event_type.to_string(),
                sector: sector.to_string(),
                metric,
                quantile: bucket,
                lower: edges[bucket - 1],
                upper: edges[bucket],
                n: vals.len(),
                mean_reaction: vals.iter().sum::<f64>() / vals.len() as f64,
            });
        }
    }
    out
}
