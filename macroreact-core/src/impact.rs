//! Impact Estimator — does surprise size predict the sector reaction?
//!
//! For each `(event_type, sector, metric)` with at least `min_sample`
//! complete observations, fit `reaction = alpha + beta · surprise_z` with
//! HC3 inference, then apply Benjamini–Hochberg across every test of the
//! run. Groups below the floor are omitted; degenerate groups are emitted
//! with a reason code.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::AnalysisConfig;
use crate::domain::{ImpactResult, Metric, ReactionRow};
use crate::reaction::ReactionTable;
use crate::stats::{benjamini_hochberg, ols_hc3};

/// `(event_type, sector)` → rows, in key order.
fn group_rows<'a, K: Ord>(
    rows: &'a [ReactionRow],
    key: impl Fn(&'a ReactionRow) -> K,
) -> BTreeMap<K, Vec<&'a ReactionRow>> {
    let mut groups: BTreeMap<K, Vec<&ReactionRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(key(row)).or_default().push(row);
    }
    groups
}

/// Complete `(surprise_z, reaction)` pairs of `metric`.
fn observations(rows: &[&ReactionRow], metric: Metric) -> (Vec<f64>, Vec<f64>) {
    rows.iter()
        .filter_map(|r| Some((r.surprise_z?, r.value(metric)?)))
        .filter(|(x, y)| x.is_finite() && y.is_finite())
        .unzip()
}

/// Slope and t-stat on a subset, when it meets the sample floor.
fn subset_fit(x: &[f64], y: &[f64], keep: impl Fn(f64) -> bool, min_sample: usize) -> (Option<f64>, Option<f64>, usize) {
    let (xs, ys): (Vec<f64>, Vec<f64>) = x
        .iter()
        .zip(y)
        .filter(|(xi, _)| keep(**xi))
        .map(|(a, b)| (*a, *b))
        .unzip();
    let n = xs.len();
    if n < min_sample {
        return (None, None, n);
    }
    match ols_hc3(&xs, &ys) {
        Some(fit) => (fit.beta, fit.t_stat, n),
        None => (None, None, n),
    }
}

fn fit_group(
    event_type: &str,
    sector: &str,
    rows: &[&ReactionRow],
    metrics: &[Metric],
    min_sample: usize,
) -> Vec<ImpactResult> {
    let mut out = Vec::new();
    for &metric in metrics {
        let (x, y) = observations(rows, metric);
        if x.len() < min_sample {
            continue;
        }
        let Some(fit) = ols_hc3(&x, &y) else { continue };
        let (beta_pos, t_pos, n_pos) = subset_fit(&x, &y, |z| z > 0.0, min_sample);
        let (beta_neg, t_neg, n_neg) = subset_fit(&x, &y, |z| z < 0.0, min_sample);

        out.push(ImpactResult {
            event_type: event_type.to_string(),
            sector: sector.to_string(),
            metric,
            n: fit.n,
            alpha: fit.alpha,
            beta: fit.beta,
            se: fit.se_hc3,
            se_classical: fit.se_classical,
            t_stat: fit.t_stat,
            p_value: fit.p_value,
            p_adj_bh: None,
            significant_bh: false,
            reason: fit.reason,
            beta_pos,
            t_pos,
            n_pos,
            beta_neg,
            t_neg,
            n_neg,
        });
    }
    out
}

/// Run every impact regression of the table and correct them as one family.
pub fn estimate_impact(table: &ReactionTable, config: &AnalysisConfig) -> Vec<ImpactResult> {
    let groups = group_rows(table.rows(), |r| (r.event_type.as_str(), r.sector.as_str()));
    let groups: Vec<_> = groups.into_iter().collect();

    let mut results: Vec<ImpactResult> = groups
        .par_iter()
        .map(|((event_type, sector), rows)| {
            let fitted = fit_group(event_type, sector, rows, &table.metrics, config.min_sample);
            debug!(event_type, sector, tests = fitted.len(), "impact group fitted");
            fitted
        })
        .collect::<Vec<_>>()
        .into_iter()
        .flatten()
        .collect();

    let p: Vec<Option<f64>> = results.iter().map(|r| r.p_value).collect();
    for (r, bh) in results.iter_mut().zip(benjamini_hochberg(&p, config.fdr_alpha)) {
        r.p_adj_bh = bh.p_adj;
        r.significant_bh = bh.significant;
    }

    info!(
        tests = results.len(),
        significant = results.iter().filter(|r| r.significant_bh).count(),
        "impact estimated"
    );
    results
}

#[cfg(test)]
pub(crate) mod test_rows {
    use crate::domain::{EventId, Metric, ReactionRow, UNKNOWN_REGIME};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    /// A reaction row carrying only what the estimators read.
    pub fn row(id: &str, event_type: &str, sector: &str, z: Option<f64>, t0: Option<f64>) -> ReactionRow {
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let mut values = BTreeMap::new();
        values.insert(Metric::T0, t0);
        ReactionRow {
            event_id: EventId::new(id),
            event_name: event_type.to_string(),
            event_type: event_type.to_string(),
            importance: "high".into(),
            event_date: date,
            t0_date: date,
            regime: UNKNOWN_REGIME.into(),
            sector: sector.to_string(),
            surprise: z,
            surprise_z: z,
            values,
            cycle: BTreeMap::new(),
        }
    }
}
