//! Partial Impact Estimator — surprise effect net of prior sector momentum.
//!
//! `reaction = alpha + beta · surprise_z + gamma · control`, where the
//! control is the sector's momentum rank (or raw momentum) for one cycle
//! window as of the day before t0. Fitted over all rows (`overall`) and,
//! optionally, within each named regime. All partial tests of a run form
//! one BH family.

use rayon::prelude::*;
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::config::{AnalysisConfig, MomentumControl, MomentumMeasure};
use crate::domain::{Metric, PartialImpactResult, ReactionRow, Scope, UNKNOWN_REGIME};
use crate::reaction::ReactionTable;
use crate::stats::{benjamini_hochberg, ols2_hc3};

/// Three coefficients need at least one residual degree of freedom.
const MIN_PARTIAL_OBS: usize = 4;

fn control_value(row: &ReactionRow, control: &MomentumControl) -> Option<f64> {
    let point = row.cycle.get(&control.window)?;
    match control.measure {
        MomentumMeasure::Rank => point.rank.map(f64::from),
        MomentumMeasure::Return => point.momentum,
    }
}

/// Complete `(surprise_z, control, reaction)` triples of `metric`.
fn observations(
    rows: &[&ReactionRow],
    metric: Metric,
    control: &MomentumControl,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let mut x1 = Vec::with_capacity(rows.len());
    let mut x2 = Vec::with_capacity(rows.len());
    let mut y = Vec::with_capacity(rows.len());
    for r in rows {
        if let (Some(z), Some(c), Some(v)) = (r.surprise_z, control_value(r, control), r.value(metric)) {
            if z.is_finite() && c.is_finite() && v.is_finite() {
                x1.push(z);
                x2.push(c);
                y.push(v);
            }
        }
    }
    (x1, x2, y)
}

fn scopes_of(row: &ReactionRow, by_regime: bool) -> Vec<Scope> {
    let mut scopes = vec![Scope::Overall];
    if by_regime && row.regime != UNKNOWN_REGIME {
        scopes.push(Scope::Regime(row.regime.clone()));
    }
    scopes
}

/// Run every partial regression of the table and correct them as one family.
///
/// Rows whose regime is `unknown` contribute to `overall` only.
pub fn estimate_partial(table: &ReactionTable, config: &AnalysisConfig) -> Vec<PartialImpactResult> {
    let control = &config.momentum_control;
    let control_name = control.column_name();
    let floor = config.min_sample.max(MIN_PARTIAL_OBS);

    // Expand each row into its scopes, then group by (scope, type, sector).
    let scoped: Vec<(Scope, &ReactionRow)> = table
        .rows()
        .iter()
        .flat_map(|r| scopes_of(r, config.partial_by_regime).into_iter().map(move |s| (s, r)))
        .collect();
    let mut groups: BTreeMap<(Scope, &str, &str), Vec<&ReactionRow>> = BTreeMap::new();
    for (scope, row) in scoped {
        groups
            .entry((scope, row.event_type.as_str(), row.sector.as_str()))
            .or_default()
            .push(row);
    }
    let groups: Vec<_> = groups.into_iter().collect();

    let mut results: Vec<PartialImpactResult> = groups
        .par_iter()
        .map(|((scope, event_type, sector), rows)| {
            let mut out = Vec::new();
            for &metric in &table.metrics {
                let (x1, x2, y) = observations(rows, metric, control);
                if y.len() < floor {
                    debug!(scope = %scope, event_type, sector, %metric, n = y.len(), floor, "partial group below floor");
                    continue;
                }
                let Some(fit) = ols2_hc3(&x1, &x2, &y, config.collinearity_limit) else {
                    continue;
                };
                out.push(PartialImpactResult {
                    scope: scope.clone(),
                    event_type: event_type.to_string(),
                    sector: sector.to_string(),
                    metric,
                    control: control_name.clone(),
                    n: fit.n,
                    alpha: fit.alpha,
                    beta: fit.beta,
                    se: fit.se,
                    t_stat: fit.t_stat,
                    p_value: fit.p_value,
                    p_adj_bh: None,
                    significant_bh: false,
                    beta_momentum: fit.gamma,
                    se_momentum: fit.se_gamma,
                    t_momentum: fit.t_gamma,
                    reason: fit.reason,
                });
            }
            debug!(scope = %scope, event_type, sector, tests = out.len(), "partial group fitted");
            out
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
        control = %control_name,
        "partial impact estimated"
    );
    results
}
