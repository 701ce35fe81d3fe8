//! Export — CSV tables and the JSON summary of one market run.
//!
//! Every table is rendered to a `String` first, then written under
//! `<out_dir>/<market>/`. Nulls are empty cells; floats use Rust's shortest
//! round-trip formatting, so reruns produce byte-identical files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;
use tracing::info;

use macroreact_core::domain::{ImpactResult, PartialImpactResult};
use macroreact_core::{CycleRow, FocusRow, QuantileRow, ReactionTable, RegimeAverage};

use crate::pipeline::MarketRun;
use crate::summary::{build_summary, Summary, SCHEMA_VERSION};

pub const REACTION_LONG_FILE: &str = "reaction_long.csv";
pub const REACTION_RECORDS_FILE: &str = "reaction_records.csv";
pub const IMPACT_FILE: &str = "macro_impact.csv";
pub const PARTIAL_FILE: &str = "partial_impact.csv";
pub const QUANTILE_FILE: &str = "reaction_by_surprise_quantile.csv";
pub const FOCUS_FILE: &str = "focus_top_bottom.csv";
pub const CYCLE_RANK_FILE: &str = "sector_cycle_rank.csv";
pub const REGIME_AVG_FILE: &str = "sector_cycle_regime_avg.csv";
pub const SUMMARY_FILE: &str = "summary.json";

/// Errors rendering a table.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("output is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported schema version {found} (max supported: {supported})")]
    SchemaVersion { found: u32, supported: u32 },
}

fn opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn opt_display<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

fn finish(wtr: csv::Writer<Vec<u8>>) -> Result<String, ExportError> {
    let data = wtr.into_inner().map_err(|e| e.into_error())?;
    Ok(String::from_utf8(data)?)
}

// ─── CSV tables ─────────────────────────────────────────────────────

/// Wide reaction table: one row per `(event, sector)`.
///
/// Columns: event metadata, one column per metric, surprise, surprise_z,
/// then `mom_{w}` and `rank_{w}` per cycle window.
pub fn reaction_long_csv(table: &ReactionTable) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    let mut header: Vec<String> = [
        "event_id",
        "event_name",
        "event_type",
        "importance",
        "event_date",
        "t0_date",
        "regime",
        "sector",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    header.extend(table.metrics.iter().map(|m| m.column_name()));
    header.push("surprise".into());
    header.push("surprise_z".into());
    header.extend(table.cycle_windows.iter().map(|w| format!("mom_{w}")));
    header.extend(table.cycle_windows.iter().map(|w| format!("rank_{w}")));
    wtr.write_record(&header)?;

    for r in table.rows() {
        let mut rec: Vec<String> = vec![
            r.event_id.to_string(),
            r.event_name.clone(),
            r.event_type.clone(),
            r.importance.clone(),
            r.event_date.to_string(),
            r.t0_date.to_string(),
            r.regime.clone(),
            r.sector.clone(),
        ];
        rec.extend(table.metrics.iter().map(|&m| opt(r.value(m))));
        rec.push(opt(r.surprise));
        rec.push(opt(r.surprise_z));
        let points: Vec<_> = table
            .cycle_windows
            .iter()
            .map(|w| r.cycle.get(w).copied().unwrap_or_default())
            .collect();
        rec.extend(points.iter().map(|p| opt(p.momentum)));
        rec.extend(points.iter().map(|p| opt_display(p.rank)));
        wtr.write_record(&rec)?;
    }
    finish(wtr)
}

/// Long offset-level records: `event_id, sector, window_offset, cumulative_return`.
pub fn reaction_records_csv(table: &ReactionTable) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["event_id", "sector", "window_offset", "cumulative_return"])?;
    for rec in table.records() {
        wtr.write_record([
            &rec.event_id.to_string(),
            &rec.sector,
            &rec.window_offset.to_string(),
            &opt(rec.cumulative_return),
        ])?;
    }
    finish(wtr)
}

pub fn impact_csv(results: &[ImpactResult]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "event_type",
        "sector",
        "metric",
        "n",
        "alpha",
        "beta",
        "se",
        "se_classical",
        "t_stat",
        "p_value",
        "p_adj_bh",
        "significant_bh",
        "reason",
        "beta_pos",
        "t_pos",
        "n_pos",
        "beta_neg",
        "t_neg",
        "n_neg",
    ])?;
    for r in results {
        wtr.write_record([
            &r.event_type,
            &r.sector,
            &r.metric.column_name(),
            &r.n.to_string(),
            &opt(r.alpha),
            &opt(r.beta),
            &opt(r.se),
            &opt(r.se_classical),
            &opt(r.t_stat),
            &opt(r.p_value),
            &opt(r.p_adj_bh),
            &r.significant_bh.to_string(),
            &opt_display(r.reason),
            &opt(r.beta_pos),
            &opt(r.t_pos),
            &r.n_pos.to_string(),
            &opt(r.beta_neg),
            &opt(r.t_neg),
            &r.n_neg.to_string(),
        ])?;
    }
    finish(wtr)
}

pub fn partial_csv(results: &[PartialImpactResult]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "scope",
        "event_type",
        "sector",
        "metric",
        "control",
        "n",
        "beta",
        "se",
        "t_stat",
        "p_value",
        "p_adj_bh",
        "significant_bh",
        "beta_momentum",
        "se_momentum",
        "t_momentum",
        "reason",
    ])?;
    for r in results {
        wtr.write_record([
            &r.scope.to_string(),
            &r.event_type,
            &r.sector,
            &r.metric.column_name(),
            &r.control,
            &r.n.to_string(),
            &opt(r.beta),
            &opt(r.se),
            &opt(r.t_stat),
            &opt(r.p_value),
            &opt(r.p_adj_bh),
            &r.significant_bh.to_string(),
            &opt(r.beta_momentum),
            &opt(r.se_momentum),
            &opt(r.t_momentum),
            &opt_display(r.reason),
        ])?;
    }
    finish(wtr)
}

pub fn quantile_csv(rows: &[QuantileRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["event_type", "sector", "metric", "quantile", "lower", "upper", "n", "mean_reaction"])?;
    for r in rows {
        wtr.write_record([
            &r.event_type,
            &r.sector,
            &r.metric.column_name(),
            &r.quantile.to_string(),
            &r.lower.to_string(),
            &r.upper.to_string(),
            &r.n.to_string(),
            &r.mean_reaction.to_string(),
        ])?;
    }
    finish(wtr)
}

pub fn focus_csv(rows: &[FocusRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record([
        "view",
        "event_type",
        "metric",
        "rank_type",
        "rank",
        "event_id",
        "event_date",
        "sector",
        "value",
        "n",
    ])?;
    for r in rows {
        wtr.write_record([
            &r.view.to_string(),
            &r.event_type,
            &r.metric.column_name(),
            &r.rank_type.to_string(),
            &r.rank.to_string(),
            &opt_display(r.event_id.as_ref()),
            &opt_display(r.event_date),
            &r.sector,
            &r.value.to_string(),
            &r.n.to_string(),
        ])?;
    }
    finish(wtr)
}

/// Per-date sector momentum and rank: `date, sector, mom_{w}…, rank_{w}…`.
pub fn cycle_rank_csv(windows: &[u32], rows: &[CycleRow]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    let mut header = vec!["date".to_string(), "sector".to_string()];
    header.extend(windows.iter().map(|w| format!("mom_{w}")));
    header.extend(windows.iter().map(|w| format!("rank_{w}")));
    wtr.write_record(&header)?;
    for r in rows {
        let mut rec = vec![r.date.to_string(), r.sector.clone()];
        rec.extend(r.points.iter().map(|p| opt(p.momentum)));
        rec.extend(r.points.iter().map(|p| opt_display(p.rank)));
        wtr.write_record(&rec)?;
    }
    finish(wtr)
}

pub fn regime_avg_csv(rows: &[RegimeAverage]) -> Result<String, ExportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["regime", "start_date", "end_date", "sector", "n", "avg_daily_return"])?;
    for r in rows {
        wtr.write_record([
            &r.regime,
            &r.start_date.to_string(),
            &r.end_date.to_string(),
            &r.sector,
            &r.n.to_string(),
            &opt(r.avg_daily_return),
        ])?;
    }
    finish(wtr)
}

// ─── JSON summary ───────────────────────────────────────────────────

pub fn summary_json(summary: &Summary) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(summary)?)
}

/// Parse a summary, rejecting schema versions newer than this build.
pub fn import_summary(json: &str) -> Result<Summary, ExportError> {
    let summary: Summary = serde_json::from_str(json)?;
    if summary.schema_version > SCHEMA_VERSION {
        return Err(ExportError::SchemaVersion {
            found: summary.schema_version,
            supported: SCHEMA_VERSION,
        });
    }
    Ok(summary)
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Write every output table of `run` under `<out_dir>/<market>/`.
///
/// Returns the written paths in a fixed order.
pub fn write_market_outputs(run: &MarketRun, out_dir: &Path) -> Result<Vec<PathBuf>> {
    let dir = out_dir.join(run.market.as_str());
    std::fs::create_dir_all(&dir).with_context(|| format!("failed to create output dir: {}", dir.display()))?;

    let tables: Vec<(&str, String)> = vec![
        (REACTION_LONG_FILE, reaction_long_csv(&run.table)?),
        (REACTION_RECORDS_FILE, reaction_records_csv(&run.table)?),
        (IMPACT_FILE, impact_csv(&run.impact)?),
        (PARTIAL_FILE, partial_csv(&run.partial)?),
        (QUANTILE_FILE, quantile_csv(&run.quantiles)?),
        (FOCUS_FILE, focus_csv(&run.focus)?),
        (CYCLE_RANK_FILE, cycle_rank_csv(&run.cycle_windows, &run.cycle_rows)?),
        (REGIME_AVG_FILE, regime_avg_csv(&run.regime_averages)?),
        (SUMMARY_FILE, summary_json(&build_summary(run))?),
    ];

    let mut written = Vec::with_capacity(tables.len());
    for (name, body) in tables {
        let path = dir.join(name);
        std::fs::write(&path, body).with_context(|| format!("failed to write {}", path.display()))?;
        written.push(path);
    }
    info!(market = %run.market, dir = %dir.display(), files = written.len(), "outputs written");
    Ok(written)
}

/// Load `summary.json` from a market output directory.
pub fn load_summary(dir: &Path) -> Result<Summary> {
    let path = dir.join(SUMMARY_FILE);
    let json = std::fs::read_to_string(&path).with_context(|| format!("failed to read {}", path.display()))?;
    import_summary(&json).with_context(|| format!("failed to parse {}", path.display()))
}
