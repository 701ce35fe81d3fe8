//! Per-market pipeline — loaded tables in, every output table out.
//!
//! One call runs the engine stages in dependency order:
//! windows + surprise scores → reaction table → impact / partial /
//! quantile / focus, plus the sector cycle tables. Markets never share
//! state; the CLI runs them side by side.

use std::path::Path;

use thiserror::Error;
use tracing::{info, warn};

use macroreact_core::domain::{Event, ImpactResult, Market, PartialImpactResult, RegimeCalendar};
use macroreact_core::{
    assemble, estimate_impact, estimate_partial, focus_rankings, normalize_surprises, surprise_quantiles,
    AnalysisConfig, AssemblyInputs, BenchmarkAdjustment, ConfigError, CycleRow, FocusRow, QuantileRow,
    ReactionTable, RegimeAverage, ReturnPanel, SectorCycle, SurpriseScore,
};

use crate::data_loader::{load_market, LoadError, MarketData};

/// Errors from pipeline orchestration.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Load(#[from] LoadError),
    #[error("market '{0}' has no usable prices")]
    NoPrices(Market),
}

/// Everything one market run produces.
#[derive(Debug, Clone)]
pub struct MarketRun {
    pub market: Market,
    pub dataset_hash: String,
    pub config_hash: String,
    pub adjustment: BenchmarkAdjustment,
    pub events: Vec<Event>,
    /// Aligned with `events`.
    pub scores: Vec<SurpriseScore>,
    pub regimes: RegimeCalendar,
    pub table: ReactionTable,
    pub impact: Vec<ImpactResult>,
    pub partial: Vec<PartialImpactResult>,
    pub quantiles: Vec<QuantileRow>,
    pub focus: Vec<FocusRow>,
    pub cycle_windows: Vec<u32>,
    pub cycle_rows: Vec<CycleRow>,
    pub regime_averages: Vec<RegimeAverage>,
    /// Input problems that did not stop the run.
    pub data_quality_warnings: Vec<String>,
}

/// Load `<data_dir>/<market>/` and run the pipeline on it.
pub fn run_market_dir(market: Market, data_dir: &Path, config: &AnalysisConfig) -> Result<MarketRun, PipelineError> {
    config.validate()?;
    let data = load_market(&data_dir.join(market.as_str()))?;
    run_market(market, &data, config)
}

/// Run every engine stage over one market's validated tables.
pub fn run_market(market: Market, data: &MarketData, config: &AnalysisConfig) -> Result<MarketRun, PipelineError> {
    config.validate()?;
    if data.prices.iter().all(|s| s.is_empty()) {
        return Err(PipelineError::NoPrices(market));
    }

    let mut warnings = Vec::new();
    if data.skipped_price_rows > 0 {
        warnings.push(format!("{} price rows with blank adj_close were dropped", data.skipped_price_rows));
    }

    let (adjustment, conflict) = BenchmarkAdjustment::resolve(config.global_benchmark.as_deref(), &data.sector_map);
    warnings.extend(conflict);

    let scores = normalize_surprises(&data.events, &config.surprise);
    let panel = ReturnPanel::build(&data.prices);
    for bench in adjustment.tickers() {
        if !panel.contains(bench) {
            warnings.push(format!("benchmark '{bench}' has no prices; adjusted windows are null"));
        }
    }

    let cycle_windows = config.sorted_cycle_windows();
    let cycle = SectorCycle::build(&panel, &data.sector_map, &cycle_windows);
    info!(%market, days = panel.calendar().len(), "return panel and sector cycle built");

    let table = assemble(
        AssemblyInputs {
            events: &data.events,
            scores: &scores,
            panel: &panel,
            sector_map: &data.sector_map,
            adjustment: &adjustment,
            regimes: &data.regimes,
            cycle: &cycle,
        },
        config,
    );
    let diag = &table.diagnostics;
    if !diag.events_without_t0.is_empty() {
        warnings.push(format!(
            "{} events have no trading day to align to and were left out",
            diag.events_without_t0.len()
        ));
    }
    if !diag.unpriced_tickers.is_empty() {
        warnings.push(format!(
            "{} mapped tickers have no prices: {}",
            diag.unpriced_tickers.len(),
            diag.unpriced_tickers.join(", ")
        ));
    }

    let impact = estimate_impact(&table, config);
    let partial = estimate_partial(&table, config);
    let quantiles = surprise_quantiles(&table, config);
    let focus = focus_rankings(&table, &config.focus);
    let cycle_rows = cycle.rows();
    let regime_averages = cycle.regime_averages(&data.regimes);

    for w in &warnings {
        warn!(%market, "{w}");
    }
    info!(
        %market,
        rows = table.len(),
        impact_tests = impact.len(),
        partial_tests = partial.len(),
        "market run complete"
    );

    Ok(MarketRun {
        market,
        dataset_hash: data.dataset_hash.clone(),
        config_hash: config.config_hash(),
        adjustment,
        events: data.events.clone(),
        scores,
        regimes: data.regimes.clone(),
        table,
        impact,
        partial,
        quantiles,
        focus,
        cycle_windows,
        cycle_rows,
        regime_averages,
        data_quality_warnings: warnings,
    })
}
