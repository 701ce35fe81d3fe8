//! MacroReact CLI — run the reaction/impact pipeline per market.
//!
//! Commands:
//! - `run` — load `<data-dir>/<market>/`, run every engine stage, write
//!   the output tables under `<out-dir>/<market>/`
//! - `validate` — check the config and input tables without running
//!
//! Markets are independent and run in parallel. Set `RUST_LOG` to change
//! verbosity (default `info`).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use macroreact_core::domain::Market;
use macroreact_core::AnalysisConfig;
use macroreact_runner::{load_market, run_market_dir, write_market_outputs, MarketRun};

#[derive(Parser)]
#[command(
    name = "macroreact",
    about = "MacroReact CLI — sector reactions to macro event surprises"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the full pipeline and write every output table.
    Run {
        /// Market to run (us, kr). Repeatable; defaults to both.
        #[arg(long = "market")]
        markets: Vec<Market>,

        /// Directory holding one sub-directory per market.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Output directory; tables land in `<out-dir>/<market>/`.
        #[arg(long, default_value = "out")]
        out_dir: PathBuf,

        /// Path to a TOML analysis config. Defaults apply when omitted.
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Validate the config and input tables without running the engine.
    Validate {
        /// Market to check (us, kr). Repeatable; defaults to both.
        #[arg(long = "market")]
        markets: Vec<Market>,

        /// Directory holding one sub-directory per market.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Path to a TOML analysis config.
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            markets,
            data_dir,
            out_dir,
            config,
        } => run_cmd(&resolve_markets(markets), &data_dir, &out_dir, config.as_deref()),
        Commands::Validate {
            markets,
            data_dir,
            config,
        } => validate_cmd(&resolve_markets(markets), &data_dir, config.as_deref()),
    }
}

fn resolve_markets(mut markets: Vec<Market>) -> Vec<Market> {
    if markets.is_empty() {
        return vec![Market::Us, Market::Kr];
    }
    markets.sort();
    markets.dedup();
    markets
}

fn load_config(path: Option<&Path>) -> Result<AnalysisConfig> {
    match path {
        Some(p) => AnalysisConfig::load(p).with_context(|| format!("failed to load config {}", p.display())),
        None => Ok(AnalysisConfig::default()),
    }
}

fn run_cmd(markets: &[Market], data_dir: &Path, out_dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    info!(config_hash = %config.config_hash(), markets = markets.len(), "starting run");

    // Markets are independent; print in market order once all are done.
    let outcomes: Vec<(Market, Result<(MarketRun, Vec<PathBuf>)>)> = markets
        .par_iter()
        .map(|&market| {
            let outcome = run_market_dir(market, data_dir, &config)
                .with_context(|| format!("market {market} failed"))
                .and_then(|run| {
                    let paths = write_market_outputs(&run, out_dir)?;
                    Ok((run, paths))
                });
            (market, outcome)
        })
        .collect::<Vec<_>>();

    let mut failed = 0;
    for (market, outcome) in outcomes {
        match outcome {
            Ok((run, paths)) => {
                print_summary(&run);
                println!("  {} files written to {}", paths.len(), out_dir.join(market.as_str()).display());
            }
            Err(e) => {
                error!(%market, "{e:#}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} markets failed", markets.len());
    }
    Ok(())
}

fn print_summary(run: &MarketRun) {
    let significant = run.impact.iter().filter(|r| r.significant_bh).count();
    println!("── {} ──", run.market);
    println!("  dataset        {}", run.dataset_hash);
    println!("  benchmark      {}", run.adjustment.label());
    println!("  events         {}", run.events.len());
    println!("  reaction rows  {}", run.table.len());
    println!("  impact tests   {} ({significant} significant)", run.impact.len());
    println!("  partial tests  {}", run.partial.len());
    for w in &run.data_quality_warnings {
        println!("  warning: {w}");
    }
}

fn validate_cmd(markets: &[Market], data_dir: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("config ok ({})", config.config_hash());

    let mut failed = 0;
    for &market in markets {
        let dir = data_dir.join(market.as_str());
        match load_market(&dir) {
            Ok(data) => println!(
                "{market}: {} events, {} price series, {} mapped tickers, {} regime ranges, {} blank prices skipped",
                data.events.len(),
                data.prices.len(),
                data.sector_map.tickers().count(),
                data.regimes.ranges().len(),
                data.skipped_price_rows,
            ),
            Err(e) => {
                error!(%market, dir = %dir.display(), "{e}");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} markets have invalid inputs", markets.len());
    }
    Ok(())
}
