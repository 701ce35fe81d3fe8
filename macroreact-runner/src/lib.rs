//! MacroReact Runner — loading, per-market orchestration, export.
//!
//! This crate builds on `macroreact-core` to provide:
//! - CSV table loading with column and ordering validation
//! - Dataset fingerprinting (blake3 over sorted inputs)
//! - The per-market pipeline producing every output table
//! - CSV/JSON export under `<out_dir>/<market>/`
//! - The compact `summary.json` digest

pub mod data_loader;
pub mod export;
pub mod pipeline;
pub mod summary;

pub use data_loader::{compute_dataset_hash, load_market, LoadError, MarketData};
pub use export::{import_summary, load_summary, write_market_outputs, ExportError};
pub use pipeline::{run_market, run_market_dir, MarketRun, PipelineError};
pub use summary::{build_summary, Summary, SCHEMA_VERSION};
