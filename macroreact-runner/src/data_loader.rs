//! Table loading for one market directory.
//!
//! Reads the five input tables, checks their exact column names once, and
//! hands the engine typed, validated values:
//! - `macro_events.csv` (required)
//! - `prices.csv` (required)
//! - `tickers.csv` (required)
//! - `sector_benchmarks.csv` (optional)
//! - `macro_regimes.csv` (optional)
//!
//! Column order does not matter and extra columns are ignored. A missing
//! required column is an error, never a silently empty field.

use chrono::NaiveDate;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use macroreact_core::domain::event::validate_events;
use macroreact_core::domain::{
    Event, EventId, PricePoint, PriceSeries, RegimeCalendar, RegimeRange, SectorMap, ValidationError,
};

pub const EVENTS_FILE: &str = "macro_events.csv";
pub const PRICES_FILE: &str = "prices.csv";
pub const TICKERS_FILE: &str = "tickers.csv";
pub const BENCHMARKS_FILE: &str = "sector_benchmarks.csv";
pub const REGIMES_FILE: &str = "macro_regimes.csv";

const EVENT_COLUMNS: &[&str] = &[
    "event_id",
    "event_name",
    "event_type",
    "event_date",
    "importance",
    "expected_value",
    "actual_value",
];
const PRICE_COLUMNS: &[&str] = &["date", "ticker", "adj_close"];
const TICKER_COLUMNS: &[&str] = &["ticker", "sector"];
const BENCHMARK_COLUMNS: &[&str] = &["sector", "benchmark_ticker"];
const REGIME_COLUMNS: &[&str] = &["start_date", "end_date", "regime_name"];

/// Errors from the table loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("required table not found: {}", .0.display())]
    MissingTable(PathBuf),

    #[error("{}: missing column(s) {missing:?}", file.display())]
    MissingColumns { file: PathBuf, missing: Vec<String> },

    #[error("{}: {source}", file.display())]
    Csv {
        file: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("{}: {source}", file.display())]
    Invalid {
        file: PathBuf,
        #[source]
        source: ValidationError,
    },
}

// ─── Raw records ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct EventRecord {
    event_id: String,
    event_name: String,
    event_type: String,
    event_date: NaiveDate,
    importance: String,
    expected_value: Option<f64>,
    actual_value: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct PriceRecord {
    date: NaiveDate,
    ticker: String,
    adj_close: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct TickerRecord {
    ticker: String,
    sector: String,
}

#[derive(Debug, Deserialize)]
struct BenchmarkRecord {
    sector: String,
    benchmark_ticker: String,
}

#[derive(Debug, Deserialize)]
struct RegimeRecord {
    start_date: NaiveDate,
    end_date: NaiveDate,
    regime_name: String,
}

// ─── Loaded market ───────────────────────────────────────────────────

/// Every input of one market, validated.
#[derive(Debug, Clone)]
pub struct MarketData {
    pub events: Vec<Event>,
    pub prices: Vec<PriceSeries>,
    pub sector_map: SectorMap,
    pub regimes: RegimeCalendar,
    /// BLAKE3 over all loaded values in canonical order.
    pub dataset_hash: String,
    /// Price rows dropped for a blank `adj_close`.
    pub skipped_price_rows: usize,
}

/// Load and validate the tables of one market directory.
pub fn load_market(dir: &Path) -> Result<MarketData, LoadError> {
    let event_rows: Vec<EventRecord> = read_table(&dir.join(EVENTS_FILE), EVENT_COLUMNS)?;
    let price_rows: Vec<PriceRecord> = read_table(&dir.join(PRICES_FILE), PRICE_COLUMNS)?;
    let ticker_rows: Vec<TickerRecord> = read_table(&dir.join(TICKERS_FILE), TICKER_COLUMNS)?;
    let bench_rows: Vec<BenchmarkRecord> = read_optional(&dir.join(BENCHMARKS_FILE), BENCHMARK_COLUMNS)?;
    let regime_rows: Vec<RegimeRecord> = read_optional(&dir.join(REGIMES_FILE), REGIME_COLUMNS)?;

    let invalid = |file: &str| {
        let file = dir.join(file);
        move |source| LoadError::Invalid { file, source }
    };

    let events: Vec<Event> = event_rows
        .into_iter()
        .map(|r| Event {
            event_id: EventId::new(r.event_id.trim()),
            event_name: r.event_name,
            event_type: r.event_type.trim().to_string(),
            event_date: r.event_date,
            importance: r.importance,
            expected_value: r.expected_value.filter(|v| v.is_finite()),
            actual_value: r.actual_value.filter(|v| v.is_finite()),
        })
        .collect();
    validate_events(&events).map_err(invalid(EVENTS_FILE))?;

    let total_price_rows = price_rows.len();
    let points: Vec<PricePoint> = price_rows
        .into_iter()
        .filter_map(|r| {
            Some(PricePoint {
                date: r.date,
                ticker: r.ticker.trim().to_string(),
                adj_close: r.adj_close?,
            })
        })
        .collect();
    let skipped_price_rows = total_price_rows - points.len();
    if skipped_price_rows > 0 {
        warn!(rows = skipped_price_rows, "dropped price rows with blank adj_close");
    }
    let prices = PriceSeries::from_points(&points).map_err(invalid(PRICES_FILE))?;

    let sector_map = SectorMap::new(
        ticker_rows.into_iter().map(|r| (r.ticker, r.sector)),
        bench_rows.into_iter().map(|r| (r.sector, r.benchmark_ticker)),
    )
    .map_err(invalid(TICKERS_FILE))?;

    let regimes = RegimeCalendar::new(
        regime_rows
            .into_iter()
            .map(|r| RegimeRange {
                start_date: r.start_date,
                end_date: r.end_date,
                regime_name: r.regime_name.trim().to_string(),
            })
            .collect(),
    )
    .map_err(invalid(REGIMES_FILE))?;

    let dataset_hash = compute_dataset_hash(&events, &prices, &sector_map, &regimes);

    info!(
        dir = %dir.display(),
        events = events.len(),
        tickers = prices.len(),
        sectors = sector_map.sectors().len(),
        regimes = regimes.ranges().len(),
        "market tables loaded"
    );

    Ok(MarketData {
        events,
        prices,
        sector_map,
        regimes,
        dataset_hash,
        skipped_price_rows,
    })
}

fn read_optional<T: for<'de> Deserialize<'de>>(path: &Path, columns: &[&str]) -> Result<Vec<T>, LoadError> {
    if !path.exists() {
        debug!(file = %path.display(), "optional table absent");
        return Ok(Vec::new());
    }
    read_table(path, columns)
}

fn read_table<T: for<'de> Deserialize<'de>>(path: &Path, columns: &[&str]) -> Result<Vec<T>, LoadError> {
    if !path.exists() {
        return Err(LoadError::MissingTable(path.to_path_buf()));
    }
    let csv_err = |source| LoadError::Csv {
        file: path.to_path_buf(),
        source,
    };
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_err)?;

    let headers = rdr.headers().map_err(csv_err)?.clone();
    check_columns(path, &headers, columns)?;

    rdr.deserialize().collect::<Result<Vec<T>, _>>().map_err(csv_err)
}

/// Every `required` column must be present under its exact name.
fn check_columns(path: &Path, headers: &csv::StringRecord, required: &[&str]) -> Result<(), LoadError> {
    let present: Vec<&str> = headers.iter().map(|h| h.trim_start_matches('\u{feff}')).collect();
    let missing: Vec<String> = required
        .iter()
        .filter(|c| !present.contains(c))
        .map(|c| c.to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LoadError::MissingColumns {
            file: path.to_path_buf(),
            missing,
        })
    }
}

/// Compute a deterministic BLAKE3 hash over all loaded tables.
///
/// Events are hashed in id order and prices in ticker order, so the hash
/// does not depend on input row order across tickers.
pub fn compute_dataset_hash(
    events: &[Event],
    prices: &[PriceSeries],
    sector_map: &SectorMap,
    regimes: &RegimeCalendar,
) -> String {
    let mut hasher = blake3::Hasher::new();

    let mut sorted: Vec<&Event> = events.iter().collect();
    sorted.sort_by(|a, b| a.event_id.cmp(&b.event_id));
    hasher.update(b"events");
    for ev in sorted {
        hasher.update(ev.event_id.as_str().as_bytes());
        hasher.update(ev.event_name.as_bytes());
        hasher.update(ev.event_type.as_bytes());
        hasher.update(ev.event_date.to_string().as_bytes());
        hasher.update(ev.importance.as_bytes());
        for v in [ev.expected_value, ev.actual_value] {
            match v {
                Some(x) => hasher.update(&x.to_le_bytes()),
                None => hasher.update(b"null"),
            };
        }
    }

    let mut series: Vec<&PriceSeries> = prices.iter().collect();
    series.sort_by(|a, b| a.ticker().cmp(b.ticker()));
    hasher.update(b"prices");
    for s in series {
        hasher.update(s.ticker().as_bytes());
        for (date, px) in s.points() {
            hasher.update(date.to_string().as_bytes());
            hasher.update(&px.to_le_bytes());
        }
    }

    hasher.update(b"tickers");
    for (ticker, sector) in sector_map.tickers() {
        hasher.update(ticker.as_bytes());
        hasher.update(sector.as_bytes());
    }
    for (sector, bench) in sector_map.sector_benchmarks() {
        hasher.update(sector.as_bytes());
        hasher.update(bench.as_bytes());
    }

    hasher.update(b"regimes");
    for r in regimes.ranges() {
        hasher.update(r.start_date.to_string().as_bytes());
        hasher.update(r.end_date.to_string().as_bytes());
        hasher.update(r.regime_name.as_bytes());
    }

    hasher.finalize().to_hex().to_string()
}
