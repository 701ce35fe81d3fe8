//! Return Window Builder — per-ticker window returns for every event.
//!
//! Tickers are independent, so both the cumulative series and the window
//! lookups are computed in parallel and collected into BTreeMaps keyed by
//! ticker for deterministic downstream iteration.

use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::BTreeMap;
use tracing::debug;

use crate::benchmark::BenchmarkAdjustment;
use crate::domain::{Metric, PriceSeries};

use super::{metric_values, CumulativeSeries, TradingCalendar};

/// Raw cumulative series of every priced ticker on one market calendar.
#[derive(Debug, Clone, Default)]
pub struct ReturnPanel {
    calendar: TradingCalendar,
    raw: BTreeMap<String, CumulativeSeries>,
}

impl ReturnPanel {
    pub fn build(series: &[PriceSeries]) -> Self {
        let calendar = TradingCalendar::from_series(series);
        let raw: BTreeMap<String, CumulativeSeries> = series
            .par_iter()
            .map(|s| (s.ticker().to_string(), CumulativeSeries::from_prices(s, &calendar)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect();
        debug!(tickers = raw.len(), days = calendar.len(), "built return panel");
        Self { calendar, raw }
    }

    pub fn calendar(&self) -> &TradingCalendar {
        &self.calendar
    }

    pub fn raw(&self, ticker: &str) -> Option<&CumulativeSeries> {
        self.raw.get(ticker)
    }

    pub fn contains(&self, ticker: &str) -> bool {
        self.raw.contains_key(ticker)
    }

    /// Series of `ticker` after applying `adjustment`; `None` if unpriced.
    ///
    /// A benchmark without prices leaves every adjusted return undefined.
    pub fn series_for(
        &self,
        ticker: &str,
        sector: Option<&str>,
        adjustment: &BenchmarkAdjustment,
    ) -> Option<Cow<'_, CumulativeSeries>> {
        let raw = self.raw.get(ticker)?;
        match adjustment.benchmark_for(ticker, sector) {
            None => Some(Cow::Borrowed(raw)),
            Some(bench) => Some(Cow::Owned(match self.raw.get(bench) {
                Some(b) => raw.adjusted(b),
                None => raw.adjusted(&CumulativeSeries::undefined(self.calendar.len())),
            })),
        }
    }
}

/// Window values of one ticker, indexed `[event][metric]`.
pub type TickerWindows = Vec<Vec<Option<f64>>>;

/// Compute every metric for every aligned event, per member ticker.
///
/// `members` are `(ticker, sector)` pairs; `t0s` holds the calendar index of
/// each event's t0. Unpriced tickers yield all-null rows.
pub fn build_windows(
    panel: &ReturnPanel,
    members: &[(String, String)],
    adjustment: &BenchmarkAdjustment,
    t0s: &[usize],
    metrics: &[Metric],
) -> BTreeMap<String, TickerWindows> {
    members
        .par_iter()
        .map(|(ticker, sector)| {
            let windows = match panel.series_for(ticker, Some(sector), adjustment) {
                Some(cum) => t0s.iter().map(|&t0| metric_values(&cum, t0, metrics)).collect(),
                None => vec![vec![None; metrics.len()]; t0s.len()],
            };
            (ticker.clone(), windows)
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect()
}
