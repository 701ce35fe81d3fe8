//! Running cumulative product of `(1 + daily return)` on the market calendar.
//!
//! Built once per ticker; every window return is then a ratio of two levels.
//! Days inside the ticker's listed span on which it has no price carry the
//! level forward, so the next observed return spans the gap. Days outside
//! that span have no level at all and any window touching them is null.

use crate::domain::PriceSeries;

use super::TradingCalendar;

#[derive(Debug, Clone, PartialEq)]
pub struct CumulativeSeries {
    /// `Π (1 + r)` up to and including each calendar day.
    levels: Vec<Option<f64>>,
    /// Whether the ticker has its own observation on the day.
    traded: Vec<bool>,
    /// Running count of days whose return could not be defined; a window is
    /// null if it spans any of them.
    breaks: Vec<u32>,
}

impl CumulativeSeries {
    /// Raw (unadjusted) cumulative series of `series` on `calendar`.
    pub fn from_prices(series: &PriceSeries, calendar: &TradingCalendar) -> Self {
        let n = calendar.len();
        let mut levels = vec![None; n];
        let mut traded = vec![false; n];

        let dates = calendar.dates();
        let points = series.points();
        let mut cursor = 0;
        let mut level: Option<f64> = None;
        let mut last_price: Option<f64> = None;

        for (i, date) in dates.iter().enumerate() {
            if cursor >= points.len() {
                break;
            }
            if points[cursor].0 == *date {
                let price = points[cursor].1;
                level = Some(match (level, last_price) {
                    (Some(l), Some(prev)) => l * (1.0 + (price / prev - 1.0)),
                    _ => 1.0,
                });
                last_price = Some(price);
                traded[i] = true;
                cursor += 1;
            }
            levels[i] = level;
        }

        Self {
            levels,
            traded,
            breaks: vec![0; n],
        }
    }

    /// A series with no defined level anywhere.
    pub fn undefined(len: usize) -> Self {
        Self {
            levels: vec![None; len],
            traded: vec![false; len],
            breaks: vec![0; len],
        }
    }

    /// Benchmark-adjusted series: each observed return `r` becomes `r - b`,
    /// with `b` the benchmark return over the same span.
    ///
    /// A day on which the ticker trades but the benchmark has no return is a
    /// break: its adjusted return is undefined and windows across it are null.
    pub fn adjusted(&self, benchmark: &CumulativeSeries) -> Self {
        let n = self.levels.len();
        let mut levels = vec![None; n];
        let mut breaks = vec![0u32; n];
        let mut level: Option<f64> = None;
        let mut last_trade: Option<usize> = None;
        let mut broken = 0u32;

        for i in 0..n {
            if self.traded[i] {
                level = match (level, last_trade) {
                    (Some(l), Some(p)) => {
                        let own = ratio(self.levels[p], self.levels[i]);
                        let bench = if benchmark.traded.get(i).copied().unwrap_or(false) {
                            benchmark.levels.get(p).copied().flatten().and_then(|lp| {
                                benchmark.levels[i].map(|li| li / lp - 1.0)
                            })
                        } else {
                            None
                        };
                        match (own, bench) {
                            (Some(r), Some(b)) => Some(l * (1.0 + r - b)),
                            _ => {
                                broken += 1;
                                Some(l)
                            }
                        }
                    }
                    _ => Some(1.0),
                };
                last_trade = Some(i);
            }
            // Keep the raw span: no level before listing or after delisting.
            levels[i] = if self.levels[i].is_some() { level } else { None };
            breaks[i] = broken;
        }

        Self {
            levels,
            traded: self.traded.clone(),
            breaks,
        }
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn level(&self, idx: usize) -> Option<f64> {
        self.levels.get(idx).copied().flatten()
    }

    pub fn traded(&self, idx: usize) -> bool {
        self.traded.get(idx).copied().unwrap_or(false)
    }

    /// Return from the close of day `a` to the close of day `b` (`a ≤ b`).
    pub fn window(&self, a: usize, b: usize) -> Option<f64> {
        if a > b || b >= self.levels.len() {
            return None;
        }
        if self.breaks[a] != self.breaks[b] {
            return None;
        }
        ratio(self.levels[a], self.levels[b])
    }

    /// Single-day return ending on day `idx` (0 on a carried-forward day).
    pub fn daily_return(&self, idx: usize) -> Option<f64> {
        idx.checked_sub(1).and_then(|prev| self.window(prev, idx))
    }
}

fn ratio(from: Option<f64>, to: Option<f64>) -> Option<f64> {
    match (from, to) {
        (Some(a), Some(b)) if a > 0.0 => Some(b / a - 1.0),
        _ => None,
    }
}
