//! Reaction records and the canonical long-form reaction row.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::EventId;

/// A reaction measure around t0.
///
/// Variant order is the column order of every exported table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Metric {
    /// Single-day return on t0.
    T0,
    /// Symmetric window `t0-k → t0+k`.
    Window(u32),
    /// Pre-event window `t0-k → t0` (includes the t0 day).
    Pre(u32),
    /// Post-event window `t0 → t0+k` (excludes the t0 day).
    Post(u32),
}

impl Metric {
    pub fn column_name(&self) -> String {
        match self {
            Metric::T0 => "t0_return_avg".to_string(),
            Metric::Window(k) => format!("win{k}_cum_avg"),
            Metric::Pre(k) => format!("pre{k}_cum_avg"),
            Metric::Post(k) => format!("post{k}_cum_avg"),
        }
    }

    /// Signed trading-day offset for record-level output; `None` for the
    /// symmetric window, which has no single offset.
    pub fn window_offset(&self) -> Option<i32> {
        match *self {
            Metric::T0 => Some(0),
            Metric::Pre(k) => Some(-(k as i32)),
            Metric::Post(k) => Some(k as i32),
            Metric::Window(_) => None,
        }
    }

    /// Every metric produced for a set of half-window lengths.
    pub fn all_for(windows: &[u32]) -> Vec<Metric> {
        let mut out = vec![Metric::T0];
        for &k in windows {
            out.push(Metric::Window(k));
            out.push(Metric::Pre(k));
            out.push(Metric::Post(k));
        }
        out.sort();
        out.dedup();
        out
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.column_name())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "t0_return_avg" {
            return Ok(Metric::T0);
        }
        let body = s
            .strip_suffix("_cum_avg")
            .ok_or_else(|| format!("unknown metric '{s}'"))?;
        let parse = |digits: &str| {
            digits
                .parse::<u32>()
                .map_err(|_| format!("unknown metric '{s}'"))
        };
        if let Some(k) = body.strip_prefix("win") {
            Ok(Metric::Window(parse(k)?))
        } else if let Some(k) = body.strip_prefix("pre") {
            Ok(Metric::Pre(parse(k)?))
        } else if let Some(k) = body.strip_prefix("post") {
            Ok(Metric::Post(parse(k)?))
        } else {
            Err(format!("unknown metric '{s}'"))
        }
    }
}

impl From<Metric> for String {
    fn from(m: Metric) -> Self {
        m.column_name()
    }
}

impl TryFrom<String> for Metric {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// `(event_id, sector, window_offset) → cumulative return`.
///
/// At most one record exists per key; records are derived, never edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRecord {
    pub event_id: EventId,
    pub sector: String,
    pub window_offset: i32,
    pub cumulative_return: Option<f64>,
}

/// Sector momentum and cross-sectional rank for one cycle window.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CyclePoint {
    pub momentum: Option<f64>,
    pub rank: Option<u32>,
}

/// One `(event, sector)` row of the canonical reaction table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReactionRow {
    pub event_id: EventId,
    pub event_name: String,
    pub event_type: String,
    pub importance: String,
    pub event_date: NaiveDate,
    pub t0_date: NaiveDate,
    pub regime: String,
    pub sector: String,
    pub surprise: Option<f64>,
    pub surprise_z: Option<f64>,
    /// Equal-weighted sector reaction per metric (null when no constituent
    /// had enough history).
    pub values: BTreeMap<Metric, Option<f64>>,
    /// Momentum snapshot per cycle window, as of the trading day before t0.
    pub cycle: BTreeMap<u32, CyclePoint>,
}

impl ReactionRow {
    pub fn value(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied().flatten()
    }

    /// Offset-level records (`0`, `+k`, `-k`) carried by this row.
    pub fn records(&self) -> Vec<ReactionRecord> {
        self.values
            .iter()
            .filter_map(|(metric, value)| {
                metric.window_offset().map(|offset| ReactionRecord {
                    event_id: self.event_id.clone(),
                    sector: self.sector.clone(),
                    window_offset: offset,
                    cumulative_return: *value,
                })
            })
            .collect()
    }
}
