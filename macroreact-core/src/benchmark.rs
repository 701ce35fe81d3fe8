//! Benchmark adjustment — resolved once per run, before any return exists.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::warn;

use crate::domain::SectorMap;

/// Reference return subtracted from every constituent's daily return.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BenchmarkAdjustment {
    /// Raw returns.
    None,
    /// One market-wide benchmark for every ticker.
    Global { ticker: String },
    /// Per-sector benchmarks; unmapped sectors stay unadjusted.
    Sector { by_sector: BTreeMap<String, String> },
}

impl BenchmarkAdjustment {
    /// Choose the adjustment from the configured global benchmark and the
    /// sector mapping.
    ///
    /// When both are present only the sector adjustment is applied, so no
    /// return is ever adjusted twice. The second value is the warning text
    /// for the run's diagnostics.
    pub fn resolve(global: Option<&str>, sectors: &SectorMap) -> (Self, Option<String>) {
        let global = global.map(str::trim).filter(|t| !t.is_empty());
        match (global, sectors.has_sector_benchmarks()) {
            (Some(g), true) => {
                let msg = format!(
                    "both global benchmark '{g}' and sector benchmarks are configured; \
                     applying sector benchmarks only"
                );
                warn!("{msg}");
                (
                    BenchmarkAdjustment::Sector {
                        by_sector: sectors.sector_benchmarks().clone(),
                    },
                    Some(msg),
                )
            }
            (_, true) => (
                BenchmarkAdjustment::Sector {
                    by_sector: sectors.sector_benchmarks().clone(),
                },
                None,
            ),
            (Some(g), false) => (BenchmarkAdjustment::Global { ticker: g.to_string() }, None),
            (None, false) => (BenchmarkAdjustment::None, None),
        }
    }

    /// Benchmark ticker to subtract from `ticker` (member of `sector`), if any.
    ///
    /// A benchmark is never applied to itself.
    pub fn benchmark_for<'a>(&'a self, ticker: &str, sector: Option<&str>) -> Option<&'a str> {
        let bench = match self {
            BenchmarkAdjustment::None => None,
            BenchmarkAdjustment::Global { ticker } => Some(ticker.as_str()),
            BenchmarkAdjustment::Sector { by_sector } => {
                sector.and_then(|s| by_sector.get(s)).map(String::as_str)
            }
        }?;
        (bench != ticker).then_some(bench)
    }

    /// Every benchmark ticker this adjustment refers to.
    pub fn tickers(&self) -> Vec<&str> {
        match self {
            BenchmarkAdjustment::None => Vec::new(),
            BenchmarkAdjustment::Global { ticker } => vec![ticker.as_str()],
            BenchmarkAdjustment::Sector { by_sector } => {
                let mut v: Vec<&str> = by_sector.values().map(String::as_str).collect();
                v.sort_unstable();
                v.dedup();
                v
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BenchmarkAdjustment::None => "none",
            BenchmarkAdjustment::Global { .. } => "global",
            BenchmarkAdjustment::Sector { .. } => "sector",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(with_benchmarks: bool) -> SectorMap {
        let members = vec![
            ("AAPL".to_string(), "Tech".to_string()),
            ("XLK".to_string(), "Tech".to_string()),
            ("XOM".to_string(), "Energy".to_string()),
        ];
        let benches = if with_benchmarks {
            vec![("Tech".to_string(), "XLK".to_string())]
        } else {
            vec![]
        };
        SectorMap::new(members, benches).unwrap()
    }

    #[test]
    fn nothing_configured_is_none() {
        let (adj, warning) = BenchmarkAdjustment::resolve(None, &map(false));
        assert_eq!(adj, BenchmarkAdjustment::None);
        assert!(warning.is_none());
        assert_eq!(adj.benchmark_for("AAPL", Some("Tech")), None);
    }

    #[test]
    fn global_only() {
        let (adj, warning) = BenchmarkAdjustment::resolve(Some("SPY"), &map(false));
        assert_eq!(adj.label(), "global");
        assert!(warning.is_none());
        assert_eq!(adj.benchmark_for("XOM", Some("Energy")), Some("SPY"));
        assert_eq!(adj.benchmark_for("SPY", None), None);
    }

    #[test]
    fn both_configured_prefers_sector_and_warns() {
        let (adj, warning) = BenchmarkAdjustment::resolve(Some("SPY"), &map(true));
        assert_eq!(adj.label(), "sector");
        assert!(warning.unwrap().contains("sector benchmarks only"));
        assert_eq!(adj.benchmark_for("AAPL", Some("Tech")), Some("XLK"));
        // Unmapped sector stays raw; the global benchmark is not a fallback.
        assert_eq!(adj.benchmark_for("XOM", Some("Energy")), None);
    }

    #[test]
    fn benchmark_is_never_adjusted_against_itself() {
        let (adj, _) = BenchmarkAdjustment::resolve(None, &map(true));
        assert_eq!(adj.benchmark_for("XLK", Some("Tech")), None);
        assert_eq!(adj.tickers(), vec!["XLK"]);
    }
}
