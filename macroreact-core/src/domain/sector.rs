//! Static ticker → sector membership and sector → benchmark mapping.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ValidationError;

/// Sector membership of every analyzed ticker plus optional per-sector
/// benchmark tickers. BTreeMaps keep every iteration deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SectorMap {
    ticker_to_sector: BTreeMap<String, String>,
    sector_benchmarks: BTreeMap<String, String>,
}

impl SectorMap {
    /// Build from `(ticker, sector)` and `(sector, benchmark_ticker)` pairs.
    ///
    /// Blank sectors map to `UNKNOWN`. A ticker listed twice with different
    /// sectors, or a sector with two different benchmarks, is rejected.
    pub fn new(
        memberships: impl IntoIterator<Item = (String, String)>,
        benchmarks: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, ValidationError> {
        let mut ticker_to_sector: BTreeMap<String, String> = BTreeMap::new();
        for (ticker, sector) in memberships {
            let ticker = ticker.trim().to_string();
            if ticker.is_empty() {
                continue;
            }
            let sector = match sector.trim() {
                "" => "UNKNOWN".to_string(),
                s => s.to_string(),
            };
            if let Some(first) = ticker_to_sector.get(&ticker) {
                if *first != sector {
                    return Err(ValidationError::ConflictingSector {
                        ticker,
                        first: first.clone(),
                        second: sector,
                    });
                }
                continue;
            }
            ticker_to_sector.insert(ticker, sector);
        }

        let mut sector_benchmarks: BTreeMap<String, String> = BTreeMap::new();
        for (sector, bench) in benchmarks {
            let (sector, bench) = (sector.trim().to_string(), bench.trim().to_string());
            if sector.is_empty() || bench.is_empty() {
                continue;
            }
            if let Some(first) = sector_benchmarks.get(&sector) {
                if *first != bench {
                    return Err(ValidationError::ConflictingBenchmark {
                        sector,
                        first: first.clone(),
                        second: bench,
                    });
                }
                continue;
            }
            sector_benchmarks.insert(sector, bench);
        }

        Ok(Self {
            ticker_to_sector,
            sector_benchmarks,
        })
    }

    pub fn sector_of(&self, ticker: &str) -> Option<&str> {
        self.ticker_to_sector.get(ticker).map(String::as_str)
    }

    /// Distinct sectors in sorted order.
    pub fn sectors(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self.ticker_to_sector.values().map(String::as_str).collect();
        out.sort_unstable();
        out.dedup();
        out
    }

    /// Constituent tickers of `sector`, sorted.
    pub fn constituents(&self, sector: &str) -> Vec<&str> {
        self.ticker_to_sector
            .iter()
            .filter(|(_, s)| s.as_str() == sector)
            .map(|(t, _)| t.as_str())
            .collect()
    }

    pub fn tickers(&self) -> impl Iterator<Item = (&str, &str)> {
        self.ticker_to_sector
            .iter()
            .map(|(t, s)| (t.as_str(), s.as_str()))
    }

    pub fn benchmark_of(&self, sector: &str) -> Option<&str> {
        self.sector_benchmarks.get(sector).map(String::as_str)
    }

    pub fn sector_benchmarks(&self) -> &BTreeMap<String, String> {
        &self.sector_benchmarks
    }

    pub fn has_sector_benchmarks(&self) -> bool {
        !self.sector_benchmarks.is_empty()
    }
}
