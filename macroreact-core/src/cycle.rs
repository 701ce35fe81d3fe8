//! Sector cycle — per-date sector momentum, cross-sectional ranks and
//! per-regime average returns.
//!
//! A sector's daily return is its benchmark's raw return when the sector
//! has a priced benchmark, else the equal-weighted mean of its
//! constituents' raw returns. Momentum over `w` days ending on day `d`
//! compounds the returns of days `d-w+1 ..= d`; it is null unless all of
//! them are defined.

use chrono::NaiveDate;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use crate::domain::{CyclePoint, RegimeCalendar, SectorMap};
use crate::returns::ReturnPanel;

/// Where a sector's daily return series comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectorSource {
    Benchmark { ticker: String },
    EqualWeight { constituents: usize },
}

#[derive(Debug, Clone)]
struct SectorTrack {
    source: SectorSource,
    daily: Vec<Option<f64>>,
    /// `[window][day]`
    momentum: Vec<Vec<Option<f64>>>,
    /// `[window][day]`
    rank: Vec<Vec<Option<u32>>>,
}

/// One row of the per-date rank table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleRow {
    pub date: NaiveDate,
    pub sector: String,
    /// One point per cycle window, in ascending window order.
    pub points: Vec<CyclePoint>,
}

/// Average daily sector return inside one regime range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeAverage {
    pub regime: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub sector: String,
    pub n: usize,
    pub avg_daily_return: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct SectorCycle {
    windows: Vec<u32>,
    dates: Vec<NaiveDate>,
    sectors: BTreeMap<String, SectorTrack>,
}

impl SectorCycle {
    /// Build momentum and ranks for every sector in `sector_map`.
    ///
    /// `windows` must be sorted ascending and deduplicated.
    pub fn build(panel: &ReturnPanel, sector_map: &SectorMap, windows: &[u32]) -> Self {
        let calendar = panel.calendar();
        let names: Vec<&str> = sector_map.sectors();

        let mut tracks: BTreeMap<String, SectorTrack> = names
            .par_iter()
            .map(|&sector| {
                let (source, daily) = sector_daily_returns(panel, sector_map, sector);
                let momentum = windows.iter().map(|&w| trailing_momentum(&daily, w as usize)).collect();
                let track = SectorTrack {
                    source,
                    daily,
                    momentum,
                    rank: Vec::new(),
                };
                (sector.to_string(), track)
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        assign_ranks(&mut tracks, windows.len(), calendar.len());
        debug!(sectors = tracks.len(), windows = ?windows, "built sector cycle");

        Self {
            windows: windows.to_vec(),
            dates: calendar.dates().to_vec(),
            sectors: tracks,
        }
    }

    pub fn windows(&self) -> &[u32] {
        &self.windows
    }

    pub fn source(&self, sector: &str) -> Option<&SectorSource> {
        self.sectors.get(sector).map(|t| &t.source)
    }

    pub fn daily_return(&self, sector: &str, day: usize) -> Option<f64> {
        self.sectors.get(sector)?.daily.get(day).copied().flatten()
    }

    /// Momentum and rank per window for `sector` as of calendar day `day`.
    pub fn snapshot(&self, sector: &str, day: Option<usize>) -> BTreeMap<u32, CyclePoint> {
        let track = self.sectors.get(sector);
        self.windows
            .iter()
            .enumerate()
            .map(|(wi, &w)| {
                let point = match (track, day) {
                    (Some(t), Some(d)) => CyclePoint {
                        momentum: t.momentum[wi].get(d).copied().flatten(),
                        rank: t.rank[wi].get(d).copied().flatten(),
                    },
                    _ => CyclePoint::default(),
                };
                (w, point)
            })
            .collect()
    }

    /// Rank table rows for every date on which at least one window has a
    /// value, ordered by date then sector.
    pub fn rows(&self) -> Vec<CycleRow> {
        let mut out = Vec::new();
        for (day, &date) in self.dates.iter().enumerate() {
            for (sector, track) in &self.sectors {
                let points: Vec<CyclePoint> = (0..self.windows.len())
                    .map(|wi| CyclePoint {
                        momentum: track.momentum[wi][day],
                        rank: track.rank[wi][day],
                    })
                    .collect();
                if points.iter().any(|p| p.momentum.is_some()) {
                    out.push(CycleRow {
                        date,
                        sector: sector.clone(),
                        points,
                    });
                }
            }
        }
        out
    }

    /// Mean daily sector return within each regime range.
    pub fn regime_averages(&self, regimes: &RegimeCalendar) -> Vec<RegimeAverage> {
        let mut out = Vec::new();
        for range in regimes.ranges() {
            let from = self.dates.partition_point(|d| *d < range.start_date);
            let to = self.dates.partition_point(|d| *d <= range.end_date);
            for (sector, track) in &self.sectors {
                let vals: Vec<f64> = track.daily[from..to].iter().flatten().copied().collect();
                out.push(RegimeAverage {
                    regime: range.regime_name.clone(),
                    start_date: range.start_date,
                    end_date: range.end_date,
                    sector: sector.clone(),
                    n: vals.len(),
                    avg_daily_return: crate::stats::mean(&vals),
                });
            }
        }
        out
    }
}

fn sector_daily_returns(
    panel: &ReturnPanel,
    sector_map: &SectorMap,
    sector: &str,
) -> (SectorSource, Vec<Option<f64>>) {
    let n = panel.calendar().len();
    if let Some(bench) = sector_map.benchmark_of(sector) {
        if let Some(cum) = panel.raw(bench) {
            let daily = (0..n).map(|d| cum.daily_return(d)).collect();
            return (
                SectorSource::Benchmark {
                    ticker: bench.to_string(),
                },
                daily,
            );
        }
    }

    let members: Vec<_> = sector_map
        .constituents(sector)
        .into_iter()
        .filter_map(|t| panel.raw(t))
        .collect();
    let daily = (0..n)
        .map(|d| {
            let vals: Vec<f64> = members.iter().filter_map(|c| c.daily_return(d)).collect();
            crate::stats::mean(&vals)
        })
        .collect();
    (
        SectorSource::EqualWeight {
            constituents: members.len(),
        },
        daily,
    )
}

/// Trailing `w`-day compounded return ending on each day.
fn trailing_momentum(daily: &[Option<f64>], w: usize) -> Vec<Option<f64>> {
    let n = daily.len();
    // Prefix product of (1 + r) and prefix count of missing days.
    let mut level = vec![1.0_f64; n + 1];
    let mut missing = vec![0usize; n + 1];
    for (i, r) in daily.iter().enumerate() {
        level[i + 1] = level[i] * (1.0 + r.unwrap_or(0.0));
        missing[i + 1] = missing[i] + usize::from(r.is_none());
    }
    (0..n)
        .map(|d| {
            let end = d + 1;
            let start = end.checked_sub(w)?;
            (missing[end] == missing[start] && level[start] != 0.0)
                .then(|| level[end] / level[start] - 1.0)
        })
        .collect()
}

/// Rank 1 = highest momentum among sectors with a value that day; ties are
/// ordered by sector name.
fn assign_ranks(tracks: &mut BTreeMap<String, SectorTrack>, n_windows: usize, n_days: usize) {
    for track in tracks.values_mut() {
        track.rank = vec![vec![None; n_days]; n_windows];
    }
    for wi in 0..n_windows {
        for day in 0..n_days {
            // BTreeMap order is sector-name order, so a stable sort keeps ties by name.
            let mut present: Vec<(&String, f64)> = tracks
                .iter()
                .filter_map(|(name, t)| t.momentum[wi][day].map(|m| (name, m)))
                .collect();
            present.sort_by(|a, b| b.1.total_cmp(&a.1));
            let ranked: Vec<(String, u32)> = present
                .into_iter()
                .enumerate()
                .map(|(pos, (name, _))| (name.clone(), pos as u32 + 1))
                .collect();
            for (name, rank) in ranked {
                if let Some(t) = tracks.get_mut(&name) {
                    t.rank[wi][day] = Some(rank);
                }
            }
        }
    }
}
