//! Analysis configuration — one immutable value threaded into every component.
//!
//! Loaded from TOML. Every field has a default, so an empty file (or no file
//! at all) reproduces the standard run. The engine never reads environment
//! variables; anything that changes results lives here and feeds the
//! config hash.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

// ─── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        message: message.into(),
    }
}

// ─── Choices ─────────────────────────────────────────────────────────

/// How an event date that is not a trading day is mapped to t0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum T0Alignment {
    /// First trading day on or after the event date.
    #[default]
    NextTradingDay,
    /// Last trading day on or before the event date.
    PreviousTradingDay,
}

/// Release cadence of an event type; picks the surprise lookback length.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseFrequency {
    Weekly,
    Monthly,
    Quarterly,
}

impl ReleaseFrequency {
    /// Roughly half a year to a year of prior releases.
    pub fn window(&self) -> usize {
        match self {
            ReleaseFrequency::Weekly => 26,
            ReleaseFrequency::Monthly => 12,
            ReleaseFrequency::Quarterly => 8,
        }
    }
}

/// Which sector-cycle value enters the partial regression as control.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MomentumMeasure {
    /// Cross-sectional momentum rank (1 = strongest).
    #[default]
    Rank,
    /// Raw trailing cumulative return.
    Return,
}

/// Value the quantile buckets are cut on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuantileBasis {
    /// `|surprise_z|`
    #[default]
    Magnitude,
    /// `surprise_z`
    Signed,
}

// ─── Sections ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SurpriseConfig {
    /// Number of prior surprises in the rolling window.
    pub window: usize,
    /// Minimum prior surprises before a z-score is emitted.
    pub min_periods: usize,
    /// Per-type override of `window` by release frequency.
    pub frequency_by_type: BTreeMap<String, ReleaseFrequency>,
}

impl Default for SurpriseConfig {
    fn default() -> Self {
        Self {
            window: 12,
            min_periods: 3,
            frequency_by_type: BTreeMap::new(),
        }
    }
}

impl SurpriseConfig {
    /// Lookback length for `event_type`.
    pub fn window_for(&self, event_type: &str) -> usize {
        self.frequency_by_type
            .get(event_type)
            .map(ReleaseFrequency::window)
            .unwrap_or(self.window)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MomentumControl {
    /// Cycle window whose momentum is controlled for.
    pub window: u32,
    pub measure: MomentumMeasure,
}

impl Default for MomentumControl {
    fn default() -> Self {
        Self {
            window: 21,
            measure: MomentumMeasure::Rank,
        }
    }
}

impl MomentumControl {
    /// Column name of the control, e.g. `rank_21`.
    pub fn column_name(&self) -> String {
        match self.measure {
            MomentumMeasure::Rank => format!("rank_{}", self.window),
            MomentumMeasure::Return => format!("mom_{}", self.window),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FocusConfig {
    pub top_n: usize,
    /// Keep only events within this many calendar days of the latest event.
    pub last_days: Option<u32>,
    /// Keep only rows on the most recent N distinct event dates.
    pub last_events: Option<usize>,
}

impl Default for FocusConfig {
    fn default() -> Self {
        Self {
            top_n: 3,
            last_days: None,
            last_events: None,
        }
    }
}

// ─── AnalysisConfig ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Half-window lengths `k` (trading days) for pre/post/symmetric windows.
    pub return_windows: Vec<u32>,
    /// Trailing windows for sector momentum and ranks.
    pub cycle_windows: Vec<u32>,
    pub fdr_alpha: f64,
    pub min_sample: usize,
    pub surprise: SurpriseConfig,
    pub t0_alignment: T0Alignment,
    /// Ticker subtracted from every constituent when no sector mapping exists.
    pub global_benchmark: Option<String>,
    pub momentum_control: MomentumControl,
    pub collinearity_limit: f64,
    pub partial_by_regime: bool,
    pub quantiles: usize,
    pub quantile_basis: QuantileBasis,
    pub focus: FocusConfig,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            return_windows: vec![1, 5, 10, 21],
            cycle_windows: vec![21, 63, 126],
            fdr_alpha: 0.05,
            min_sample: 5,
            surprise: SurpriseConfig::default(),
            t0_alignment: T0Alignment::default(),
            global_benchmark: None,
            momentum_control: MomentumControl::default(),
            collinearity_limit: 0.99,
            partial_by_regime: true,
            quantiles: 4,
            quantile_basis: QuantileBasis::default(),
            focus: FocusConfig::default(),
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: AnalysisConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.fdr_alpha > 0.0 && self.fdr_alpha < 1.0) {
            return Err(invalid("fdr_alpha", format!("{} is not in (0, 1)", self.fdr_alpha)));
        }
        if self.min_sample < 3 {
            return Err(invalid("min_sample", format!("{} < 3", self.min_sample)));
        }
        check_windows("return_windows", &self.return_windows)?;
        check_windows("cycle_windows", &self.cycle_windows)?;
        if self.surprise.min_periods < 2 {
            return Err(invalid(
                "surprise.min_periods",
                format!("{} < 2", self.surprise.min_periods),
            ));
        }
        if self.surprise.window < self.surprise.min_periods {
            return Err(invalid(
                "surprise.window",
                format!(
                    "{} is shorter than min_periods {}",
                    self.surprise.window, self.surprise.min_periods
                ),
            ));
        }
        for (event_type, freq) in &self.surprise.frequency_by_type {
            if freq.window() < self.surprise.min_periods {
                return Err(invalid(
                    "surprise.frequency_by_type",
                    format!("window for '{event_type}' is shorter than min_periods"),
                ));
            }
        }
        if !self.cycle_windows.contains(&self.momentum_control.window) {
            return Err(invalid(
                "momentum_control.window",
                format!(
                    "{} is not one of cycle_windows {:?}",
                    self.momentum_control.window, self.cycle_windows
                ),
            ));
        }
        if !(self.collinearity_limit > 0.0 && self.collinearity_limit < 1.0) {
            return Err(invalid(
                "collinearity_limit",
                format!("{} is not in (0, 1)", self.collinearity_limit),
            ));
        }
        if self.quantiles < 2 {
            return Err(invalid("quantiles", format!("{} < 2", self.quantiles)));
        }
        if self.focus.top_n == 0 {
            return Err(invalid("focus.top_n", "must be at least 1"));
        }
        if self.focus.last_events == Some(0) {
            return Err(invalid("focus.last_events", "must be at least 1"));
        }
        if let Some(b) = &self.global_benchmark {
            if b.trim().is_empty() {
                return Err(invalid("global_benchmark", "empty ticker"));
            }
        }
        Ok(())
    }

    /// Return windows sorted ascending without duplicates.
    pub fn sorted_return_windows(&self) -> Vec<u32> {
        sorted_unique(&self.return_windows)
    }

    /// Cycle windows sorted ascending without duplicates.
    pub fn sorted_cycle_windows(&self) -> Vec<u32> {
        sorted_unique(&self.cycle_windows)
    }

    /// Deterministic BLAKE3 hash of the canonical JSON form.
    pub fn config_hash(&self) -> String {
        // Struct fields serialize in declaration order and maps are BTreeMaps.
        let bytes = serde_json::to_vec(self).unwrap_or_else(|_| format!("{self:?}").into_bytes());
        blake3::hash(&bytes).to_hex().to_string()
    }
}

fn check_windows(field: &'static str, windows: &[u32]) -> Result<(), ConfigError> {
    if windows.is_empty() {
        return Err(invalid(field, "must not be empty"));
    }
    if windows.contains(&0) {
        return Err(invalid(field, "windows must be positive"));
    }
    Ok(())
}

fn sorted_unique(v: &[u32]) -> Vec<u32> {
    let mut out = v.to_vec();
    out.sort_unstable();
    out.dedup();
    out
}
