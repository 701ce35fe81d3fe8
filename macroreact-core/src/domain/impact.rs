//! Impact result types: one row per regression test.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Metric;

/// Why a fitted row carries undefined statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// A regressor has zero sum of squared deviations.
    ZeroVariance,
    /// Some observation has leverage 1, so the HC3 weight is undefined.
    UnitLeverage,
    /// Perfect fit: robust SE is zero, beta is reported but t/p are not.
    ZeroResidual,
    /// The two regressors are (near) perfectly correlated.
    Collinear,
}

impl ReasonCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::ZeroVariance => "zero_variance",
            ReasonCode::UnitLeverage => "unit_leverage",
            ReasonCode::ZeroResidual => "zero_residual",
            ReasonCode::Collinear => "collinear",
        }
    }
}

impl fmt::Display for ReasonCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Subset of the reaction table a partial regression was fitted on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Scope {
    Overall,
    Regime(String),
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Overall => f.write_str("overall"),
            Scope::Regime(name) => write!(f, "regime:{name}"),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "overall" {
            Ok(Scope::Overall)
        } else if let Some(name) = s.strip_prefix("regime:") {
            Ok(Scope::Regime(name.to_string()))
        } else {
            Err(format!("unknown scope '{s}'"))
        }
    }
}

impl From<Scope> for String {
    fn from(s: Scope) -> Self {
        s.to_string()
    }
}

impl TryFrom<String> for Scope {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Univariate `reaction ~ alpha + beta * surprise_z` test for one
/// `(event_type, sector, metric)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImpactResult {
    pub event_type: String,
    pub sector: String,
    pub metric: Metric,
    pub n: usize,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    /// HC3 robust standard error of beta.
    pub se: Option<f64>,
    /// Homoskedastic standard error of beta, kept for comparison.
    pub se_classical: Option<f64>,
    pub t_stat: Option<f64>,
    pub p_value: Option<f64>,
    pub p_adj_bh: Option<f64>,
    pub significant_bh: bool,
    pub reason: Option<ReasonCode>,

    // Asymmetry fits on positive / negative surprises (descriptive only).
    pub beta_pos: Option<f64>,
    pub t_pos: Option<f64>,
    pub n_pos: usize,
    pub beta_neg: Option<f64>,
    pub t_neg: Option<f64>,
    pub n_neg: usize,
}

/// Two-regressor `reaction ~ alpha + beta * surprise_z + gamma * momentum`
/// test for one `(scope, event_type, sector, metric)` group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialImpactResult {
    pub scope: Scope,
    pub event_type: String,
    pub sector: String,
    pub metric: Metric,
    /// Control column name, e.g. `rank_21` or `mom_63`.
    pub control: String,
    pub n: usize,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub se: Option<f64>,
    pub t_stat: Option<f64>,
    pub p_value: Option<f64>,
    pub p_adj_bh: Option<f64>,
    pub significant_bh: bool,
    pub beta_momentum: Option<f64>,
    pub se_momentum: Option<f64>,
    pub t_momentum: Option<f64>,
    pub reason: Option<ReasonCode>,
}
