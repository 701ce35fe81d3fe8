//! Ordinary least squares with HC3 heteroskedasticity-consistent errors.
//!
//! Two shapes are needed: `y ~ a + b·x` for the impact estimator and
//! `y ~ a + b1·x1 + b2·x2` for the momentum-controlled partial estimator.
//! Both work on centered regressors, which keeps the normal equations
//! well-conditioned for returns measured in fractions of a percent.
//!
//! Degenerate inputs never panic; they produce a fit whose inference fields
//! are `None` and whose `reason` says why.

use super::distribution::two_sided_p;
use crate::domain::ReasonCode;

/// Relative tolerance under which a sum of squares counts as zero.
const ZERO_SS: f64 = 1e-24;
/// `1 - h_i` below this is treated as unit leverage.
const LEVERAGE_EPS: f64 = 1e-10;

fn mean(v: &[f64]) -> f64 {
    v.iter().sum::<f64>() / v.len() as f64
}

fn sum_sq(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum()
}

// ─── Univariate ──────────────────────────────────────────────────────

/// Result of `y = alpha + beta·x + e`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleFit {
    pub n: usize,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub se_hc3: Option<f64>,
    pub se_classical: Option<f64>,
    pub t_stat: Option<f64>,
    pub p_value: Option<f64>,
    pub reason: Option<ReasonCode>,
}

impl SimpleFit {
    fn undefined(n: usize, reason: ReasonCode) -> Self {
        Self {
            n,
            alpha: None,
            beta: None,
            se_hc3: None,
            se_classical: None,
            t_stat: None,
            p_value: None,
            reason: Some(reason),
        }
    }
}

/// Fit `y = alpha + beta·x` by OLS with HC3 robust inference.
///
/// Returns `None` when the inputs differ in length or `n < 3` (no residual
/// degrees of freedom).
///
/// With `d_i = x_i - x̄` and `S_xx = Σ d_i²`:
/// - leverage `h_i = d_i² / S_xx + 1/n`
/// - `Var_HC3(beta) = Σ (d_i e_i / (1 - h_i))² / S_xx²`
/// - `t = beta / se`, two-sided p from Student t with `n - 2` df.
pub fn ols_hc3(x: &[f64], y: &[f64]) -> Option<SimpleFit> {
    let n = x.len();
    if n != y.len() || n < 3 {
        return None;
    }
    let n_f = n as f64;
    let x_bar = mean(x);
    let y_bar = mean(y);
    let d: Vec<f64> = x.iter().map(|v| v - x_bar).collect();
    let sxx = sum_sq(&d);

    if sxx <= ZERO_SS * sum_sq(x).max(1.0) {
        return Some(SimpleFit::undefined(n, ReasonCode::ZeroVariance));
    }

    let sxy: f64 = d.iter().zip(y).map(|(di, yi)| di * (yi - y_bar)).sum();
    let beta = sxy / sxx;
    let alpha = y_bar - beta * x_bar;
    let resid: Vec<f64> = x.iter().zip(y).map(|(xi, yi)| yi - alpha - beta * xi).collect();
    let ssr = sum_sq(&resid);

    let mut fit = SimpleFit {
        n,
        alpha: Some(alpha),
        beta: Some(beta),
        se_hc3: None,
        se_classical: None,
        t_stat: None,
        p_value: None,
        reason: None,
    };

    let mut meat = 0.0;
    for (di, ei) in d.iter().zip(&resid) {
        let one_minus_h = 1.0 - (di * di / sxx + 1.0 / n_f);
        if one_minus_h <= LEVERAGE_EPS {
            fit.reason = Some(ReasonCode::UnitLeverage);
            return Some(fit);
        }
        let w = di * ei / one_minus_h;
        meat += w * w;
    }

    if ssr <= ZERO_SS * sum_sq(y).max(f64::MIN_POSITIVE) {
        fit.se_hc3 = Some(0.0);
        fit.se_classical = Some(0.0);
        fit.reason = Some(ReasonCode::ZeroResidual);
        return Some(fit);
    }

    let se = meat.sqrt() / sxx;
    let df = n_f - 2.0;
    fit.se_hc3 = Some(se);
    fit.se_classical = Some((ssr / df / sxx).sqrt());
    if se > 0.0 {
        let t = beta / se;
        fit.t_stat = Some(t);
        fit.p_value = Some(two_sided_p(t, df));
    } else {
        fit.reason = Some(ReasonCode::ZeroResidual);
    }
    Some(fit)
}

// ─── Bivariate ───────────────────────────────────────────────────────

/// Result of `y = alpha + beta·x1 + gamma·x2 + e`.
#[derive(Debug, Clone, PartialEq)]
pub struct PartialFit {
    pub n: usize,
    pub alpha: Option<f64>,
    pub beta: Option<f64>,
    pub se: Option<f64>,
    pub t_stat: Option<f64>,
    pub p_value: Option<f64>,
    pub gamma: Option<f64>,
    pub se_gamma: Option<f64>,
    pub t_gamma: Option<f64>,
    pub reason: Option<ReasonCode>,
}

impl PartialFit {
    fn undefined(n: usize, reason: ReasonCode) -> Self {
        Self {
            n,
            alpha: None,
            beta: None,
            se: None,
            t_stat: None,
            p_value: None,
            gamma: None,
            se_gamma: None,
            t_gamma: None,
            reason: Some(reason),
        }
    }
}

/// Fit `y = alpha + beta·x1 + gamma·x2` by OLS with HC3 inference on both
/// slopes (`n - 3` df).
///
/// Returns `None` when lengths differ or `n < 4`. Zero variance in either
/// regressor yields `zero_variance`; `|corr(x1, x2)| ≥ collinearity_limit`
/// yields `collinear`. Both leave every coefficient undefined.
pub fn ols2_hc3(x1: &[f64], x2: &[f64], y: &[f64], collinearity_limit: f64) -> Option<PartialFit> {
    let n = y.len();
    if x1.len() != n || x2.len() != n || n < 4 {
        return None;
    }
    let n_f = n as f64;
    let (m1, m2, my) = (mean(x1), mean(x2), mean(y));
    let c1: Vec<f64> = x1.iter().map(|v| v - m1).collect();
    let c2: Vec<f64> = x2.iter().map(|v| v - m2).collect();

    let s11 = sum_sq(&c1);
    let s22 = sum_sq(&c2);
    if s11 <= ZERO_SS * sum_sq(x1).max(1.0) || s22 <= ZERO_SS * sum_sq(x2).max(1.0) {
        return Some(PartialFit::undefined(n, ReasonCode::ZeroVariance));
    }
    let s12: f64 = c1.iter().zip(&c2).map(|(a, b)| a * b).sum();
    let corr = s12 / (s11 * s22).sqrt();
    if corr.abs() >= collinearity_limit {
        return Some(PartialFit::undefined(n, ReasonCode::Collinear));
    }

    let s1y: f64 = c1.iter().zip(y).map(|(a, yi)| a * (yi - my)).sum();
    let s2y: f64 = c2.iter().zip(y).map(|(b, yi)| b * (yi - my)).sum();

    // Inverse of the centered cross-product matrix [[s11, s12], [s12, s22]].
    let det = s11 * s22 - s12 * s12;
    let (i11, i12, i22) = (s22 / det, -s12 / det, s11 / det);

    let beta = i11 * s1y + i12 * s2y;
    let gamma = i12 * s1y + i22 * s2y;
    let alpha = my - beta * m1 - gamma * m2;
    let resid: Vec<f64> = (0..n)
        .map(|i| y[i] - alpha - beta * x1[i] - gamma * x2[i])
        .collect();

    let mut fit = PartialFit {
        n,
        alpha: Some(alpha),
        beta: Some(beta),
        se: None,
        t_stat: None,
        p_value: None,
        gamma: Some(gamma),
        se_gamma: None,
        t_gamma: None,
        reason: None,
    };

    // Meat Σ w_i c_i c_iᵀ with w_i = e_i² / (1 - h_i)².
    let (mut m11, mut m12, mut m22) = (0.0, 0.0, 0.0);
    for i in 0..n {
        let (a, b) = (c1[i], c2[i]);
        let h = 1.0 / n_f + a * a * i11 + 2.0 * a * b * i12 + b * b * i22;
        let one_minus_h = 1.0 - h;
        if one_minus_h <= LEVERAGE_EPS {
            fit.reason = Some(ReasonCode::UnitLeverage);
            return Some(fit);
        }
        let w = (resid[i] / one_minus_h).powi(2);
        m11 += w * a * a;
        m12 += w * a * b;
        m22 += w * b * b;
    }

    if sum_sq(&resid) <= ZERO_SS * sum_sq(y).max(f64::MIN_POSITIVE) {
        fit.se = Some(0.0);
        fit.se_gamma = Some(0.0);
        fit.reason = Some(ReasonCode::ZeroResidual);
        return Some(fit);
    }

    // Sandwich S⁻¹ M S⁻¹, diagonal only.
    let v11 = i11 * (i11 * m11 + i12 * m12) + i12 * (i11 * m12 + i12 * m22);
    let v22 = i12 * (i12 * m11 + i22 * m12) + i22 * (i12 * m12 + i22 * m22);
    let se = v11.max(0.0).sqrt();
    let se_gamma = v22.max(0.0).sqrt();
    let df = n_f - 3.0;

    fit.se = Some(se);
    fit.se_gamma = Some(se_gamma);
    if se > 0.0 {
        let t = beta / se;
        fit.t_stat = Some(t);
        fit.p_value = Some(two_sided_p(t, df));
    } else {
        fit.reason = Some(ReasonCode::ZeroResidual);
    }
    if se_gamma > 0.0 {
        fit.t_gamma = Some(gamma / se_gamma);
    }
    Some(fit)
}

/// Pearson correlation, `None` when either side is constant.
pub fn correlation(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }
    let (mx, my) = (mean(x), mean(y));
    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        let (da, db) = (a - mx, b - my);
        sxy += da * db;
        sxx += da * da;
        syy += db * db;
    }
    (sxx > 0.0 && syy > 0.0).then(|| sxy / (sxx * syy).sqrt())
}
