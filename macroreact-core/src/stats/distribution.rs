//! Student's t distribution from first principles.
//!
//! Lanczos ln Γ and a Lentz continued fraction for the regularized
//! incomplete beta are accurate to ~1e-10 over the df range regressions
//! here produce (df ≥ 1), which is far tighter than any decision made on
//! the resulting p-values.

use std::f64::consts::PI;

// ─── Math primitives ─────────────────────────────────────────────────

/// ln Γ(x) via the Lanczos approximation (g = 7, n = 9).
pub(crate) fn ln_gamma(x: f64) -> f64 {
    #[allow(clippy::excessive_precision)]
    const LANCZOS: [f64; 9] = [
        0.99999999999980993,
        676.5203681218851,
        -1259.1392167224028,
        771.32342877765313,
        -176.61502916214059,
        12.507343278686905,
        -0.13857109526572012,
        9.9843695780195716e-6,
        1.5056327351493116e-7,
    ];
    const G: f64 = 7.0;

    if x < 0.5 {
        // Reflection: Γ(x) Γ(1-x) = π / sin(πx)
        let s = (PI * x).sin().abs();
        if s < 1e-300 {
            return f64::INFINITY;
        }
        return PI.ln() - s.ln() - ln_gamma(1.0 - x);
    }

    let z = x - 1.0;
    let series = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, &c)| acc + c / (z + i as f64));
    let t = z + G + 0.5;

    0.5 * (2.0 * PI).ln() + (z + 0.5) * t.ln() - t + series.ln()
}

const LENTZ_TINY: f64 = 1e-30;

fn lentz_clamp(v: f64) -> f64 {
    if v.abs() < LENTZ_TINY {
        LENTZ_TINY
    } else {
        v
    }
}

/// Regularized incomplete beta I_x(a, b), continued fraction by modified Lentz.
pub(crate) fn regularized_incomplete_beta(a: f64, b: f64, x: f64) -> f64 {
    if !(0.0..=1.0).contains(&x) {
        return f64::NAN;
    }
    if x == 0.0 || x == 1.0 {
        return x;
    }
    // The fraction converges fast only below the mean; reflect otherwise.
    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - regularized_incomplete_beta(b, a, 1.0 - x);
    }

    let ln_front =
        a * x.ln() + b * (1.0 - x).ln() + ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) - a.ln();

    const MAX_ITER: usize = 300;
    const EPS: f64 = 1e-14;

    let mut c = 1.0_f64;
    let mut d = 1.0 / lentz_clamp(1.0 - (a + b) * x / (a + 1.0));
    let mut frac = d;

    for m in 1..=MAX_ITER {
        let m = m as f64;
        let two_m = 2.0 * m;

        let even = m * (b - m) * x / ((a + two_m - 1.0) * (a + two_m));
        d = 1.0 / lentz_clamp(1.0 + even * d);
        c = lentz_clamp(1.0 + even / c);
        frac *= c * d;

        let odd = -(a + m) * (a + b + m) * x / ((a + two_m) * (a + two_m + 1.0));
        d = 1.0 / lentz_clamp(1.0 + odd * d);
        c = lentz_clamp(1.0 + odd / c);
        let step = c * d;
        frac *= step;

        if (step - 1.0).abs() < EPS {
            break;
        }
    }

    ln_front.exp() * frac
}

// ─── Student's t ─────────────────────────────────────────────────────

/// P(T ≤ t) for Student's t with `df` degrees of freedom.
pub fn t_cdf(t: f64, df: f64) -> f64 {
    if df <= 0.0 || t.is_nan() {
        return f64::NAN;
    }
    if t == 0.0 {
        return 0.5;
    }
    let tail = 0.5 * regularized_incomplete_beta(df / 2.0, 0.5, df / (df + t * t));
    if t > 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

/// Two-sided p-value `P(|T| ≥ |t|)`.
///
/// Computed from the lower tail directly so tiny p-values do not round to 0
/// through `1 - cdf`.
pub fn two_sided_p(t: f64, df: f64) -> f64 {
    if df <= 0.0 || t.is_nan() {
        return f64::NAN;
    }
    if t.is_infinite() {
        return 0.0;
    }
    (2.0 * t_cdf(-t.abs(), df)).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ln_gamma_matches_factorials() {
        assert!(ln_gamma(1.0).abs() < 1e-10);
        assert!(ln_gamma(2.0).abs() < 1e-10);
        assert!((ln_gamma(4.0) - 6.0_f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(6.0) - 120.0_f64.ln()).abs() < 1e-10);
        assert!((ln_gamma(0.5) - PI.sqrt().ln()).abs() < 1e-10);
    }

    #[test]
    fn incomplete_beta_edges() {
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 0.0), 0.0);
        assert_eq!(regularized_incomplete_beta(2.0, 3.0, 1.0), 1.0);
        assert!(regularized_incomplete_beta(2.0, 3.0, 1.5).is_nan());
        // I_x(1, 1) = x
        assert!((regularized_incomplete_beta(1.0, 1.0, 0.3) - 0.3).abs() < 1e-10);
    }

    #[test]
    fn t_cdf_is_symmetric_around_zero() {
        for df in [1.0, 3.0, 10.0, 50.0] {
            assert!((t_cdf(0.0, df) - 0.5).abs() < 1e-12);
            for t in [0.3, 1.0, 2.5] {
                assert!((t_cdf(t, df) + t_cdf(-t, df) - 1.0).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn t_cdf_reference_values() {
        // Cauchy: F(1) = 0.75
        assert!((t_cdf(1.0, 1.0) - 0.75).abs() < 1e-8);
        // t(2): F(t) = 1/2 + t / (2 sqrt(2 + t²))
        let t: f64 = 1.5;
        let exact = 0.5 + t / (2.0 * (2.0 + t * t).sqrt());
        assert!((t_cdf(t, 2.0) - exact).abs() < 1e-8);
    }

    #[test]
    fn two_sided_p_reference_values() {
        // 97.5% quantile of t(10) is 2.228139
        assert!((two_sided_p(2.228139, 10.0) - 0.05).abs() < 1e-5);
        assert!((two_sided_p(-2.228139, 10.0) - 0.05).abs() < 1e-5);
        assert!((two_sided_p(0.0, 5.0) - 1.0).abs() < 1e-12);
        assert_eq!(two_sided_p(f64::INFINITY, 5.0), 0.0);
        assert!(two_sided_p(1.0, 0.0).is_nan());
    }

    #[test]
    fn two_sided_p_keeps_small_tails() {
        let p = two_sided_p(40.0, 30.0);
        assert!(p > 0.0 && p < 1e-20);
    }
}
