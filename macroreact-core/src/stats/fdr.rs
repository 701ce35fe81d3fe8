//! Benjamini–Hochberg false discovery rate correction.
//!
//! The family is whatever slice the caller passes in; for a market run that
//! is every impact test (and separately every partial test). Undefined
//! p-values pass through untouched and do not count toward `m`.

use serde::{Deserialize, Serialize};

/// Correction outcome for one test, aligned with the input slot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BhOutcome {
    /// Step-up adjusted p-value, `None` when the raw p was undefined.
    pub p_adj: Option<f64>,
    pub significant: bool,
}

impl BhOutcome {
    const UNDEFINED: BhOutcome = BhOutcome {
        p_adj: None,
        significant: false,
    };
}

/// Apply BH at level `alpha`, preserving input order.
///
/// 1. Sort the defined p-values ascending; ties keep input order.
/// 2. `p_adj_(i) = min_{j ≥ i} p_(j) · m / j`, capped at 1.
/// 3. Find the largest rank `k` with `p_(k) ≤ k · alpha / m`; ranks `≤ k`
///    are significant.
pub fn benjamini_hochberg(p_values: &[Option<f64>], alpha: f64) -> Vec<BhOutcome> {
    let mut out = vec![BhOutcome::UNDEFINED; p_values.len()];

    let mut ranked: Vec<(usize, f64)> = p_values
        .iter()
        .enumerate()
        .filter_map(|(i, p)| p.filter(|v| v.is_finite()).map(|v| (i, v)))
        .collect();
    if ranked.is_empty() {
        return out;
    }
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));

    let m = ranked.len();
    let m_f = m as f64;

    // Step-up from the largest p downwards.
    let mut adjusted = vec![0.0_f64; m];
    let mut running = 1.0_f64;
    for rank in (1..=m).rev() {
        let p = ranked[rank - 1].1;
        running = running.min(p * m_f / rank as f64);
        adjusted[rank - 1] = running.min(1.0);
    }

    let cutoff = (1..=m)
        .rev()
        .find(|&k| ranked[k - 1].1 <= k as f64 * alpha / m_f)
        .unwrap_or(0);

    for (pos, &(idx, _)) in ranked.iter().enumerate() {
        out[idx] = BhOutcome {
            p_adj: Some(adjusted[pos]),
            significant: pos < cutoff,
        };
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defined(ps: &[f64]) -> Vec<Option<f64>> {
        ps.iter().copied().map(Some).collect()
    }

    #[test]
    fn empty_and_all_undefined() {
        assert!(benjamini_hochberg(&[], 0.05).is_empty());
        let out = benjamini_hochberg(&[None, None], 0.05);
        assert_eq!(out, vec![BhOutcome::UNDEFINED; 2]);
    }

    #[test]
    fn single_test_is_unchanged() {
        let out = benjamini_hochberg(&[Some(0.01)], 0.05);
        assert!(out[0].significant);
        assert!((out[0].p_adj.unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn textbook_example() {
        // Sorted: 0.001 0.020 0.040 0.300 0.700; thresholds 0.01 0.02 0.03 0.04 0.05
        let ps = defined(&[0.300, 0.001, 0.040, 0.700, 0.020]);
        let out = benjamini_hochberg(&ps, 0.05);
        let sig: Vec<bool> = out.iter().map(|o| o.significant).collect();
        assert_eq!(sig, vec![false, true, false, false, true]);

        // p_adj: 0.005, 0.05, 0.0667, 0.375, 0.7
        assert!((out[1].p_adj.unwrap() - 0.005).abs() < 1e-12);
        assert!((out[4].p_adj.unwrap() - 0.05).abs() < 1e-12);
        assert!((out[2].p_adj.unwrap() - 0.2 / 3.0).abs() < 1e-12);
        assert!((out[0].p_adj.unwrap() - 0.375).abs() < 1e-12);
        assert!((out[3].p_adj.unwrap() - 0.7).abs() < 1e-12);
    }

    #[test]
    fn step_up_rescues_earlier_ranks() {
        // p_(1)=0.04 > 0.05/3 but p_(3)=0.045 ≤ 0.05, so all three are significant.
        let out = benjamini_hochberg(&defined(&[0.04, 0.045, 0.042]), 0.05);
        assert!(out.iter().all(|o| o.significant));
        assert!(out.iter().all(|o| (o.p_adj.unwrap() - 0.045).abs() < 1e-12));
    }

    #[test]
    fn undefined_values_do_not_count_toward_m() {
        let with_gaps = benjamini_hochberg(&[Some(0.02), None, Some(0.04), None], 0.05);
        let dense = benjamini_hochberg(&defined(&[0.02, 0.04]), 0.05);
        assert_eq!(with_gaps[0], dense[0]);
        assert_eq!(with_gaps[2], dense[1]);
        assert_eq!(with_gaps[1], BhOutcome::UNDEFINED);
    }

    #[test]
    fn adjusted_never_exceeds_one() {
        let out = benjamini_hochberg(&defined(&[0.9, 0.95, 0.99]), 0.05);
        assert!(out.iter().all(|o| o.p_adj.unwrap() <= 1.0));
        assert!(out.iter().all(|o| !o.significant));
    }

    #[test]
    fn larger_family_never_lowers_adjusted_p() {
        let small = benjamini_hochberg(&[Some(0.03)], 0.05);
        let mut big = vec![Some(0.03)];
        big.extend(std::iter::repeat(Some(0.5)).take(49));
        let big = benjamini_hochberg(&big, 0.05);
        assert!(big[0].p_adj.unwrap() >= small[0].p_adj.unwrap());
    }
}
