//! Window returns around t0 for one cumulative series.

use crate::domain::Metric;

use super::CumulativeSeries;

/// Calendar index pair `(from, to)` a metric spans around `t0`.
///
/// `None` when the window would start before the first calendar day.
pub fn window_bounds(metric: Metric, t0: usize) -> Option<(usize, usize)> {
    match metric {
        Metric::T0 => Some((t0.checked_sub(1)?, t0)),
        Metric::Pre(k) => Some((t0.checked_sub(k as usize)?, t0)),
        Metric::Post(k) => Some((t0, t0 + k as usize)),
        Metric::Window(k) => Some((t0.checked_sub(k as usize)?, t0 + k as usize)),
    }
}

/// Value of `metric` around `t0`; null on insufficient history.
pub fn metric_value(cum: &CumulativeSeries, t0: usize, metric: Metric) -> Option<f64> {
    let (a, b) = window_bounds(metric, t0)?;
    cum.window(a, b)
}

/// Values of every metric around `t0`, in `metrics` order.
pub fn metric_values(cum: &CumulativeSeries, t0: usize, metrics: &[Metric]) -> Vec<Option<f64>> {
    metrics.iter().map(|&m| metric_value(cum, t0, m)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PriceSeries;
    use crate::returns::TradingCalendar;
    use chrono::NaiveDate;

    fn constant_growth(n: usize, r: f64) -> (PriceSeries, TradingCalendar) {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let pts: Vec<(NaiveDate, f64)> = (0..n)
            .map(|i| (start + chrono::Duration::days(i as i64), 100.0 * (1.0 + r).powi(i as i32)))
            .collect();
        let s = PriceSeries::new("A", pts).unwrap();
        let cal = TradingCalendar::from_series(std::slice::from_ref(&s));
        (s, cal)
    }

    #[test]
    fn constant_return_compounds() {
        let r = 0.01;
        let (s, cal) = constant_growth(40, r);
        let cum = CumulativeSeries::from_prices(&s, &cal);
        let t0 = 20;
        for k in [1u32, 5, 10] {
            let expected = (1.0 + r).powi(k as i32) - 1.0;
            assert!((metric_value(&cum, t0, Metric::Post(k)).unwrap() - expected).abs() < 1e-12);
            assert!((metric_value(&cum, t0, Metric::Pre(k)).unwrap() - expected).abs() < 1e-12);
            let sym = (1.0 + r).powi(2 * k as i32) - 1.0;
            assert!((metric_value(&cum, t0, Metric::Window(k)).unwrap() - sym).abs() < 1e-12);
        }
        assert!((metric_value(&cum, t0, Metric::T0).unwrap() - r).abs() < 1e-12);
    }

    #[test]
    fn insufficient_history_is_null() {
        let (s, cal) = constant_growth(10, 0.01);
        let cum = CumulativeSeries::from_prices(&s, &cal);
        assert_eq!(metric_value(&cum, 0, Metric::T0), None);
        assert_eq!(metric_value(&cum, 3, Metric::Pre(5)), None);
        assert_eq!(metric_value(&cum, 7, Metric::Post(5)), None);
        assert_eq!(metric_value(&cum, 5, Metric::Window(5)), None);
        assert!(metric_value(&cum, 5, Metric::Pre(5)).is_some());
        assert!(metric_value(&cum, 4, Metric::Post(5)).is_some());
    }

    #[test]
    fn values_follow_metric_order() {
        let (s, cal) = constant_growth(10, 0.0);
        let cum = CumulativeSeries::from_prices(&s, &cal);
        let metrics = [Metric::T0, Metric::Post(20)];
        assert_eq!(metric_values(&cum, 5, &metrics), vec![Some(0.0), None]);
    }
}
