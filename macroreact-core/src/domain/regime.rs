//! Regime calendar — labeled, non-overlapping macro phases.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Label attached to dates that fall outside every regime range.
pub const UNKNOWN_REGIME: &str = "unknown";

/// Inclusive date range carrying a regime label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeRange {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub regime_name: String,
}

impl RegimeRange {
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// Sorted, non-overlapping regime ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegimeCalendar {
    ranges: Vec<RegimeRange>,
}

impl RegimeCalendar {
    /// Validate and wrap regime ranges.
    ///
    /// The upstream table must already be sorted; each range must start
    /// strictly after the previous one ends.
    pub fn new(ranges: Vec<RegimeRange>) -> Result<Self, ValidationError> {
        for (i, r) in ranges.iter().enumerate() {
            if r.regime_name.trim().is_empty() {
                return Err(ValidationError::UnnamedRegime(r.start_date));
            }
            if r.end_date < r.start_date {
                return Err(ValidationError::InvertedRegime {
                    name: r.regime_name.clone(),
                    start: r.start_date,
                    end: r.end_date,
                });
            }
            if i > 0 {
                let prev = &ranges[i - 1];
                if r.start_date <= prev.end_date {
                    return Err(ValidationError::OverlappingRegime {
                        name: r.regime_name.clone(),
                        start: r.start_date,
                        previous_end: prev.end_date,
                    });
                }
            }
        }
        Ok(Self { ranges })
    }

    pub fn empty() -> Self {
        Self { ranges: Vec::new() }
    }

    pub fn ranges(&self) -> &[RegimeRange] {
        &self.ranges
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// The range containing `date`, if any.
    pub fn range_for(&self, date: NaiveDate) -> Option<&RegimeRange> {
        // Last range starting on or before the date is the only candidate.
        let idx = self.ranges.partition_point(|r| r.start_date <= date);
        if idx == 0 {
            return None;
        }
        let candidate = &self.ranges[idx - 1];
        candidate.contains(date).then_some(candidate)
    }

    /// Regime label for `date`, or [`UNKNOWN_REGIME`].
    pub fn resolve(&self, date: NaiveDate) -> &str {
        self.range_for(date)
            .map(|r| r.regime_name.as_str())
            .unwrap_or(UNKNOWN_REGIME)
    }

    /// Distinct regime names in first-appearance order.
    pub fn names(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        for r in &self.ranges {
            if !out.contains(&r.regime_name.as_str()) {
                out.push(r.regime_name.as_str());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(start: &str, end: &str, name: &str) -> RegimeRange {
        RegimeRange {
            start_date: d(start),
            end_date: d(end),
            regime_name: name.into(),
        }
    }

    #[test]
    fn resolves_inclusive_bounds_and_gaps() {
        let cal = RegimeCalendar::new(vec![
            range("2020-01-01", "2020-06-30", "slowdown"),
            range("2020-08-01", "2021-12-31", "expansion"),
        ])
        .unwrap();
        assert_eq!(cal.resolve(d("2020-01-01")), "slowdown");
        assert_eq!(cal.resolve(d("2020-06-30")), "slowdown");
        assert_eq!(cal.resolve(d("2020-07-15")), UNKNOWN_REGIME);
        assert_eq!(cal.resolve(d("2021-12-31")), "expansion");
        assert_eq!(cal.resolve(d("2019-12-31")), UNKNOWN_REGIME);
        assert_eq!(cal.resolve(d("2022-01-01")), UNKNOWN_REGIME);
    }

    #[test]
    fn empty_calendar_is_unknown_everywhere() {
        assert_eq!(RegimeCalendar::empty().resolve(d("2024-01-01")), UNKNOWN_REGIME);
    }

    #[test]
    fn overlapping_ranges_rejected() {
        let err = RegimeCalendar::new(vec![
            range("2020-01-01", "2020-06-30", "a"),
            range("2020-06-30", "2020-12-31", "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, ValidationError::OverlappingRegime { .. }));
    }

    #[test]
    fn unsorted_ranges_rejected() {
        let err = RegimeCalendar::new(vec![
            range("2021-01-01", "2021-06-30", "a"),
            range("2020-01-01", "2020-06-30", "b"),
        ])
        .unwrap_err();
        assert!(matches!(err, ValidationError::OverlappingRegime { .. }));
    }

    #[test]
    fn inverted_range_rejected() {
        let err = RegimeCalendar::new(vec![range("2021-01-01", "2020-06-30", "a")]).unwrap_err();
        assert!(matches!(err, ValidationError::InvertedRegime { .. }));
    }

    #[test]
    fn names_are_distinct_in_order() {
        let cal = RegimeCalendar::new(vec![
            range("2020-01-01", "2020-06-30", "slowdown"),
            range("2020-07-01", "2020-12-31", "expansion"),
            range("2021-01-01", "2021-06-30", "slowdown"),
        ])
        .unwrap();
        assert_eq!(cal.names(), vec!["slowdown", "expansion"]);
    }
}
