//! Market trading calendar: the union of every ticker's price dates.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::config::T0Alignment;
use crate::domain::PriceSeries;

/// Sorted, deduplicated trading dates of one market.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TradingCalendar {
    dates: Vec<NaiveDate>,
}

impl TradingCalendar {
    pub fn from_series(series: &[PriceSeries]) -> Self {
        let set: BTreeSet<NaiveDate> = series
            .iter()
            .flat_map(|s| s.points().iter().map(|p| p.0))
            .collect();
        Self {
            dates: set.into_iter().collect(),
        }
    }

    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let set: BTreeSet<NaiveDate> = dates.into_iter().collect();
        Self {
            dates: set.into_iter().collect(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date(&self, idx: usize) -> Option<NaiveDate> {
        self.dates.get(idx).copied()
    }

    /// Index of an exact trading date.
    pub fn index_of(&self, date: NaiveDate) -> Option<usize> {
        self.dates.binary_search(&date).ok()
    }

    /// Map an announcement date onto the calendar.
    ///
    /// `None` when there is no trading day on the requested side (event after
    /// the last, or before the first, trading day).
    pub fn align(&self, date: NaiveDate, alignment: T0Alignment) -> Option<usize> {
        match alignment {
            T0Alignment::NextTradingDay => {
                let idx = self.dates.partition_point(|d| *d < date);
                (idx < self.dates.len()).then_some(idx)
            }
            T0Alignment::PreviousTradingDay => {
                self.dates.partition_point(|d| *d <= date).checked_sub(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn calendar() -> TradingCalendar {
        // Thu, Fri, Mon
        TradingCalendar::from_dates([d("2024-01-04"), d("2024-01-05"), d("2024-01-08")])
    }

    #[test]
    fn union_of_series_dates() {
        let a = PriceSeries::new("A", vec![(d("2024-01-02"), 1.0), (d("2024-01-04"), 1.0)]).unwrap();
        let b = PriceSeries::new("B", vec![(d("2024-01-03"), 1.0), (d("2024-01-04"), 1.0)]).unwrap();
        let cal = TradingCalendar::from_series(&[a, b]);
        assert_eq!(cal.dates(), &[d("2024-01-02"), d("2024-01-03"), d("2024-01-04")]);
    }

    #[test]
    fn weekend_snaps_forward_or_back() {
        let cal = calendar();
        assert_eq!(cal.align(d("2024-01-06"), T0Alignment::NextTradingDay), Some(2));
        assert_eq!(cal.align(d("2024-01-06"), T0Alignment::PreviousTradingDay), Some(1));
    }

    #[test]
    fn trading_day_maps_to_itself() {
        let cal = calendar();
        assert_eq!(cal.align(d("2024-01-05"), T0Alignment::NextTradingDay), Some(1));
        assert_eq!(cal.align(d("2024-01-05"), T0Alignment::PreviousTradingDay), Some(1));
    }

    #[test]
    fn out_of_range_has_no_t0() {
        let cal = calendar();
        assert_eq!(cal.align(d("2024-01-09"), T0Alignment::NextTradingDay), None);
        assert_eq!(cal.align(d("2024-01-01"), T0Alignment::PreviousTradingDay), None);
        assert_eq!(cal.align(d("2024-01-01"), T0Alignment::NextTradingDay), Some(0));
    }
}
