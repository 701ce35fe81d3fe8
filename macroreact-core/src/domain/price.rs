//! Price series — adjusted closes for one ticker on its trading days.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::ValidationError;

/// One row of the upstream price table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub ticker: String,
    pub adj_close: f64,
}

/// Validated price history for a single ticker.
///
/// Dates are strictly increasing (no duplicates) and every price is a
/// positive finite number. Construction fails otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSeries {
    ticker: String,
    points: Vec<(NaiveDate, f64)>,
}

impl PriceSeries {
    pub fn new(
        ticker: impl Into<String>,
        points: Vec<(NaiveDate, f64)>,
    ) -> Result<Self, ValidationError> {
        let ticker = ticker.into();
        for (i, &(date, value)) in points.iter().enumerate() {
            if !value.is_finite() || value <= 0.0 {
                return Err(ValidationError::InvalidPrice {
                    ticker: ticker.clone(),
                    date,
                    value,
                });
            }
            if i > 0 {
                let previous = points[i - 1].0;
                if date <= previous {
                    return Err(ValidationError::NonMonotonicPrices {
                        ticker: ticker.clone(),
                        date,
                        previous,
                    });
                }
            }
        }
        Ok(Self { ticker, points })
    }

    /// Group long-format price rows into per-ticker series.
    ///
    /// Row order within a ticker is preserved, so an out-of-order or
    /// duplicated upstream table is reported rather than silently re-sorted.
    pub fn from_points(rows: &[PricePoint]) -> Result<Vec<PriceSeries>, ValidationError> {
        let mut grouped: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for row in rows {
            grouped
                .entry(row.ticker.as_str())
                .or_default()
                .push((row.date, row.adj_close));
        }
        grouped
            .into_iter()
            .map(|(ticker, points)| PriceSeries::new(ticker, points))
            .collect()
    }

    pub fn ticker(&self) -> &str {
        &self.ticker
    }

    pub fn points(&self) -> &[(NaiveDate, f64)] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.points.first().map(|p| p.0)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.points.last().map(|p| p.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn accepts_increasing_positive_series() {
        let s = PriceSeries::new("XLK", vec![(d("2024-01-02"), 100.0), (d("2024-01-03"), 101.0)]).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s.first_date(), Some(d("2024-01-02")));
    }

    #[test]
    fn rejects_duplicate_date() {
        let err = PriceSeries::new("XLK", vec![(d("2024-01-02"), 100.0), (d("2024-01-02"), 101.0)])
            .unwrap_err();
        assert!(matches!(err, ValidationError::NonMonotonicPrices { .. }));
    }

    #[test]
    fn rejects_non_positive_price() {
        let err = PriceSeries::new("XLK", vec![(d("2024-01-02"), 0.0)]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPrice { .. }));
        let err = PriceSeries::new("XLK", vec![(d("2024-01-02"), f64::NAN)]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidPrice { .. }));
    }

    #[test]
    fn from_points_groups_by_ticker_and_checks_order() {
        let rows = vec![
            PricePoint { date: d("2024-01-02"), ticker: "B".into(), adj_close: 10.0 },
            PricePoint { date: d("2024-01-02"), ticker: "A".into(), adj_close: 20.0 },
            PricePoint { date: d("2024-01-03"), ticker: "B".into(), adj_close: 11.0 },
        ];
        let series = PriceSeries::from_points(&rows).unwrap();
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].ticker(), "A");
        assert_eq!(series[1].len(), 2);

        let unsorted = vec![
            PricePoint { date: d("2024-01-03"), ticker: "A".into(), adj_close: 10.0 },
            PricePoint { date: d("2024-01-02"), ticker: "A".into(), adj_close: 11.0 },
        ];
        assert!(PriceSeries::from_points(&unsorted).is_err());
    }
}
