use chrono::NaiveDate;
use thiserror::Error;

/// Contract violations in upstream input tables.
///
/// The engine fails fast on these instead of producing a plausible-looking
/// wrong answer.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("duplicate event_id '{0}'")]
    DuplicateEventId(String),

    #[error("event '{event_id}' has an empty {field}")]
    EmptyField { event_id: String, field: &'static str },

    #[error("prices for '{ticker}' are not strictly increasing at {date} (previous {previous})")]
    NonMonotonicPrices {
        ticker: String,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("price for '{ticker}' on {date} is not a positive finite number: {value}")]
    InvalidPrice {
        ticker: String,
        date: NaiveDate,
        value: f64,
    },

    #[error("ticker '{ticker}' is mapped to both '{first}' and '{second}'")]
    ConflictingSector {
        ticker: String,
        first: String,
        second: String,
    },

    #[error("sector '{sector}' has two benchmarks: '{first}' and '{second}'")]
    ConflictingBenchmark {
        sector: String,
        first: String,
        second: String,
    },

    #[error("regime '{name}' ends before it starts ({start} > {end})")]
    InvertedRegime {
        name: String,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("regime '{name}' starting {start} overlaps or precedes the previous range ending {previous_end}")]
    OverlappingRegime {
        name: String,
        start: NaiveDate,
        previous_end: NaiveDate,
    },

    #[error("regime starting {0} has an empty name")]
    UnnamedRegime(NaiveDate),
}
