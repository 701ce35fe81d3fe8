//! Return Window Builder: trading calendar, cumulative series, window lookups.

pub mod builder;
pub mod calendar;
pub mod cumulative;
pub mod window;

pub use builder::{build_windows, ReturnPanel, TickerWindows};
pub use calendar::TradingCalendar;
pub use cumulative::CumulativeSeries;
pub use window::{metric_value, metric_values, window_bounds};
