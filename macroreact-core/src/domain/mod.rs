//! Domain types for MacroReact

pub mod error;
pub mod event;
pub mod impact;
pub mod market;
pub mod price;
pub mod reaction;
pub mod regime;
pub mod sector;

pub use error::ValidationError;
pub use event::{Event, EventId};
pub use impact::{ImpactResult, PartialImpactResult, ReasonCode, Scope};
pub use market::Market;
pub use price::{PricePoint, PriceSeries};
pub use reaction::{CyclePoint, Metric, ReactionRecord, ReactionRow};
pub use regime::{RegimeCalendar, RegimeRange, UNKNOWN_REGIME};
pub use sector::SectorMap;
