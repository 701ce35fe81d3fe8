//! MacroReact Core — event study engine for sector reactions to macro surprises.
//!
//! This crate contains the analytical pipeline, from validated input tables
//! to estimator outputs:
//! - Domain types (events, prices, sector maps, regimes, reaction rows)
//! - Return windows on a union trading calendar, with benchmark adjustment
//! - Causal rolling z-scores of macro surprises
//! - Reaction matrix assembly and sector cycle momentum
//! - HC3 impact regressions with Benjamini–Hochberg correction
//! - Momentum-controlled partial regressions, surprise quantiles, focus views
//!
//! Nothing here touches the filesystem or the environment; all inputs arrive
//! as typed values plus one immutable [`AnalysisConfig`].

pub mod benchmark;
pub mod config;
pub mod cycle;
pub mod domain;
pub mod focus;
pub mod impact;
pub mod partial;
pub mod quantile;
pub mod reaction;
pub mod returns;
pub mod stats;
pub mod surprise;

pub use benchmark::BenchmarkAdjustment;
pub use config::{AnalysisConfig, ConfigError};
pub use cycle::{CycleRow, RegimeAverage, SectorCycle, SectorSource};
pub use focus::{focus_rankings, FocusRow, FocusView, RankType};
pub use impact::estimate_impact;
pub use partial::estimate_partial;
pub use quantile::{surprise_quantiles, QuantileRow};
pub use reaction::{assemble, AssemblyDiagnostics, AssemblyInputs, ReactionTable};
pub use returns::ReturnPanel;
pub use surprise::{normalize_surprises, SurpriseScore};

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: everything the runner moves across rayon workers
    /// is Send + Sync.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::Event>();
        require_sync::<domain::Event>();
        require_send::<domain::PriceSeries>();
        require_sync::<domain::PriceSeries>();
        require_send::<domain::SectorMap>();
        require_sync::<domain::SectorMap>();
        require_send::<domain::RegimeCalendar>();
        require_sync::<domain::RegimeCalendar>();
        require_send::<domain::ReactionRow>();
        require_sync::<domain::ReactionRow>();
        require_send::<domain::ImpactResult>();
        require_sync::<domain::ImpactResult>();
        require_send::<domain::PartialImpactResult>();
        require_sync::<domain::PartialImpactResult>();

        // Engine state
        require_send::<AnalysisConfig>();
        require_sync::<AnalysisConfig>();
        require_send::<BenchmarkAdjustment>();
        require_sync::<BenchmarkAdjustment>();
        require_send::<ReturnPanel>();
        require_sync::<ReturnPanel>();
        require_send::<SectorCycle>();
        require_sync::<SectorCycle>();
        require_send::<ReactionTable>();
        require_sync::<ReactionTable>();

        // Outputs
        require_send::<QuantileRow>();
        require_sync::<QuantileRow>();
        require_send::<FocusRow>();
        require_sync::<FocusRow>();
        require_send::<RegimeAverage>();
        require_sync::<RegimeAverage>();
    }

    /// Estimators read the reaction table only; they cannot see prices.
    #[test]
    fn estimators_take_only_the_reaction_table() {
        fn _check(table: &ReactionTable, config: &AnalysisConfig) {
            let _ = estimate_impact(table, config);
            let _ = estimate_partial(table, config);
            let _ = surprise_quantiles(table, config);
            let _ = focus_rankings(table, &config.focus);
        }
    }
}
