//! Surprise Normalizer — standardize `actual - expected` against the same
//! event type's own trailing history.
//!
//! Only releases strictly earlier in time feed the statistics for a release;
//! two releases of the same type on the same date never see each other.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::SurpriseConfig;
use crate::domain::Event;
use crate::stats::{mean, sample_std};

/// Whether the observation being scored is part of its own window.
///
/// Scoring always uses `Excluded`; `Included` exists so the difference is
/// an explicit, testable choice rather than an off-by-one in a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrentObservation {
    Excluded,
    Included,
}

/// Raw and standardized surprise of one event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SurpriseScore {
    pub surprise: Option<f64>,
    pub surprise_z: Option<f64>,
}

/// Rolling z-scores over a date-ordered sequence of optional values.
///
/// For each defined value, the window is the last `window` defined values
/// dated strictly before it (plus the value itself when `current` is
/// `Included`). Fewer than `min_periods` values, or a zero standard
/// deviation, yields `None`.
pub fn rolling_zscores(
    values: &[(NaiveDate, Option<f64>)],
    window: usize,
    min_periods: usize,
    current: CurrentObservation,
) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    // Defined values already "released", in order.
    let mut history: Vec<f64> = Vec::new();
    let mut i = 0;

    while i < values.len() {
        // Score the whole same-date block against history before publishing it.
        let date = values[i].0;
        let mut j = i;
        while j < values.len() && values[j].0 == date {
            j += 1;
        }

        for (slot, &(_, value)) in out[i..j].iter_mut().zip(&values[i..j]) {
            let Some(v) = value else { continue };
            let sample: Vec<f64> = match current {
                CurrentObservation::Excluded => {
                    history[history.len().saturating_sub(window)..].to_vec()
                }
                CurrentObservation::Included => {
                    let keep = window.saturating_sub(1);
                    let mut s = history[history.len().saturating_sub(keep)..].to_vec();
                    s.push(v);
                    s
                }
            };
            if sample.len() < min_periods {
                continue;
            }
            *slot = zscore(v, &sample);
        }

        history.extend(values[i..j].iter().filter_map(|(_, v)| *v));
        i = j;
    }
    out
}

fn zscore(value: f64, sample: &[f64]) -> Option<f64> {
    let m = mean(sample)?;
    let sd = sample_std(sample)?;
    // Identical values leave floating residue rather than an exact zero.
    if sd.is_nan() || sd <= 1e-12 * m.abs().max(1e-12) {
        return None;
    }
    Some((value - m) / sd)
}

/// Score every event, returning results aligned with `events`.
///
/// Each event type is processed independently in `(event_date, event_id)`
/// order; the window length comes from the type's release frequency when
/// configured.
pub fn normalize_surprises(events: &[Event], cfg: &SurpriseConfig) -> Vec<SurpriseScore> {
    let mut by_type: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (idx, ev) in events.iter().enumerate() {
        by_type.entry(ev.event_type.as_str()).or_default().push(idx);
    }

    let mut out: Vec<SurpriseScore> = events
        .iter()
        .map(|ev| SurpriseScore {
            surprise: ev.surprise(),
            surprise_z: None,
        })
        .collect();

    for (event_type, mut idxs) in by_type {
        idxs.sort_by(|&a, &b| {
            events[a]
                .event_date
                .cmp(&events[b].event_date)
                .then_with(|| events[a].event_id.cmp(&events[b].event_id))
        });
        let series: Vec<(NaiveDate, Option<f64>)> = idxs
            .iter()
            .map(|&i| (events[i].event_date, out[i].surprise))
            .collect();
        let z = rolling_zscores(
            &series,
            cfg.window_for(event_type),
            cfg.min_periods,
            CurrentObservation::Excluded,
        );
        for (&i, zi) in idxs.iter().zip(z) {
            out[i].surprise_z = zi;
        }
    }
    out
}
