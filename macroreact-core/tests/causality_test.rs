//! Causality tests for the surprise normalizer.
//!
//! Invariant: the z-score of event i depends only on surprises released
//! strictly before i. Method: perturb every event after a cut point and
//! assert scores up to the cut are unchanged.

use chrono::NaiveDate;
use proptest::prelude::*;

use macroreact_core::config::SurpriseConfig;
use macroreact_core::domain::{Event, EventId};
use macroreact_core::normalize_surprises;

fn events(actuals: &[Option<f64>]) -> Vec<Event> {
    let base = NaiveDate::from_ymd_opt(2020, 1, 15).unwrap();
    actuals
        .iter()
        .enumerate()
        .map(|(i, &actual)| Event {
            event_id: EventId::new(format!("cpi-{i:03}")),
            event_name: "CPI YoY".into(),
            event_type: "CPI".into(),
            event_date: base + chrono::Duration::days(30 * i as i64),
            importance: "high".into(),
            expected_value: Some(2.0),
            actual_value: actual,
        })
        .collect()
}

fn arb_actuals() -> impl Strategy<Value = Vec<Option<f64>>> {
    prop::collection::vec(prop::option::weighted(0.9, -5.0..10.0_f64), 8..40)
}

proptest! {
    #[test]
    fn future_surprises_do_not_move_past_scores(
        actuals in arb_actuals(),
        cut_frac in 0.0..1.0_f64,
        shift in -50.0..50.0_f64,
    ) {
        let cfg = SurpriseConfig::default();
        let cut = ((actuals.len() - 1) as f64 * cut_frac) as usize;

        let baseline = normalize_surprises(&events(&actuals), &cfg);

        let perturbed_actuals: Vec<Option<f64>> = actuals
            .iter()
            .enumerate()
            .map(|(i, a)| if i > cut { a.map(|v| v + shift) } else { *a })
            .collect();
        let perturbed = normalize_surprises(&events(&perturbed_actuals), &cfg);

        for i in 0..=cut {
            prop_assert_eq!(baseline[i], perturbed[i], "score {} moved", i);
        }
    }

    #[test]
    fn current_surprise_does_not_enter_its_own_window(
        actuals in prop::collection::vec(-5.0..10.0_f64, 6..30),
        shift in 1.0..50.0_f64,
    ) {
        // Moving only the last surprise shifts its z by exactly shift / sd
        // of the (unchanged) history.
        let cfg = SurpriseConfig::default();
        let as_opt: Vec<Option<f64>> = actuals.iter().copied().map(Some).collect();
        let base = normalize_surprises(&events(&as_opt), &cfg);

        let mut moved = as_opt.clone();
        let last = moved.len() - 1;
        moved[last] = moved[last].map(|v| v + shift);
        let after = normalize_surprises(&events(&moved), &cfg);

        if let (Some(z0), Some(z1)) = (base[last].surprise_z, after[last].surprise_z) {
            let hist: Vec<f64> = actuals[..last].iter().rev().take(cfg.window).copied().collect();
            let m = hist.iter().sum::<f64>() / hist.len() as f64;
            let var = hist.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (hist.len() - 1) as f64;
            let expected = shift / var.sqrt();
            prop_assert!(((z1 - z0) - expected).abs() < 1e-6 * expected.abs().max(1.0));
        }
    }
}

#[test]
fn first_events_lack_history() {
    let actuals: Vec<Option<f64>> = [2.1, 1.8, 2.4, 2.0, 2.6].iter().copied().map(Some).collect();
    let scores = normalize_surprises(&events(&actuals), &SurpriseConfig::default());
    // min_periods = 3: the first three events have fewer prior surprises
    assert!(scores[..3].iter().all(|s| s.surprise_z.is_none()));
    assert!(scores[3].surprise_z.is_some());
    assert!(scores.iter().all(|s| s.surprise.is_some()));
}
