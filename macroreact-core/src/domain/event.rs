//! Event — one scheduled macro announcement.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use super::ValidationError;

/// Unique event identifier as issued by the event calendar.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EventId(pub String);

impl EventId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dated announcement with its consensus and released values.
///
/// `expected_value` is null when no consensus was published; `actual_value`
/// is null for scheduled events that have not been released yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: EventId,
    pub event_name: String,
    pub event_type: String,
    pub event_date: NaiveDate,
    pub importance: String,
    pub expected_value: Option<f64>,
    pub actual_value: Option<f64>,
}

impl Event {
    /// `actual - expected`, undefined when either side is missing or non-finite.
    pub fn surprise(&self) -> Option<f64> {
        match (self.actual_value, self.expected_value) {
            (Some(a), Some(e)) if a.is_finite() && e.is_finite() => Some(a - e),
            _ => None,
        }
    }
}

/// Check the calendar-level invariants: unique ids, non-empty id and type.
pub fn validate_events(events: &[Event]) -> Result<(), ValidationError> {
    let mut seen = HashSet::with_capacity(events.len());
    for ev in events {
        if ev.event_id.0.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                event_id: ev.event_name.clone(),
                field: "event_id",
            });
        }
        if ev.event_type.trim().is_empty() {
            return Err(ValidationError::EmptyField {
                event_id: ev.event_id.0.clone(),
                field: "event_type",
            });
        }
        if !seen.insert(&ev.event_id) {
            return Err(ValidationError::DuplicateEventId(ev.event_id.0.clone()));
        }
    }
    Ok(())
}
