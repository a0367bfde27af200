//! Treatment windowing and filtering
//!
//! Treatments are only worth drawing when they carry insulin or carbs and
//! fall inside the span covered by the glucose chart.

use chrono::{DateTime, Duration, Utc};

use crate::models::{GlucoseReading, TreatmentEvent};

/// Look-back used when there are no glucose readings to anchor the window
pub const DEFAULT_WINDOW_HOURS: i64 = 24;

/// Lower bound for treatments: the earliest reading, or 24h before `now`
pub fn treatment_window_start(readings: &[GlucoseReading], now: DateTime<Utc>) -> DateTime<Utc> {
  readings
    .iter()
    .map(|r| r.time)
    .min()
    .unwrap_or_else(|| now - Duration::hours(DEFAULT_WINDOW_HOURS))
}

/// Keep events with clinical content at or after `min_time`, in input order
pub fn filter_treatments(events: &[TreatmentEvent], min_time: DateTime<Utc>) -> Vec<TreatmentEvent> {
  events
    .iter()
    .filter(|e| e.has_clinical_content() && e.time >= min_time)
    .cloned()
    .collect()
}
