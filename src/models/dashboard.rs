use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{CurrentGlucose, GlucoseReading, TreatmentEvent};

/// Where a published collection came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
  /// Nothing fetched yet
  Pending,
  Live,
  Fallback { reason: String },
}

impl DataSource {
  pub fn is_live(&self) -> bool {
    matches!(self, DataSource::Live)
  }
}

/// Everything the dashboard renders after one refresh cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
  pub glucose: Vec<GlucoseReading>,
  pub treatments: Vec<TreatmentEvent>,
  pub current: Option<CurrentGlucose>,
  pub glucose_source: DataSource,
  pub treatment_source: DataSource,
  pub refreshed_at: Option<DateTime<Utc>>,
}

impl DashboardSnapshot {
  /// Snapshot held before the first cycle completes
  pub fn empty() -> Self {
    Self {
      glucose: Vec::new(),
      treatments: Vec::new(),
      current: None,
      glucose_source: DataSource::Pending,
      treatment_source: DataSource::Pending,
      refreshed_at: None,
    }
  }

  pub fn new(
    glucose: Vec<GlucoseReading>,
    glucose_source: DataSource,
    treatments: Vec<TreatmentEvent>,
    treatment_source: DataSource,
    refreshed_at: DateTime<Utc>,
  ) -> Self {
    Self {
      current: CurrentGlucose::from_readings(&glucose),
      glucose,
      treatments,
      glucose_source,
      treatment_source,
      refreshed_at: Some(refreshed_at),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::GlucoseRange;
  use chrono::TimeZone;

  #[test]
  fn test_empty_snapshot_has_no_current() {
    let snapshot = DashboardSnapshot::empty();
    assert!(snapshot.current.is_none());
    assert!(snapshot.refreshed_at.is_none());
    assert_eq!(snapshot.glucose_source, DataSource::Pending);
    assert_eq!(snapshot.treatment_source, DataSource::Pending);

    let json = serde_json::to_value(&snapshot).unwrap();
    assert_eq!(json["glucose_source"]["kind"], "pending");
  }

  #[test]
  fn test_new_snapshot_derives_current() {
    let now = Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap();
    let glucose = vec![GlucoseReading {
      time: now,
      value: 55,
      direction: Some("DoubleDown".into()),
    }];

    let snapshot = DashboardSnapshot::new(glucose, DataSource::Live, vec![], DataSource::Live, now);
    let current = snapshot.current.unwrap();
    assert_eq!(current.value, 55);
    assert_eq!(current.range, GlucoseRange::Low);
    assert_eq!(snapshot.refreshed_at, Some(now));
  }

  #[test]
  fn test_data_source_serializes_tagged() {
    let source = DataSource::Fallback {
      reason: "HTTP request failed".into(),
    };
    let json = serde_json::to_value(&source).unwrap();
    assert_eq!(json["kind"], "fallback");
    assert_eq!(json["reason"], "HTTP request failed");

    let live = serde_json::to_value(&DataSource::Live).unwrap();
    assert_eq!(live["kind"], "live");
  }
}
