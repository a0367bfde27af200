//! Test utilities shared by the module tests
//!
//! - Time helpers
//! - Mock data factories
//! - Clients pointed at a mockito server or at a closed port
//! - A sink that records published snapshots

use chrono::{DateTime, Utc};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::NightscoutConfig;
use crate::models::{DashboardSnapshot, TreatmentEvent};
use crate::nightscout::NightscoutClient;
use crate::refresh::DashboardSink;

pub const TEST_TOKEN: &str = "reader-0123456789abcdef";

/// ---------------------------------------------------------------------------
/// Time Helpers
/// ---------------------------------------------------------------------------

/// Parse an RFC 3339 timestamp literal
pub fn at(rfc3339: &str) -> DateTime<Utc> {
  DateTime::parse_from_rfc3339(rfc3339)
    .expect("valid RFC 3339 timestamp")
    .with_timezone(&Utc)
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn mock_treatment(time: &str, insulin: f64, carbs: f64) -> TreatmentEvent {
  TreatmentEvent {
    time: at(time),
    insulin,
    carbs,
  }
}

/// ---------------------------------------------------------------------------
/// Clients
/// ---------------------------------------------------------------------------

/// Client whose API root is `/api/v1` on the given mockito server
pub fn mock_client(server: &mockito::ServerGuard) -> NightscoutClient {
  let mut config = NightscoutConfig::new(format!("{}/api/v1", server.url()), TEST_TOKEN);
  config.request_timeout = Duration::from_secs(5);
  NightscoutClient::new(&config).expect("Failed to build mock client")
}

/// Client pointed at a port nothing listens on
pub fn unreachable_client() -> NightscoutClient {
  let mut config = NightscoutConfig::new("http://127.0.0.1:1/api/v1", TEST_TOKEN);
  config.request_timeout = Duration::from_secs(2);
  NightscoutClient::new(&config).expect("Failed to build unreachable client")
}

/// ---------------------------------------------------------------------------
/// Recording Sink
/// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
pub struct RecordingSink {
  published: Arc<Mutex<Vec<DashboardSnapshot>>>,
}

impl RecordingSink {
  pub fn count(&self) -> usize {
    self.published.lock().expect("sink lock poisoned").len()
  }

  pub fn last(&self) -> Option<DashboardSnapshot> {
    self.published.lock().expect("sink lock poisoned").last().cloned()
  }
}

impl DashboardSink for RecordingSink {
  fn publish(&self, snapshot: &DashboardSnapshot) {
    self
      .published
      .lock()
      .expect("sink lock poisoned")
      .push(snapshot.clone());
  }
}

/// ---------------------------------------------------------------------------
/// Tests for Test Utilities
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_recording_sink_keeps_order() {
    let sink = RecordingSink::default();
    let first = DashboardSnapshot::empty();
    let mut second = DashboardSnapshot::empty();
    second.refreshed_at = Some(at("2024-01-01T10:00:00Z"));

    sink.publish(&first);
    sink.clone().publish(&second);

    assert_eq!(sink.count(), 2);
    assert_eq!(sink.last(), Some(second));
  }

  #[test]
  fn test_mock_treatment_factory() {
    let event = mock_treatment("2024-01-01T09:00:00Z", 2.5, 0.0);
    assert!(event.has_clinical_content());
    assert_eq!(event.time, at("2024-01-01T09:00:00Z"));
  }
}
