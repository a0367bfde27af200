//! Dashboard state and the periodic refresh loop
//!
//! `Dashboard` owns the working glucose and treatment collections. Each
//! cycle fetches glucose first (the treatment window depends on it), then
//! treatments, replaces the snapshot wholesale and notifies the sink.
//! Cycles never overlap: a refresh requested while one is running is skipped.

use chrono::Utc;
use log::{info, warn};
use std::sync::Arc;
use std::time::Duration;
use tauri::{AppHandle, Emitter, Runtime};
use tokio::sync::{Mutex, RwLock};
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::models::{DashboardSnapshot, DataSource, GlucoseReading, TreatmentEvent};
use crate::nightscout::NightscoutClient;
use crate::synthetic;
use crate::treatments::treatment_window_start;

/// Event emitted to the webview after every completed cycle
pub const DASHBOARD_EVENT: &str = "dashboard-updated";

/// ---------------------------------------------------------------------------
/// Rendering Sink
/// ---------------------------------------------------------------------------

/// Receives each new snapshot; the webview redraws from it
pub trait DashboardSink: Send + Sync {
  fn publish(&self, snapshot: &DashboardSnapshot);
}

impl<R: Runtime> DashboardSink for AppHandle<R> {
  fn publish(&self, snapshot: &DashboardSnapshot) {
    if let Err(e) = self.emit(DASHBOARD_EVENT, snapshot) {
      warn!("Failed to emit {}: {}", DASHBOARD_EVENT, e);
    }
  }
}

/// ---------------------------------------------------------------------------
/// Dashboard Controller
/// ---------------------------------------------------------------------------

/// Where cycle data comes from
#[derive(Clone)]
enum Upstream {
  Api(NightscoutClient),
  /// No usable API configuration; every cycle takes the fallbacks
  Offline(String),
}

#[derive(Clone)]
pub struct Dashboard {
  upstream: Upstream,
  state: Arc<RwLock<DashboardSnapshot>>,
  cycle: Arc<Mutex<()>>,
}

impl Dashboard {
  pub fn new(client: NightscoutClient) -> Self {
    Self::with_upstream(Upstream::Api(client))
  }

  /// Dashboard that never contacts the API and always shows synthetic glucose
  pub fn offline(reason: impl Into<String>) -> Self {
    Self::with_upstream(Upstream::Offline(reason.into()))
  }

  fn with_upstream(upstream: Upstream) -> Self {
    Self {
      upstream,
      state: Arc::new(RwLock::new(DashboardSnapshot::empty())),
      cycle: Arc::new(Mutex::new(())),
    }
  }

  /// Latest published snapshot
  pub async fn snapshot(&self) -> DashboardSnapshot {
    self.state.read().await.clone()
  }

  /// Run one cycle and publish it. Returns `None` if a cycle is already running.
  pub async fn refresh<S: DashboardSink + ?Sized>(&self, sink: &S) -> Option<DashboardSnapshot> {
    let Ok(_cycle) = self.cycle.try_lock() else {
      warn!("Refresh already in progress, skipping");
      return None;
    };

    let (glucose, glucose_source, treatments, treatment_source) = self.fetch().await;

    let snapshot = DashboardSnapshot::new(
      glucose,
      glucose_source,
      treatments,
      treatment_source,
      Utc::now(),
    );

    *self.state.write().await = snapshot.clone();

    info!(
      "Dashboard refreshed: {} readings ({}), {} treatments ({})",
      snapshot.glucose.len(),
      if snapshot.glucose_source.is_live() { "live" } else { "synthetic" },
      snapshot.treatments.len(),
      if snapshot.treatment_source.is_live() { "live" } else { "unavailable" },
    );

    sink.publish(&snapshot);
    Some(snapshot)
  }

  async fn fetch(&self) -> (Vec<GlucoseReading>, DataSource, Vec<TreatmentEvent>, DataSource) {
    match &self.upstream {
      Upstream::Api(client) => {
        let (glucose, glucose_source) = client.fetch_glucose_readings().await.into_parts();

        let window_start = treatment_window_start(&glucose, Utc::now());
        let (treatments, treatment_source) =
          client.fetch_treatment_events(window_start).await.into_parts();

        (glucose, glucose_source, treatments, treatment_source)
      }
      Upstream::Offline(reason) => {
        warn!("Nightscout not configured ({}), using synthetic glucose data", reason);
        let source = DataSource::Fallback {
          reason: reason.clone(),
        };
        (synthetic::generate(Utc::now()), source.clone(), Vec::new(), source)
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Refresh Loop
/// ---------------------------------------------------------------------------

/// Refresh every `period`, forever. The first tick fires one period from now;
/// the startup load is expected to have run already.
///
/// Ticks are fixed-rate. A cycle that overruns its period causes the missed
/// ticks to be skipped rather than fired back to back.
pub async fn run_refresh_loop<S: DashboardSink>(dashboard: Dashboard, sink: S, period: Duration) {
  let mut ticker = time::interval_at(Instant::now() + period, period);
  ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

  info!("Refresh loop started ({}s period)", period.as_secs_f64());

  loop {
    ticker.tick().await;
    dashboard.refresh(&sink).await;
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
