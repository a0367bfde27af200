mod commands;
mod config;
mod models;
mod nightscout;
mod refresh;
mod synthetic;
mod treatments;

#[cfg(test)]
mod test_utils;

use config::{DashboardConfig, DEFAULT_REFRESH_SECS};
use nightscout::NightscoutClient;
use refresh::{run_refresh_loop, Dashboard};
use std::time::Duration;
use tauri::Manager;

/// Build the dashboard from the environment. Bad or missing API settings
/// leave it offline on synthetic data instead of aborting startup.
fn dashboard_from_env() -> (Dashboard, Duration) {
  let config = match DashboardConfig::from_env() {
    Ok(config) => config,
    Err(e) => {
      log::error!("{}; showing synthetic data", e);
      return (
        Dashboard::offline(e.to_string()),
        Duration::from_secs(DEFAULT_REFRESH_SECS),
      );
    }
  };

  match NightscoutClient::new(&config.nightscout) {
    Ok(client) => {
      log::info!("Polling {} every {}s", config.nightscout.base_url, config.refresh_period.as_secs());
      (Dashboard::new(client), config.refresh_period)
    }
    Err(e) => {
      log::error!("Failed to create Nightscout client: {}; showing synthetic data", e);
      (Dashboard::offline(e.to_string()), config.refresh_period)
    }
  }
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();

  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

  tauri::Builder::default()
    .setup(|app| {
      let (dashboard, refresh_period) = dashboard_from_env();
      let app_handle = app.handle().clone();

      // Initial load blocks until both fetches are done, so the first
      // render already has data (live or synthetic)
      tauri::async_runtime::block_on(dashboard.refresh(&app_handle));

      app.manage(dashboard.clone());
      tauri::async_runtime::spawn(run_refresh_loop(dashboard, app_handle, refresh_period));

      log::info!("Dashboard ready");
      Ok(())
    })
    .invoke_handler(tauri::generate_handler![
      commands::dashboard::get_dashboard,
      commands::dashboard::get_current_glucose,
      commands::dashboard::refresh_dashboard,
    ])
    .run(tauri::generate_context!())
    .expect("error while running tauri application");
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
  use super::*;
  use crate::models::DataSource;
  use crate::test_utils::RecordingSink;
  use serial_test::serial;

  fn offline_reason(dashboard: &Dashboard) -> String {
    let sink = RecordingSink::default();
    let snapshot = tauri::async_runtime::block_on(dashboard.refresh(&sink)).unwrap();
    match snapshot.glucose_source {
      DataSource::Fallback { reason } => reason,
      other => panic!("expected fallback, got {:?}", other),
    }
  }

  #[test]
  #[serial]
  fn test_missing_url_starts_offline() {
    temp_env::with_vars(
      [
        ("NIGHTSCOUT_URL", None),
        ("NIGHTSCOUT_TOKEN", Some("reader-abc123")),
        ("GLUCOSE_REFRESH_SECS", None),
      ],
      || {
        let (dashboard, period) = dashboard_from_env();
        assert_eq!(period, Duration::from_secs(DEFAULT_REFRESH_SECS));
        assert!(offline_reason(&dashboard).contains("NIGHTSCOUT_URL"));
      },
    );
  }

  #[test]
  #[serial]
  fn test_malformed_url_starts_offline() {
    temp_env::with_vars(
      [
        ("NIGHTSCOUT_URL", Some("not a url")),
        ("NIGHTSCOUT_TOKEN", Some("reader-abc123")),
        ("GLUCOSE_REFRESH_SECS", Some("120")),
      ],
      || {
        let (dashboard, period) = dashboard_from_env();
        assert_eq!(period, Duration::from_secs(120));
        assert!(!offline_reason(&dashboard).contains("reader-abc123"));
      },
    );
  }
}
