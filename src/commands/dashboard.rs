//! Tauri commands for reading and refreshing the dashboard

use tauri::{AppHandle, Runtime, State};

use crate::models::{CurrentGlucose, DashboardSnapshot};
use crate::refresh::Dashboard;

/// Latest snapshot (empty until the startup load has finished)
#[tauri::command]
pub async fn get_dashboard(dashboard: State<'_, Dashboard>) -> Result<DashboardSnapshot, String> {
  Ok(dashboard.snapshot().await)
}

/// Value and trend of the most recent reading
#[tauri::command]
pub async fn get_current_glucose(
  dashboard: State<'_, Dashboard>,
) -> Result<CurrentGlucose, String> {
  dashboard
    .snapshot()
    .await
    .current
    .ok_or_else(|| "No glucose readings loaded yet".to_string())
}

/// Run a refresh cycle now instead of waiting for the next tick.
/// Also emits the update event, so every open view redraws.
#[tauri::command]
pub async fn refresh_dashboard<R: Runtime>(
  app: AppHandle<R>,
  dashboard: State<'_, Dashboard>,
) -> Result<DashboardSnapshot, String> {
  dashboard
    .refresh(&app)
    .await
    .ok_or_else(|| "Refresh already in progress".to_string())
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
