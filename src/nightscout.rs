//! Nightscout API client for glucose entries and treatments
//!
//! Two layers live here. `fetch_entries` / `fetch_treatments` are the plain
//! fallible calls. `fetch_glucose_readings` / `fetch_treatment_events` wrap
//! them and never fail: glucose falls back to the synthetic trace and
//! treatments fall back to an empty list, tagged so callers can tell.

use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use reqwest::header::ACCEPT;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use url::Url;

use crate::config::NightscoutConfig;
use crate::models::{DataSource, GlucoseReading, TreatmentEvent, DIRECTION_NONE};
use crate::synthetic;
use crate::treatments::filter_treatments;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const ENTRIES_PATH: &str = "entries.json";
const TREATMENTS_PATH: &str = "treatments";
const RAW_EXCERPT_CHARS: usize = 500;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NightscoutError {
  #[error("Invalid API URL: {0}")]
  InvalidUrl(String),

  #[error("HTTP request failed: {0}")]
  Request(reqwest::Error),

  #[error("API error {status}: {body}")]
  Status {
    status: reqwest::StatusCode,
    body: String,
  },

  #[error("Failed to parse response: {0}")]
  Parse(String),

  #[error("No usable glucose readings in response")]
  Empty,
}

// The request URL carries the API token, so it never goes into the message
impl From<reqwest::Error> for NightscoutError {
  fn from(e: reqwest::Error) -> Self {
    NightscoutError::Request(e.without_url())
  }
}

/// ---------------------------------------------------------------------------
/// Fetch Outcome
/// ---------------------------------------------------------------------------

/// Result of a never-fail fetch: real data, or a substitute plus the reason
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched<T> {
  Live(T),
  Fallback { data: T, reason: String },
}

impl<T> Fetched<T> {
  #[cfg(test)]
  pub fn data(&self) -> &T {
    match self {
      Fetched::Live(data) => data,
      Fetched::Fallback { data, .. } => data,
    }
  }

  #[cfg(test)]
  pub fn is_live(&self) -> bool {
    matches!(self, Fetched::Live(_))
  }

  pub fn into_parts(self) -> (T, DataSource) {
    match self {
      Fetched::Live(data) => (data, DataSource::Live),
      Fetched::Fallback { data, reason } => (data, DataSource::Fallback { reason }),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Nightscout API Data Structures
/// ---------------------------------------------------------------------------

/// Entry from `/entries.json`; fields are loose because record types vary
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawEntry {
  #[serde(default)]
  pub date: Option<Value>, // ISO string or epoch millis
  #[serde(rename = "dateString", default)]
  pub date_string: Option<Value>,
  #[serde(default)]
  pub sgv: Option<Value>,
  #[serde(default)]
  pub direction: Option<String>,
}

impl RawEntry {
  /// Convert to a reading; `None` for records without a time or a usable sgv
  pub fn into_reading(self) -> Option<GlucoseReading> {
    let time = self
      .date
      .as_ref()
      .and_then(parse_timestamp)
      .or_else(|| self.date_string.as_ref().and_then(parse_timestamp))?;

    let value = self.sgv.as_ref().and_then(parse_number)?;
    if !value.is_finite() || value < 0.0 {
      return None;
    }

    Some(GlucoseReading {
      time,
      value: value.round() as i32,
      direction: Some(self.direction.unwrap_or_else(|| DIRECTION_NONE.to_string())),
    })
  }
}

/// Treatment from `/treatments`; the timestamp field name depends on the uploader
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawTreatment {
  #[serde(default)]
  pub created_at: Option<Value>,
  #[serde(default)]
  pub timestamp: Option<Value>,
  #[serde(default)]
  pub date: Option<Value>,
  #[serde(default)]
  pub insulin: Option<Value>, // number or numeric string
  #[serde(default)]
  pub carbs: Option<Value>,
}

impl RawTreatment {
  /// Convert to an event; `None` when no timestamp is present or it does not parse
  pub fn into_event(self) -> Option<TreatmentEvent> {
    let raw_time = [&self.created_at, &self.timestamp, &self.date]
      .into_iter()
      .flatten()
      .find(|v| is_present(v))?;
    let time = parse_timestamp(raw_time)?;

    Some(TreatmentEvent {
      time,
      insulin: self.insulin.as_ref().map(parse_amount).unwrap_or(0.0),
      carbs: self.carbs.as_ref().map(parse_amount).unwrap_or(0.0),
    })
  }
}

/// ---------------------------------------------------------------------------
/// Normalization
/// ---------------------------------------------------------------------------

/// Map raw entries (newest first) into readings sorted oldest first
pub fn normalize_entries(raw: Vec<RawEntry>) -> Vec<GlucoseReading> {
  let total = raw.len();
  let mut readings: Vec<GlucoseReading> = raw.into_iter().filter_map(RawEntry::into_reading).collect();

  if readings.len() < total {
    debug!("Skipped {} glucose entries without time or sgv", total - readings.len());
  }

  readings.reverse();
  // Stable, so the reversed order survives for equal timestamps
  readings.sort_by_key(|r| r.time);
  readings
}

/// Map raw treatments into events, dropping records without a usable time
pub fn normalize_treatments(raw: Vec<RawTreatment>) -> Vec<TreatmentEvent> {
  let total = raw.len();
  let events: Vec<TreatmentEvent> = raw.into_iter().filter_map(RawTreatment::into_event).collect();

  if events.len() < total {
    debug!("Skipped {} treatments without a usable timestamp", total - events.len());
  }

  events
}

fn is_present(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::String(s) => !s.trim().is_empty(),
    Value::Number(n) => n.as_f64().map_or(false, |v| v != 0.0),
    Value::Bool(b) => *b,
    _ => true,
  }
}

/// Parse an ISO-8601 string or epoch milliseconds
pub fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
  match value {
    Value::Number(n) => n
      .as_i64()
      .or_else(|| n.as_f64().map(|f| f as i64))
      .and_then(DateTime::from_timestamp_millis),
    Value::String(s) => {
      let s = s.trim();
      if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
      }
      // Offsets written without a colon, e.g. "+0100"
      if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
      }
      if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(naive.and_utc());
      }
      s.parse::<i64>().ok().and_then(DateTime::from_timestamp_millis)
    }
    _ => None,
  }
}

fn parse_number(value: &Value) -> Option<f64> {
  match value {
    Value::Number(n) => n.as_f64(),
    Value::String(s) => leading_number(s),
    _ => None,
  }
}

/// Amount in units or grams; anything unparseable or non-positive is 0
pub fn parse_amount(value: &Value) -> f64 {
  parse_number(value)
    .filter(|v| v.is_finite() && *v > 0.0)
    .unwrap_or(0.0)
}

/// Longest numeric prefix of `s`, so "2.5U" reads as 2.5
fn leading_number(s: &str) -> Option<f64> {
  let s = s.trim_start();
  let end = s
    .char_indices()
    .take_while(|&(_, c)| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    .map(|(i, c)| i + c.len_utf8())
    .last()?;

  (1..=end).rev().find_map(|i| s[..i].parse::<f64>().ok())
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NightscoutClient {
  client: Client,
  base_url: String,
  token: String,
  count: u32,
}

impl NightscoutClient {
  pub fn new(config: &NightscoutConfig) -> Result<Self, NightscoutError> {
    let client = Client::builder().timeout(config.request_timeout).build()?;

    // Fail early on a malformed base rather than on every tick
    Url::parse(&config.base_url).map_err(|e| NightscoutError::InvalidUrl(e.to_string()))?;

    Ok(Self {
      client,
      base_url: config.base_url.trim_end_matches('/').to_string(),
      token: config.token.clone(),
      count: config.count,
    })
  }

  fn endpoint(&self, path: &str) -> Result<Url, NightscoutError> {
    let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
      .map_err(|e| NightscoutError::InvalidUrl(e.to_string()))?;

    url
      .query_pairs_mut()
      .append_pair("token", &self.token)
      .append_pair("count", &self.count.to_string());

    Ok(url)
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, NightscoutError> {
    let url = self.endpoint(path)?;

    let response = self
      .client
      .get(url)
      .header(ACCEPT, "application/json")
      .send()
      .await?;

    if !response.status().is_success() {
      let status = response.status();
      let body = response.text().await.unwrap_or_default();
      return Err(NightscoutError::Status { status, body });
    }

    let response_text = response.text().await?;

    serde_json::from_str(&response_text).map_err(|e| {
      debug!(
        "Raw {} response (first {} chars): {}",
        path,
        RAW_EXCERPT_CHARS,
        response_text.chars().take(RAW_EXCERPT_CHARS).collect::<String>()
      );
      NightscoutError::Parse(e.to_string())
    })
  }

  /// Fetch the most recent glucose entries, oldest first
  pub async fn fetch_entries(&self) -> Result<Vec<GlucoseReading>, NightscoutError> {
    let raw: Vec<RawEntry> = self.get_json(ENTRIES_PATH).await?;
    let readings = normalize_entries(raw);

    if readings.is_empty() {
      return Err(NightscoutError::Empty);
    }

    Ok(readings)
  }

  /// Fetch the most recent treatments, unfiltered and in API order
  pub async fn fetch_treatments(&self) -> Result<Vec<TreatmentEvent>, NightscoutError> {
    let raw: Vec<RawTreatment> = self.get_json(TREATMENTS_PATH).await?;
    Ok(normalize_treatments(raw))
  }

  /// Glucose readings for the chart; synthetic data if the API is unavailable
  pub async fn fetch_glucose_readings(&self) -> Fetched<Vec<GlucoseReading>> {
    match self.fetch_entries().await {
      Ok(readings) => Fetched::Live(readings),
      Err(e) => {
        warn!("Error fetching glucose data, using synthetic readings: {}", e);
        Fetched::Fallback {
          data: synthetic::generate(Utc::now()),
          reason: e.to_string(),
        }
      }
    }
  }

  /// Treatments at or after `window_start`, oldest first; empty if the API is unavailable
  pub async fn fetch_treatment_events(
    &self,
    window_start: DateTime<Utc>,
  ) -> Fetched<Vec<TreatmentEvent>> {
    match self.fetch_treatments().await {
      Ok(events) => {
        let mut kept = filter_treatments(&events, window_start);
        kept.sort_by_key(|e| e.time);
        Fetched::Live(kept)
      }
      Err(e) => {
        warn!("Error fetching treatment data: {}", e);
        Fetched::Fallback {
          data: Vec::new(),
          reason: e.to_string(),
        }
      }
    }
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
