//! Environment-backed configuration for the dashboard
//!
//! Values come from the process environment; `run()` loads a `.env` file
//! first so local development does not need exported variables.

use std::env;
use std::time::Duration;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const ENV_API_URL: &str = "NIGHTSCOUT_URL";
const ENV_API_TOKEN: &str = "NIGHTSCOUT_TOKEN";
const ENV_ENTRY_COUNT: &str = "NIGHTSCOUT_COUNT";
const ENV_REQUEST_TIMEOUT_SECS: &str = "NIGHTSCOUT_TIMEOUT_SECS";
const ENV_REFRESH_SECS: &str = "GLUCOSE_REFRESH_SECS";

pub const DEFAULT_ENTRY_COUNT: u32 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_REFRESH_SECS: u64 = 60;

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("Invalid value for {key}: {value}")]
  Invalid { key: String, value: String },
}

/// ---------------------------------------------------------------------------
/// Configuration Structures
/// ---------------------------------------------------------------------------

/// Connection settings for the Nightscout-style API
#[derive(Debug, Clone)]
pub struct NightscoutConfig {
  /// API root, e.g. `https://example.herokuapp.com/api/v1`
  pub base_url: String,
  pub token: String,
  /// Number of most-recent records requested from each endpoint
  pub count: u32,
  pub request_timeout: Duration,
}

impl NightscoutConfig {
  pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
    Self {
      base_url: base_url.into(),
      token: token.into(),
      count: DEFAULT_ENTRY_COUNT,
      request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
    }
  }

  pub fn from_env() -> Result<Self, ConfigError> {
    let base_url = env::var(ENV_API_URL)
      .map_err(|_| ConfigError::MissingConfig(ENV_API_URL.into()))?;
    let token = env::var(ENV_API_TOKEN)
      .map_err(|_| ConfigError::MissingConfig(ENV_API_TOKEN.into()))?;

    Ok(Self {
      count: positive_from_env(ENV_ENTRY_COUNT, DEFAULT_ENTRY_COUNT as u64)? as u32,
      request_timeout: Duration::from_secs(positive_from_env(
        ENV_REQUEST_TIMEOUT_SECS,
        DEFAULT_REQUEST_TIMEOUT_SECS,
      )?),
      ..Self::new(base_url, token)
    })
  }
}

#[derive(Debug, Clone)]
pub struct DashboardConfig {
  pub nightscout: NightscoutConfig,
  pub refresh_period: Duration,
}

impl DashboardConfig {
  pub fn from_env() -> Result<Self, ConfigError> {
    Ok(Self {
      nightscout: NightscoutConfig::from_env()?,
      refresh_period: Duration::from_secs(positive_from_env(ENV_REFRESH_SECS, DEFAULT_REFRESH_SECS)?),
    })
  }
}

/// Read an optional positive integer, falling back to `default` when unset
fn positive_from_env(key: &str, default: u64) -> Result<u64, ConfigError> {
  match env::var(key) {
    Err(_) => Ok(default),
    Ok(raw) => match raw.trim().parse::<u64>() {
      Ok(value) if value > 0 && value <= u32::MAX as u64 => Ok(value),
      _ => Err(ConfigError::Invalid {
        key: key.to_string(),
        value: raw,
      }),
    },
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
