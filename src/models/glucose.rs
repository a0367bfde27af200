use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Trend value used when the API omits a direction
pub const DIRECTION_NONE: &str = "NONE";

/// Below this the reading is shown as low (mg/dL)
pub const LOW_THRESHOLD_MG_DL: i32 = 70;

/// Above this the reading is shown as high (mg/dL)
pub const HIGH_THRESHOLD_MG_DL: i32 = 180;

/// A single sensor glucose value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlucoseReading {
  pub time: DateTime<Utc>,
  pub value: i32, // mg/dL
  /// Sensor trend ("FlatUp", "DoubleDown", ...); synthetic readings leave it unset
  #[serde(skip_serializing_if = "Option::is_none", default)]
  pub direction: Option<String>,
}

impl GlucoseReading {
  pub fn direction_or_none(&self) -> &str {
    self.direction.as_deref().unwrap_or(DIRECTION_NONE)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GlucoseRange {
  Low,
  InRange,
  High,
}

impl GlucoseRange {
  pub fn classify(value: i32) -> Self {
    if value < LOW_THRESHOLD_MG_DL {
      GlucoseRange::Low
    } else if value > HIGH_THRESHOLD_MG_DL {
      GlucoseRange::High
    } else {
      GlucoseRange::InRange
    }
  }
}

/// Coarse arrow derived from the sensor direction string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
  Rising,
  Falling,
  Steady,
}

impl Trend {
  pub fn from_direction(direction: &str) -> Self {
    if direction.contains("Up") {
      Trend::Rising
    } else if direction.contains("Down") {
      Trend::Falling
    } else {
      Trend::Steady
    }
  }
}

/// Summary of the most recent reading, shown above the chart
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentGlucose {
  pub value: i32,
  pub trend: String,
  pub range: GlucoseRange,
  pub arrow: Trend,
}

impl CurrentGlucose {
  /// Build the summary from the last element of an ascending sequence
  pub fn from_readings(readings: &[GlucoseReading]) -> Option<Self> {
    readings.last().map(|latest| {
      let trend = latest.direction_or_none().to_string();
      Self {
        value: latest.value,
        range: GlucoseRange::classify(latest.value),
        arrow: Trend::from_direction(&trend),
        trend,
      }
    })
  }
}
