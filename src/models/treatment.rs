use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A logged insulin dose and/or carbohydrate intake
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreatmentEvent {
  pub time: DateTime<Utc>,
  pub insulin: f64, // units
  pub carbs: f64,   // grams
}

impl TreatmentEvent {
  pub fn has_clinical_content(&self) -> bool {
    self.insulin > 0.0 || self.carbs > 0.0
  }
}
