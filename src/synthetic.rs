//! Fallback glucose trace used when the live API cannot be reached
//!
//! The series is a visual stand-in only: a slow sine wave with uniform
//! jitter, clamped to a plausible band. It is not reproducible across calls.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use std::ops::Range;

use crate::models::GlucoseReading;

/// Number of points: six hours at five-minute spacing, both ends included
pub const SYNTHETIC_POINTS: usize = 73;
pub const SYNTHETIC_SPACING_MINUTES: i64 = 5;

pub const SYNTHETIC_MIN_MG_DL: i32 = 65;
pub const SYNTHETIC_MAX_MG_DL: i32 = 200;

const BASE_MG_DL: f64 = 110.0;
const AMPLITUDE_MG_DL: f64 = 30.0;
const WAVE_DIVISOR: f64 = 10.0;
const JITTER_MG_DL: Range<f64> = -30.0..-10.0;

/// Generate a synthetic trace ending at `now`
pub fn generate(now: DateTime<Utc>) -> Vec<GlucoseReading> {
  generate_with_rng(now, &mut rand::thread_rng())
}

pub fn generate_with_rng<R: Rng + ?Sized>(now: DateTime<Utc>, rng: &mut R) -> Vec<GlucoseReading> {
  let last = SYNTHETIC_POINTS as i64 - 1;

  (0..=last)
    .rev()
    .map(|i| {
      let time = now - Duration::minutes(i * SYNTHETIC_SPACING_MINUTES);
      let base = BASE_MG_DL + (i as f64 / WAVE_DIVISOR).sin() * AMPLITUDE_MG_DL;
      let value = (base + rng.gen_range(JITTER_MG_DL)).round() as i32;

      GlucoseReading {
        time,
        value: value.clamp(SYNTHETIC_MIN_MG_DL, SYNTHETIC_MAX_MG_DL),
        direction: None,
      }
    })
    .collect()
}
