//! Safety tier classification for sensor readings.
//!
//! Pure logic: the thresholds are passed in by the caller, no state is kept
//! between calls.

use crate::error::CoreError;
use crate::reading::{Reading, SafetyTier};

/// Temperature above which a reading is `Danger` (°C).
pub const DANGER_TEMPERATURE_C: f64 = 45.0;

/// Temperature above which a reading is at least `Warning` (°C).
pub const WARNING_TEMPERATURE_C: f64 = 35.0;

/// Gas level above which a reading is at least `Warning` (ppm).
pub const WARNING_GAS_PPM: u32 = 300;

/// Danger gas threshold used by the ingestion server (ppm).
pub const DANGER_GAS_PPM_STRICT: u32 = 500;

/// Danger gas threshold shown on the dashboard gauges (ppm).
pub const DANGER_GAS_PPM_RELAXED: u32 = 1000;

/// Configurable classification thresholds.
///
/// No `Default`: both 500 and 1000 ppm are in use for the danger gas level
/// and every deployment has to pick one (see
/// [`DANGER_GAS_PPM_STRICT`] and [`DANGER_GAS_PPM_RELAXED`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    danger_gas_ppm: u32,
}

impl Thresholds {
    /// Build thresholds with the given danger gas level.
    ///
    /// The danger level must lie above [`WARNING_GAS_PPM`], otherwise the
    /// warning band would be empty.
    pub fn new(danger_gas_ppm: u32) -> Result<Self, CoreError> {
        if danger_gas_ppm <= WARNING_GAS_PPM {
            return Err(CoreError::Validation(format!(
                "danger gas threshold must be above {WARNING_GAS_PPM} ppm, got {danger_gas_ppm}"
            )));
        }
        Ok(Self { danger_gas_ppm })
    }

    pub fn danger_gas_ppm(&self) -> u32 {
        self.danger_gas_ppm
    }
}

/// Map a temperature and gas level to a safety tier.
///
/// Humidity plays no part. A NaN temperature compares false against every
/// bound, so the tier is then decided by the gas level alone.
pub fn classify(temperature: f64, gas_level: u32, thresholds: &Thresholds) -> SafetyTier {
    if temperature > DANGER_TEMPERATURE_C || gas_level > thresholds.danger_gas_ppm {
        SafetyTier::Danger
    } else if temperature > WARNING_TEMPERATURE_C || gas_level > WARNING_GAS_PPM {
        SafetyTier::Warning
    } else {
        SafetyTier::Safe
    }
}

/// Classify a whole reading.
pub fn classify_reading(reading: &Reading, thresholds: &Thresholds) -> SafetyTier {
    classify(reading.temperature(), reading.gas_level(), thresholds)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
