//! Sensor readings and the envelopes broadcast to observers.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

/// One structured sample from the sensor board.
///
/// Fields are private so a reading cannot change after it has been parsed
/// or deserialized. `gas_level` is unsigned, so a negative concentration is
/// rejected at the boundary instead of reaching the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    temperature: f64,
    humidity: f64,
    gas_level: u32,
}

impl Reading {
    pub fn new(temperature: f64, humidity: f64, gas_level: u32) -> Self {
        Self {
            temperature,
            humidity,
            gas_level,
        }
    }

    /// Temperature in degrees Celsius.
    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Relative humidity in percent.
    pub fn humidity(&self) -> f64 {
        self.humidity
    }

    /// Gas (smoke) concentration in ppm.
    pub fn gas_level(&self) -> u32 {
        self.gas_level
    }
}

/// Discrete safety classification of a reading, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SafetyTier {
    Safe,
    Warning,
    Danger,
}

impl SafetyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SafetyTier::Safe => "SAFE",
            SafetyTier::Warning => "WARNING",
            SafetyTier::Danger => "DANGER",
        }
    }
}

impl std::fmt::Display for SafetyTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified, timestamped reading ready for fan-out.
///
/// Serializes flat, matching the ingestion response shape:
///
/// ```json
/// {"temperature": 25.5, "humidity": 60.2, "gas_level": 250,
///  "status": "SAFE", "timestamp": "2026-01-01T00:00:00Z"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(flatten)]
    reading: Reading,
    #[serde(rename = "status")]
    tier: SafetyTier,
    #[serde(rename = "timestamp")]
    observed_at: Timestamp,
}

impl Envelope {
    pub fn new(reading: Reading, tier: SafetyTier, observed_at: Timestamp) -> Self {
        Self {
            reading,
            tier,
            observed_at,
        }
    }

    pub fn reading(&self) -> &Reading {
        &self.reading
    }

    pub fn tier(&self) -> SafetyTier {
        self.tier
    }

    pub fn observed_at(&self) -> Timestamp {
        self.observed_at
    }

    /// Encode as the JSON text frame sent to observers.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn tiers_are_ordered_by_severity() {
        assert!(SafetyTier::Safe < SafetyTier::Warning);
        assert!(SafetyTier::Warning < SafetyTier::Danger);
    }

    #[test]
    fn tier_serializes_uppercase() {
        assert_eq!(
            serde_json::to_value(SafetyTier::Warning).unwrap(),
            serde_json::json!("WARNING")
        );
        assert_eq!(SafetyTier::Danger.to_string(), "DANGER");
    }

    #[test]
    fn reading_rejects_negative_gas_level() {
        let result = serde_json::from_str::<Reading>(
            r#"{"temperature": 20.0, "humidity": 40.0, "gas_level": -5}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn envelope_serializes_flat_shape() {
        let observed_at = chrono::Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
        let envelope = Envelope::new(Reading::new(32.5, 65.0, 250), SafetyTier::Safe, observed_at);

        let json: serde_json::Value = serde_json::from_str(&envelope.to_json().unwrap()).unwrap();

        assert_eq!(json["temperature"], 32.5);
        assert_eq!(json["humidity"], 65.0);
        assert_eq!(json["gas_level"], 250);
        assert_eq!(json["status"], "SAFE");
        assert_eq!(json["timestamp"], "2026-03-01T12:00:00Z");
        assert_eq!(json.as_object().unwrap().len(), 5);
    }
}
