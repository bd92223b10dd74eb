//! Text frame parser for lines received over the serial link.
//!
//! The sensor firmware has shipped with two print formats for the same three
//! fields. Each format is a [`FrameLayout`] in [`LAYOUTS`]; layouts are tried
//! in order and the first one whose pattern matches decides the result.

use std::sync::LazyLock;

use regex::Regex;

use crate::reading::Reading;

/// Informational markers the firmware prints between readings.
pub const STATUS_MARKERS: &[&str] = &["System Online", "Testing", "BUZZER"];

/// Error returned when a line is not a sensor reading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("line does not match any known frame layout")]
    NoMatch,
}

/// One accepted textual layout.
///
/// `pattern` must expose exactly three capture groups: temperature,
/// humidity and gas level, in that order.
#[derive(Debug)]
pub struct FrameLayout {
    pub name: &'static str,
    pub pattern: &'static str,
}

/// Accepted layouts, in matching order.
pub const LAYOUTS: &[FrameLayout] = &[
    // Temp: 25.5°C | Humidity: 60.2% | Smoke Level: 250
    FrameLayout {
        name: "decorated",
        pattern: r"Temp:\s*([\d.]+)°?C?\s*\|\s*Humidity:\s*([\d.]+)%?\s*\|\s*Smoke\s*Level:\s*(\d+)",
    },
    // Temp: 25.5| Humidity: 60.2C | Smoke: 250
    FrameLayout {
        name: "legacy",
        pattern: r"Temp:\s*([\d.]+)\|\s*Humidity:\s*([\d.]+)C\s*\|\s*Smoke:\s*(\d+)",
    },
];

static COMPILED: LazyLock<Vec<(&'static FrameLayout, Regex)>> = LazyLock::new(|| {
    LAYOUTS
        .iter()
        .map(|layout| (layout, Regex::new(layout.pattern).expect("valid regex")))
        .collect()
});

/// Parse one line into a [`Reading`].
///
/// A numeric conversion failure after a textual match is reported as
/// [`FrameError::NoMatch`] too: such a line is not a reading.
pub fn parse_line(line: &str) -> Result<Reading, FrameError> {
    let caps = COMPILED
        .iter()
        .find_map(|(_, re)| re.captures(line))
        .ok_or(FrameError::NoMatch)?;

    let temperature: f64 = caps[1].parse().map_err(|_| FrameError::NoMatch)?;
    let humidity: f64 = caps[2].parse().map_err(|_| FrameError::NoMatch)?;
    let gas_level: u32 = caps[3].parse().map_err(|_| FrameError::NoMatch)?;

    Ok(Reading::new(temperature, humidity, gas_level))
}

/// Name of the layout that textually matches `line`, if any.
#[cfg(test)]
fn matching_layout(line: &str) -> Option<&'static str> {
    COMPILED
        .iter()
        .find(|(_, re)| re.is_match(line))
        .map(|(layout, _)| layout.name)
}

/// Whether a non-reading line carries one of the firmware status markers.
pub fn is_status_line(line: &str) -> bool {
    STATUS_MARKERS.iter().any(|marker| line.contains(marker))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
