//! Serial port discovery.
//!
//! Picks the sensor board among the host's serial ports by matching common
//! USB-serial bridge names, falling back to the first port found.

use serialport::{SerialPortInfo, SerialPortType};

/// Substrings identifying common microcontroller USB-serial bridges.
const BOARD_KEYWORDS: &[&str] = &["Arduino", "CH340", "CP210x", "FTDI", "USB"];

/// A serial port as seen by the detector: device path plus description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCandidate {
    pub name: String,
    pub description: String,
}

impl From<&SerialPortInfo> for PortCandidate {
    fn from(info: &SerialPortInfo) -> Self {
        let description = match &info.port_type {
            SerialPortType::UsbPort(usb) => {
                let parts: Vec<&str> = [usb.manufacturer.as_deref(), usb.product.as_deref()]
                    .into_iter()
                    .flatten()
                    .collect();
                if parts.is_empty() {
                    "USB".to_string()
                } else {
                    format!("USB {}", parts.join(" "))
                }
            }
            SerialPortType::BluetoothPort => "Bluetooth".to_string(),
            SerialPortType::PciPort => "PCI".to_string(),
            SerialPortType::Unknown => "Unknown".to_string(),
        };
        Self {
            name: info.port_name.clone(),
            description,
        }
    }
}

/// Choose the most likely sensor board port.
///
/// The first candidate whose description contains a board keyword
/// (case-insensitive) wins; otherwise the first candidate is returned.
pub fn pick_port(candidates: &[PortCandidate]) -> Option<&PortCandidate> {
    candidates
        .iter()
        .find(|c| {
            let description = c.description.to_lowercase();
            BOARD_KEYWORDS
                .iter()
                .any(|k| description.contains(&k.to_lowercase()))
        })
        .or_else(|| candidates.first())
}

/// Enumerate the host's serial ports and pick the sensor board.
pub fn detect_port() -> Option<String> {
    let ports = match serialport::available_ports() {
        Ok(ports) => ports,
        Err(e) => {
            tracing::error!(error = %e, "Failed to enumerate serial ports");
            return None;
        }
    };

    let candidates: Vec<PortCandidate> = ports.iter().map(PortCandidate::from).collect();
    if candidates.is_empty() {
        tracing::warn!("No serial ports found");
        return None;
    }
    for c in &candidates {
        tracing::debug!(port = %c.name, description = %c.description, "Serial port available");
    }

    let chosen = pick_port(&candidates)?;
    tracing::info!(port = %chosen.name, description = %chosen.description, "Selected serial port");
    Some(chosen.name.clone())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
