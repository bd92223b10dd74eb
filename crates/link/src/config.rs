use std::time::Duration;

use crate::machine::DEFAULT_ERROR_THRESHOLD;
use crate::supervisor::{
    SupervisorConfig, DEFAULT_POLL_INTERVAL, DEFAULT_REOPEN_DELAY, DEFAULT_SETTLE_DELAY,
};
use crate::transport::DEFAULT_BAUD_RATE;

/// Value of `SERIAL_PORT` that turns the link off.
pub const PORT_DISABLED: &str = "none";

/// Which serial device the link should use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelection {
    /// Use this device path.
    Path(String),
    /// Probe the host's serial ports.
    Detect,
    /// Do not run a link.
    Disabled,
}

/// Serial link configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    pub port: PortSelection,
    pub baud_rate: u32,
    pub supervisor: SupervisorConfig,
}

impl LinkConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                 | Default       |
    /// |-------------------------|---------------|
    /// | `SERIAL_PORT`           | auto-detect   |
    /// | `SERIAL_BAUD`           | `115200`      |
    /// | `LINK_ERROR_THRESHOLD`  | `10`          |
    /// | `LINK_POLL_INTERVAL_MS` | `100`         |
    /// | `LINK_REOPEN_DELAY_MS`  | `2000`        |
    /// | `LINK_SETTLE_DELAY_MS`  | `2000`        |
    ///
    /// `SERIAL_PORT=none` disables the link.
    pub fn from_env() -> Self {
        let port = match std::env::var("SERIAL_PORT") {
            Ok(v) if v.trim().eq_ignore_ascii_case(PORT_DISABLED) => PortSelection::Disabled,
            Ok(v) if !v.trim().is_empty() => PortSelection::Path(v.trim().to_string()),
            _ => PortSelection::Detect,
        };

        let baud_rate: u32 = std::env::var("SERIAL_BAUD")
            .unwrap_or_else(|_| DEFAULT_BAUD_RATE.to_string())
            .parse()
            .expect("SERIAL_BAUD must be a valid u32");

        let error_threshold: u32 = std::env::var("LINK_ERROR_THRESHOLD")
            .unwrap_or_else(|_| DEFAULT_ERROR_THRESHOLD.to_string())
            .parse()
            .expect("LINK_ERROR_THRESHOLD must be a valid u32");

        let supervisor = SupervisorConfig {
            error_threshold,
            poll_interval: millis_from_env("LINK_POLL_INTERVAL_MS", DEFAULT_POLL_INTERVAL),
            reopen_delay: millis_from_env("LINK_REOPEN_DELAY_MS", DEFAULT_REOPEN_DELAY),
            settle_delay: millis_from_env("LINK_SETTLE_DELAY_MS", DEFAULT_SETTLE_DELAY),
        };

        Self {
            port,
            baud_rate,
            supervisor,
        }
    }
}

fn millis_from_env(var: &str, default: Duration) -> Duration {
    match std::env::var(var) {
        Ok(v) => Duration::from_millis(
            v.parse()
                .unwrap_or_else(|_| panic!("{var} must be a whole number of milliseconds")),
        ),
        Err(_) => default,
    }
}
