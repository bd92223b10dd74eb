//! `smartsense-link` library crate.
//!
//! Serial link supervision: opens the sensor board's serial port, reads
//! newline-delimited frames, parses them and forwards readings to a
//! [`ReadingSink`](sink::ReadingSink). The binary entrypoint lives in
//! `main.rs`; the API server embeds the same supervisor in-process.

pub mod config;
pub mod error;
pub mod machine;
pub mod port;
pub mod signal;
pub mod sink;
pub mod supervisor;
pub mod transport;
