//! Domain types and pure logic shared by the SmartSense crates.
//!
//! Nothing in here performs I/O: the frame parser, the classifier and the
//! reading/envelope types are all deterministic so both the serial link and
//! the HTTP server can depend on them.

pub mod classify;
pub mod error;
pub mod frame;
pub mod reading;
pub mod types;
