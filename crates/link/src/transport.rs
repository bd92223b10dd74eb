//! Byte transport underneath the link supervisor.
//!
//! [`LinkTransport`] is the seam between the supervisor loop and the
//! physical port. [`SerialTransport`] is the production implementation on
//! top of the `serialport` crate; tests substitute a scripted transport.

use std::io::{self, Read};
use std::time::Duration;

use serialport::{FlowControl, SerialPort};

use crate::error::LinkError;

/// Line rate of the sensor board.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Per-read timeout on the serial port.
const READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Upper bound on a buffered partial line; anything longer is line noise.
const MAX_LINE_BYTES: usize = 4096;

/// A newline-delimited byte source that can be opened and closed repeatedly.
pub trait LinkTransport: Send {
    /// Open (or reopen) the underlying connection.
    fn open(&mut self) -> Result<(), LinkError>;

    /// Close the connection. Closing an already closed transport is a no-op.
    fn close(&mut self);

    /// Return the next complete line without its terminator, if one is
    /// available right now. Never waits for more input to arrive.
    fn poll_line(&mut self) -> Result<Option<Vec<u8>>, LinkError>;

    fn is_open(&self) -> bool;

    /// Human-readable name used in logs.
    fn name(&self) -> &str;
}

/// Serial port transport with an internal line buffer.
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
    buffer: Vec<u8>,
}

impl SerialTransport {
    pub fn new(path: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            path: path.into(),
            baud_rate,
            port: None,
            buffer: Vec::new(),
        }
    }
}

impl LinkTransport for SerialTransport {
    fn open(&mut self) -> Result<(), LinkError> {
        self.close();
        let port = serialport::new(&self.path, self.baud_rate)
            .timeout(READ_TIMEOUT)
            .flow_control(FlowControl::None)
            .open()
            .map_err(|e| LinkError::Open {
                port: self.path.clone(),
                reason: e.to_string(),
            })?;
        tracing::info!(port = %self.path, baud = self.baud_rate, "Serial port opened");
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        if self.port.take().is_some() {
            tracing::info!(port = %self.path, "Serial port closed");
        }
        self.buffer.clear();
    }

    fn poll_line(&mut self) -> Result<Option<Vec<u8>>, LinkError> {
        if let Some(line) = take_line(&mut self.buffer) {
            return Ok(Some(line));
        }

        let port = self.port.as_mut().ok_or(LinkError::NotOpen)?;
        let available = port.bytes_to_read()? as usize;
        if available == 0 {
            return Ok(None);
        }

        let mut chunk = vec![0u8; available.min(MAX_LINE_BYTES)];
        let read = match port.read(&mut chunk) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        self.buffer.extend_from_slice(&chunk[..read]);

        if let Some(line) = take_line(&mut self.buffer) {
            return Ok(Some(line));
        }
        if self.buffer.len() > MAX_LINE_BYTES {
            let dropped = self.buffer.len();
            self.buffer.clear();
            return Err(LinkError::Io(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("no line terminator within {dropped} bytes"),
            )));
        }
        Ok(None)
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn name(&self) -> &str {
        &self.path
    }
}

/// Split the first `\n`-terminated line off `buffer`, dropping the
/// terminator and any trailing `\r`.
pub(crate) fn take_line(buffer: &mut Vec<u8>) -> Option<Vec<u8>> {
    let pos = buffer.iter().position(|&b| b == b'\n')?;
    let mut line: Vec<u8> = buffer.drain(..=pos).collect();
    line.pop();
    if line.last() == Some(&b'\r') {
        line.pop();
    }
    Some(line)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn take_line_waits_for_terminator() {
        let mut buf = b"Temp: 25".to_vec();
        assert_eq!(take_line(&mut buf), None);
        assert_eq!(buf, b"Temp: 25");
    }

    #[test]
    fn take_line_strips_crlf_and_keeps_remainder() {
        let mut buf = b"first\r\nsecond\npart".to_vec();
        assert_eq!(take_line(&mut buf), Some(b"first".to_vec()));
        assert_eq!(take_line(&mut buf), Some(b"second".to_vec()));
        assert_eq!(take_line(&mut buf), None);
        assert_eq!(buf, b"part");
    }

    #[test]
    fn take_line_returns_empty_lines() {
        let mut buf = b"\n".to_vec();
        assert_eq!(take_line(&mut buf), Some(Vec::new()));
        assert!(buf.is_empty());
    }

    #[test]
    fn polling_closed_port_is_an_error() {
        let mut transport = SerialTransport::new("/dev/null-sensor", DEFAULT_BAUD_RATE);
        assert!(!transport.is_open());
        assert_matches!(transport.poll_line(), Err(LinkError::NotOpen));
    }

    #[test]
    fn opening_missing_device_reports_open_failure() {
        let mut transport = SerialTransport::new("/dev/does-not-exist-smartsense", DEFAULT_BAUD_RATE);
        assert_matches!(transport.open(), Err(LinkError::Open { port, .. }) if port == "/dev/does-not-exist-smartsense");
        assert!(!transport.is_open());
    }
}
