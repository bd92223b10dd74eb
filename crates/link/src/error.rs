/// Errors raised by the serial link and its transport.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The port could not be opened at all. Fatal to the supervisor run.
    #[error("Failed to open serial port {port}: {reason}")]
    Open { port: String, reason: String },

    /// A read on an open port failed.
    #[error("Serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The serial driver reported an error while querying the port.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// A received line was not valid UTF-8.
    #[error("Failed to decode line: {0}")]
    Decode(#[from] std::string::FromUtf8Error),

    /// A read was attempted while the port was closed.
    #[error("Serial port is not open")]
    NotOpen,
}

/// Errors raised while handing a reading to a [`ReadingSink`](crate::sink::ReadingSink).
#[derive(Debug, thiserror::Error)]
pub enum ForwardError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The server answered with a non-2xx status code.
    #[error("Backend returned HTTP {0}")]
    HttpStatus(u16),
}
