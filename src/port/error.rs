//! Port-specific error types.
//!
//! Transport failures are kept apart from registry-level errors so the manager
//! can decide which ones are "no data yet" and which ones are device faults.

use std::io::ErrorKind;
use thiserror::Error;

/// Errors that can occur during serial port operations.
#[derive(Debug, Error)]
pub enum PortError {
    /// The specified serial port was not found on the system.
    #[error("Serial port not found: {0}")]
    NotFound(String),

    /// An I/O error occurred during port operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Port configuration failed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The device went away while the port was open.
    #[error("Device disconnected: {0}")]
    Disconnected(String),

    /// A serialport-specific error occurred.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),
}

impl PortError {
    /// Create a NotFound error from a port name.
    pub fn not_found(port_name: impl Into<String>) -> Self {
        Self::NotFound(port_name.into())
    }

    /// Create a Config error from a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a Disconnected error from a port name.
    pub fn disconnected(port_name: impl Into<String>) -> Self {
        Self::Disconnected(port_name.into())
    }

    /// True when the error only means "nothing arrived before the read timeout".
    ///
    /// Real ports report `TimedOut`, non-blocking and mock ports report `WouldBlock`.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Io(e) => matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = PortError::not_found("/dev/ttyUSB0");
        assert_eq!(err.to_string(), "Serial port not found: /dev/ttyUSB0");

        let err = PortError::config("Invalid baud rate");
        assert_eq!(err.to_string(), "Configuration error: Invalid baud rate");

        let err = PortError::disconnected("COM7");
        assert_eq!(err.to_string(), "Device disconnected: COM7");
    }

    #[test]
    fn test_timeout_classification() {
        assert!(PortError::Io(std::io::Error::new(ErrorKind::TimedOut, "t")).is_timeout());
        assert!(PortError::Io(std::io::Error::new(ErrorKind::WouldBlock, "w")).is_timeout());
        assert!(!PortError::Io(std::io::Error::new(ErrorKind::BrokenPipe, "b")).is_timeout());
        assert!(!PortError::disconnected("COM7").is_timeout());
    }
}
