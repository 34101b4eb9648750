//! Registry-level errors.

use super::handle::PortHandle;
use crate::port::PortError;
use thiserror::Error;

/// Errors returned by [`super::PortManager`] operations.
///
/// A receive never fails because of the device: silence and read faults both
/// come back as a byte count, `Ok(0)` when nothing arrived.
#[derive(Debug, Error)]
pub enum ManagerError {
    /// The device could not be opened or configured.
    #[error("Failed to open {port}: {source}")]
    OpenFailed {
        port: String,
        #[source]
        source: PortError,
    },

    /// Every positive `i32` has already been handed out.
    #[error("Port handle space exhausted")]
    HandlesExhausted,

    /// The handle was never issued, or its port has been closed.
    #[error("Unknown port handle {0}")]
    UnknownHandle(PortHandle),

    /// The port was closed while the call was queued or in flight.
    #[error("Port {0} was closed")]
    SessionClosed(PortHandle),

    /// The write failed or was short.
    #[error("Transmit on {port} failed: {reason}")]
    TransmitFailed { port: String, reason: String },
}

impl ManagerError {
    /// True for outcomes that mean "this handle no longer names a usable port".
    pub fn is_invalid_handle(&self) -> bool {
        matches!(self, Self::UnknownHandle(_) | Self::SessionClosed(_))
    }
}

/// Result type for registry operations.
pub type ManagerResult<T> = Result<T, ManagerError>;
