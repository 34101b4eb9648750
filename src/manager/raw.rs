//! Integer/boolean facade for callers that work with plain handle values.
//!
//! Outcomes collapse to the sentinel contract: handles are positive, `-1`
//! means failure, a receive count of `0` means "nothing arrived".

use super::{PortHandle, PortManager, MODULE_TAG};
use crate::logging::LogLevel;

/// Returned instead of a handle or a byte count when a call fails.
pub const INVALID_HANDLE: i32 = -1;

impl PortManager {
    /// [`PortManager::open_port`] returning a positive handle or [`INVALID_HANDLE`].
    pub fn open_port_raw(&self, port_name: &str, baud_rate: i32) -> i32 {
        let Ok(baud_rate) = u32::try_from(baud_rate) else {
            self.log.log(
                LogLevel::Error,
                MODULE_TAG,
                &format!("Open fail {port_name} err=invalid baud rate {baud_rate}"),
            );
            return INVALID_HANDLE;
        };
        self.open_port(port_name, baud_rate)
            .map_or(INVALID_HANDLE, PortHandle::raw)
    }

    pub fn close_port_raw(&self, handle: i32) {
        if let Some(handle) = PortHandle::from_raw(handle) {
            self.close_port(handle);
        }
    }

    pub fn send_raw(&self, handle: i32, data: &[u8]) -> bool {
        PortHandle::from_raw(handle).is_some_and(|h| self.send(h, data).is_ok())
    }

    /// Byte count, `0` on timeout or device fault, [`INVALID_HANDLE`] when the
    /// handle is unknown or its port closed mid-poll.
    pub fn receive_raw(&self, handle: i32, out: &mut Vec<u8>) -> i32 {
        let Some(handle) = PortHandle::from_raw(handle) else {
            return INVALID_HANDLE;
        };
        match self.receive(handle, out) {
            Ok(n) => i32::try_from(n).unwrap_or(i32::MAX),
            Err(_) => INVALID_HANDLE,
        }
    }
}
