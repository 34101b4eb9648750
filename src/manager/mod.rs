//! Port registry and session manager.
//!
//! `PortManager` maps integer handles to open ports and lets any number of
//! threads open, close, send and receive concurrently.
//!
//! # Locking
//!
//! ```text
//! handle table (one Mutex, held only for insert/lookup/remove)
//!   └─ Arc<PortSession>
//!        ├─ tx lane Mutex ── write + pacing delay
//!        └─ rx lane Mutex ── polling loop, bounded by the receive window
//! ```
//!
//! Closing removes the table entry and clears the session's liveness flag.
//! Calls already holding the `Arc` finish against the still-open device (or
//! notice the flag and bail out); the OS handles are released when the last
//! reference drops.
//!
//! # Example
//! ```
//! use lightctl::logging::MemoryLog;
//! use lightctl::manager::PortManager;
//! use lightctl::port::MockBackend;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let backend = MockBackend::new();
//! let mut device = backend.add_port("/dev/COM7");
//! device.set_echo(Some(Duration::ZERO));
//!
//! let manager = PortManager::new(Arc::new(backend), Arc::new(MemoryLog::new()))
//!     .with_device_prefix("/dev/");
//! let handle = manager.open_port("COM7", 9600).unwrap();
//! manager.send(handle, &[0x01, 0x02]).unwrap();
//! manager.close_port(handle);
//! ```

mod error;
mod handle;
mod raw;
mod session;

pub use error::{ManagerError, ManagerResult};
pub use handle::{PortHandle, MAX_HANDLE};
pub use raw::INVALID_HANDLE;
pub use session::SessionInfo;

use crate::logging::{LogLevel, SharedLog, TracingLog};
use crate::port::{
    default_device_prefix, device_path, PortBackend, PortConfiguration, PortError, SystemBackend,
};
use handle::HandleAllocator;
use parking_lot::Mutex;
use session::PortSession;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Module tag attached to every record the registry logs.
pub const MODULE_TAG: &str = "SerialPort";

/// Timing knobs for the transmit and receive paths.
///
/// The defaults match the slow light-control controllers this crate was
/// written for; other devices may want different values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Sleep after every write attempt and after every received byte.
    pub pacing: Duration,
    /// Overall length of one receive call.
    pub receive_window: Duration,
    /// OS-level timeout of a single read.
    pub read_timeout: Duration,
    /// Sleep between read attempts that returned nothing.
    pub idle_poll: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            pacing: Duration::from_millis(10),
            receive_window: Duration::from_millis(20),
            read_timeout: Duration::from_millis(20),
            idle_poll: Duration::from_millis(1),
        }
    }
}

/// Registry of open ports keyed by [`PortHandle`].
pub struct PortManager {
    backend: Arc<dyn PortBackend>,
    log: SharedLog,
    timing: Timing,
    device_prefix: String,
    sessions: Mutex<BTreeMap<PortHandle, Arc<PortSession>>>,
    handles: HandleAllocator,
}

impl PortManager {
    pub fn new(backend: Arc<dyn PortBackend>, log: SharedLog) -> Self {
        Self {
            backend,
            log,
            timing: Timing::default(),
            device_prefix: default_device_prefix().to_string(),
            sessions: Mutex::new(BTreeMap::new()),
            handles: HandleAllocator::new(),
        }
    }

    /// Real devices, records sent to `tracing`.
    pub fn system() -> Self {
        Self::new(Arc::new(SystemBackend), Arc::new(TracingLog))
    }

    pub fn with_timing(mut self, timing: Timing) -> Self {
        self.timing = timing;
        self
    }

    pub fn with_device_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.device_prefix = prefix.into();
        self
    }

    pub fn timing(&self) -> Timing {
        self.timing
    }

    /// Open `port_name` at `baud_rate`, 8N1, and register it.
    ///
    /// On failure nothing is allocated and the platform error is logged.
    pub fn open_port(&self, port_name: &str, baud_rate: u32) -> ManagerResult<PortHandle> {
        let path = device_path(&self.device_prefix, port_name);
        let config = PortConfiguration::eight_n_one(baud_rate, self.timing.read_timeout);

        let open_failed = |source: PortError| {
            self.log.log(
                LogLevel::Error,
                MODULE_TAG,
                &format!("Open fail {port_name} err={source}"),
            );
            ManagerError::OpenFailed {
                port: port_name.to_string(),
                source,
            }
        };

        let tx = self.backend.open(&path, &config).map_err(open_failed)?;
        // The receive lane polls with its own short per-read timeout.
        let mut rx = tx.try_clone_adapter().map_err(open_failed)?;
        rx.set_timeout(self.timing.read_timeout).map_err(open_failed)?;

        let Some(handle) = self.handles.allocate() else {
            self.log.log(
                LogLevel::Error,
                MODULE_TAG,
                &format!("Open fail {port_name} err=handle space exhausted"),
            );
            return Err(ManagerError::HandlesExhausted);
        };

        let session = Arc::new(PortSession::new(handle, port_name, path, baud_rate, tx, rx));
        self.sessions.lock().insert(handle, session);

        self.log.log(
            LogLevel::Info,
            MODULE_TAG,
            &format!("Open ok {port_name} baud={baud_rate}"),
        );
        Ok(handle)
    }

    /// Close a port. Unknown or already-closed handles are ignored.
    ///
    /// Returns whether a port was actually closed. Never waits for in-flight
    /// calls on the same handle.
    pub fn close_port(&self, handle: PortHandle) -> bool {
        let Some(session) = self.sessions.lock().remove(&handle) else {
            return false;
        };

        session.mark_closed();
        self.log.log(
            LogLevel::Info,
            MODULE_TAG,
            &format!("Close {}", session.port_name),
        );
        true
    }

    /// Write the whole of `data` in one call, then wait one pacing interval.
    ///
    /// Succeeds only if the device accepted every byte. Concurrent senders on
    /// one handle are serialized; receivers are not affected.
    pub fn send(&self, handle: PortHandle, data: &[u8]) -> ManagerResult<()> {
        let session = self.lookup(handle)?;
        let mut tx = session.lock_tx();

        if !session.is_live() {
            return Err(ManagerError::SessionClosed(handle));
        }

        let result = tx.write_bytes(data);
        std::thread::sleep(self.timing.pacing);

        let reason = match result {
            Ok(n) if n == data.len() => {
                self.log.log_bytes(LogLevel::Debug, MODULE_TAG, "TX", data);
                return Ok(());
            }
            Ok(n) => format!("short write: {n} of {} bytes", data.len()),
            Err(e) => e.to_string(),
        };

        self.log.log(
            LogLevel::Error,
            MODULE_TAG,
            &format!(
                "Send fail {} HEX={} err={}",
                session.port_name,
                crate::hex::hex_dump(data),
                reason
            ),
        );
        Err(ManagerError::TransmitFailed {
            port: session.port_name.clone(),
            reason,
        })
    }

    /// Poll the device one byte at a time for one receive window.
    ///
    /// `out` is cleared first. Returns the number of bytes collected; `Ok(0)`
    /// means nothing arrived in time. A device fault is logged and ends the
    /// poll early but is still reported as a count. If the port is closed
    /// mid-poll the call fails with [`ManagerError::SessionClosed`] and `out`
    /// keeps whatever had arrived.
    pub fn receive(&self, handle: PortHandle, out: &mut Vec<u8>) -> ManagerResult<usize> {
        let session = self.lookup(handle)?;
        let mut rx = session.lock_rx();

        if !session.is_live() {
            return Err(ManagerError::SessionClosed(handle));
        }

        out.clear();
        let Timing {
            pacing,
            receive_window,
            idle_poll,
            ..
        } = self.timing;
        let start = Instant::now();
        let mut byte = [0u8; 1];

        while session.is_live() {
            let got_byte = match rx.read_bytes(&mut byte) {
                Ok(1) => {
                    out.push(byte[0]);
                    std::thread::sleep(pacing);
                    true
                }
                Ok(_) => false,
                Err(e) if e.is_timeout() => false,
                Err(e) => {
                    self.log.log(
                        LogLevel::Error,
                        MODULE_TAG,
                        &format!("Receive fail {} err={}", session.port_name, e),
                    );
                    break;
                }
            };

            let elapsed = start.elapsed();
            if elapsed > receive_window {
                break;
            }
            if !got_byte {
                std::thread::sleep(idle_poll.min(receive_window - elapsed));
            }
        }

        // Bytes taken off the wire are always logged, even if the port closed meanwhile.
        if !out.is_empty() {
            self.log.log_bytes(LogLevel::Debug, MODULE_TAG, "RX", out);
        }

        if !session.is_live() {
            self.log.log(
                LogLevel::Debug,
                MODULE_TAG,
                &format!("RX aborted {}: port closed", session.port_name),
            );
            return Err(ManagerError::SessionClosed(handle));
        }

        if out.is_empty() {
            self.log.log(
                LogLevel::Warn,
                MODULE_TAG,
                &format!("RX timeout {}", session.port_name),
            );
        }
        Ok(out.len())
    }

    /// Convenience wrapper around [`Self::receive`] returning a fresh buffer.
    pub fn receive_vec(&self, handle: PortHandle) -> ManagerResult<Vec<u8>> {
        let mut out = Vec::new();
        self.receive(handle, &mut out)?;
        Ok(out)
    }

    /// Drop every session without logging each one. Later calls on their
    /// handles fail as unknown.
    pub fn shutdown(&self) {
        let sessions = std::mem::take(&mut *self.sessions.lock());
        for session in sessions.values() {
            session.mark_closed();
        }
    }

    pub fn is_open(&self, handle: PortHandle) -> bool {
        self.sessions.lock().contains_key(&handle)
    }

    /// Open handles in allocation order.
    pub fn open_handles(&self) -> Vec<PortHandle> {
        self.sessions.lock().keys().copied().collect()
    }

    pub fn port_name(&self, handle: PortHandle) -> Option<String> {
        self.sessions.lock().get(&handle).map(|s| s.port_name.clone())
    }

    pub fn session_info(&self, handle: PortHandle) -> Option<SessionInfo> {
        self.sessions.lock().get(&handle).map(|s| s.info())
    }

    fn lookup(&self, handle: PortHandle) -> ManagerResult<Arc<PortSession>> {
        self.sessions
            .lock()
            .get(&handle)
            .cloned()
            .ok_or(ManagerError::UnknownHandle(handle))
    }
}

impl Drop for PortManager {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for PortManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortManager")
            .field("backend", &self.backend)
            .field("timing", &self.timing)
            .field("device_prefix", &self.device_prefix)
            .field("open_ports", &self.sessions.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemoryLog;
    use crate::port::{MockBackend, MockSerialPort};

    fn fast_timing() -> Timing {
        Timing {
            pacing: Duration::from_millis(1),
            receive_window: Duration::from_millis(20),
            read_timeout: Duration::from_millis(5),
            idle_poll: Duration::from_millis(1),
        }
    }

    fn setup(name: &str) -> (PortManager, MockSerialPort, Arc<MemoryLog>) {
        let backend = MockBackend::new();
        let device = backend.add_port(format!("/dev/{name}"));
        let log = Arc::new(MemoryLog::new());
        let manager = PortManager::new(Arc::new(backend), log.clone())
            .with_device_prefix("/dev/")
            .with_timing(fast_timing());
        (manager, device, log)
    }

    #[test]
    fn test_open_logs_and_configures() {
        let (manager, device, log) = setup("COM7");
        let handle = manager.open_port("COM7", 9600).unwrap();

        assert!(manager.is_open(handle));
        assert_eq!(device.last_baud(), Some(9600));
        assert_eq!(device.timeout(), Duration::from_millis(5));
        assert_eq!(device.open_handles(), 2);
        assert!(log.contains(LogLevel::Info, "Open ok COM7 baud=9600"));

        let info = manager.session_info(handle).unwrap();
        assert_eq!(info.device_path, "/dev/COM7");
        assert_eq!(info.baud_rate, 9600);
        assert_eq!(manager.port_name(handle).as_deref(), Some("COM7"));
    }

    #[test]
    fn test_open_failure_allocates_nothing() {
        let (manager, _device, log) = setup("COM7");
        let err = manager.open_port("COM9", 9600).unwrap_err();

        assert!(matches!(err, ManagerError::OpenFailed { .. }));
        assert!(manager.open_handles().is_empty());
        assert!(log.contains(LogLevel::Error, "Open fail COM9 err="));

        // The failed open did not consume a handle value.
        let handle = manager.open_port("COM7", 9600).unwrap();
        assert_eq!(handle.raw(), 1);
    }

    #[test]
    fn test_close_releases_device() {
        let (manager, device, log) = setup("COM7");
        let handle = manager.open_port("COM7", 9600).unwrap();

        assert!(manager.close_port(handle));
        assert!(!manager.close_port(handle));
        assert_eq!(device.open_handles(), 0);
        assert_eq!(log.matching(LogLevel::Info, "Close COM7").len(), 1);
    }

    #[test]
    fn test_send_success_logs_hex() {
        let (manager, device, log) = setup("COM7");
        let handle = manager.open_port("COM7", 9600).unwrap();

        manager.send(handle, &[0xaa, 0x55, 0x01]).unwrap();
        assert_eq!(device.get_write_log(), vec![vec![0xaa, 0x55, 0x01]]);
        assert!(log.contains(LogLevel::Debug, "TX LEN=3 HEX=aa 55 01"));
    }

    #[test]
    fn test_short_write_is_failure() {
        let (manager, mut device, log) = setup("COM7");
        let handle = manager.open_port("COM7", 9600).unwrap();
        device.set_short_write(Some(1));

        let err = manager.send(handle, &[0x01, 0x02]).unwrap_err();
        assert!(matches!(err, ManagerError::TransmitFailed { .. }));
        assert!(log.contains(
            LogLevel::Error,
            "Send fail COM7 HEX=01 02 err=short write: 1 of 2 bytes"
        ));
        assert!(!log.contains(LogLevel::Debug, "TX LEN"));
    }

    #[test]
    fn test_write_error_is_failure() {
        let (manager, mut device, log) = setup("COM7");
        let handle = manager.open_port("COM7", 9600).unwrap();
        device.fail_next_write();

        assert!(manager.send(handle, b"\x10").is_err());
        assert!(log.contains(LogLevel::Error, "simulated write failure"));
    }

    #[test]
    fn test_receive_collects_bytes() {
        let (manager, mut device, log) = setup("COM7");
        let handle = manager.open_port("COM7", 9600).unwrap();
        device.enqueue_read(&[0x10, 0x20]);

        let mut out = vec![0xff; 8];
        let n = manager.receive(handle, &mut out).unwrap();
        assert_eq!(n, 2);
        assert_eq!(out, vec![0x10, 0x20]);
        assert!(log.contains(LogLevel::Debug, "RX LEN=2 HEX=10 20"));
    }

    #[test]
    fn test_receive_timeout_returns_zero() {
        let (manager, _device, log) = setup("COM7");
        let handle = manager.open_port("COM7", 9600).unwrap();

        let start = Instant::now();
        let mut out = vec![1, 2, 3];
        assert_eq!(manager.receive(handle, &mut out).unwrap(), 0);
        assert!(out.is_empty());
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert!(start.elapsed() < Duration::from_millis(500));
        assert!(log.contains(LogLevel::Warn, "RX timeout COM7"));
    }

    #[test]
    fn test_receive_device_failure() {
        let (manager, mut device, log) = setup("COM7");
        let handle = manager.open_port("COM7", 9600).unwrap();
        device.disconnect();

        let mut out = vec![0xaa];
        assert_eq!(manager.receive(handle, &mut out).unwrap(), 0);
        assert!(out.is_empty());
        assert!(log.contains(LogLevel::Error, "Receive fail COM7 err=Device disconnected"));
        assert!(log.contains(LogLevel::Warn, "RX timeout COM7"));
        assert!(manager.is_open(handle));
    }

    #[test]
    fn test_unknown_handle_is_silent() {
        let (manager, _device, log) = setup("COM7");
        let bogus = PortHandle::from_raw(99).unwrap();

        assert!(matches!(manager.send(bogus, b"x"), Err(ManagerError::UnknownHandle(_))));
        assert!(matches!(manager.receive_vec(bogus), Err(ManagerError::UnknownHandle(_))));
        assert!(log.records().is_empty());
    }

    #[test]
    fn test_shutdown_releases_everything_quietly() {
        let backend = MockBackend::new();
        let a = backend.add_port("/dev/A");
        let b = backend.add_port("/dev/B");
        let log = Arc::new(MemoryLog::new());
        let manager = PortManager::new(Arc::new(backend), log.clone()).with_device_prefix("/dev/");

        let ha = manager.open_port("A", 9600).unwrap();
        let hb = manager.open_port("B", 115_200).unwrap();
        log.clear();

        manager.shutdown();
        assert_eq!(a.open_handles(), 0);
        assert_eq!(b.open_handles(), 0);
        assert!(!manager.is_open(ha));
        assert!(!manager.is_open(hb));
        assert_eq!(log.count(LogLevel::Info), 0);
    }

    #[test]
    fn test_drop_releases_devices() {
        let (manager, device, _log) = setup("COM7");
        let _handle = manager.open_port("COM7", 9600).unwrap();
        drop(manager);
        assert_eq!(device.open_handles(), 0);
    }
}
