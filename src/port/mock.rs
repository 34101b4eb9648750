//! Mock serial port implementation for testing.
//!
//! Provides a `MockSerialPort` that simulates serial port behavior without
//! requiring actual hardware, and a `MockBackend` that hands mock ports out to
//! the registry by device path.

use super::error::PortError;
use super::traits::{PortBackend, PortConfiguration, SerialPortAdapter};
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Inner state of the mock port, shared by every clone.
#[derive(Debug, Default)]
struct MockPortState {
    /// Bytes to be returned by read operations, each with the instant it becomes readable.
    read_queue: VecDeque<(Instant, u8)>,
    /// Log of all payloads accepted by write operations.
    write_log: Vec<Vec<u8>>,
    /// When set, every accepted write is queued back for reading after this delay.
    echo_delay: Option<Duration>,
    /// How long each write call takes.
    write_latency: Duration,
    /// Maximum bytes a single write accepts.
    short_write: Option<usize>,
    /// Whether the next write fails with an I/O error.
    fail_next_write: bool,
    /// Device vanished: every read and write fails.
    disconnected: bool,
    /// Configured timeout duration.
    timeout: Duration,
    /// Adapters handed out by a backend that have not been dropped yet.
    open_handles: usize,
    /// Writes currently inside `write_bytes`.
    active_writers: usize,
    /// Highest value `active_writers` ever reached.
    max_concurrent_writers: usize,
    /// Baud rate requested by the last open.
    last_baud: Option<u32>,
}

/// Mock serial port implementation for testing.
///
/// Cloning gives a test-side view onto the same simulated device. Adapters
/// opened through [`MockBackend`] are "leases": they count towards
/// [`MockSerialPort::open_handles`] until dropped.
///
/// # Example
/// ```
/// use lightctl::port::{MockSerialPort, SerialPortAdapter};
///
/// let mut port = MockSerialPort::new("MOCK0");
/// port.enqueue_read(b"Hello");
///
/// let mut buffer = [0u8; 5];
/// let n = port.read_bytes(&mut buffer).unwrap();
/// assert_eq!(&buffer[..n], b"Hello");
///
/// port.write_bytes(b"Response").unwrap();
/// assert_eq!(port.get_write_log(), vec![b"Response".to_vec()]);
/// ```
pub struct MockSerialPort {
    /// The port name/identifier.
    name: String,
    /// The internal state, shared between clones.
    state: Arc<Mutex<MockPortState>>,
    /// Whether this instance was handed out by a backend.
    leased: bool,
}

impl MockSerialPort {
    /// Create a new mock serial port with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            state: Arc::new(Mutex::new(MockPortState {
                timeout: Duration::from_millis(20),
                ..Default::default()
            })),
            leased: false,
        }
    }

    /// Enqueue bytes that are readable immediately.
    pub fn enqueue_read(&mut self, data: &[u8]) {
        self.enqueue_read_after(data, Duration::ZERO);
    }

    /// Enqueue bytes that become readable after `delay`.
    pub fn enqueue_read_after(&mut self, data: &[u8], delay: Duration) {
        let at = Instant::now() + delay;
        let mut state = self.state.lock();
        state.read_queue.extend(data.iter().map(|&b| (at, b)));
    }

    /// Echo every accepted write back to the read side after `delay`.
    pub fn set_echo(&mut self, delay: Option<Duration>) {
        self.state.lock().echo_delay = delay;
    }

    /// Make every write call take `latency`.
    pub fn set_write_latency(&mut self, latency: Duration) {
        self.state.lock().write_latency = latency;
    }

    /// Accept at most `limit` bytes per write.
    pub fn set_short_write(&mut self, limit: Option<usize>) {
        self.state.lock().short_write = limit;
    }

    /// Fail the next write with an I/O error.
    pub fn fail_next_write(&mut self) {
        self.state.lock().fail_next_write = true;
    }

    /// Simulate the device disappearing.
    pub fn disconnect(&mut self) {
        self.state.lock().disconnected = true;
    }

    /// Get a copy of all payloads written to the port.
    pub fn get_write_log(&self) -> Vec<Vec<u8>> {
        self.state.lock().write_log.clone()
    }

    /// Number of queued bytes, readable now or later.
    pub fn available_bytes(&self) -> usize {
        self.state.lock().read_queue.len()
    }

    /// Adapters opened through a backend that are still alive.
    pub fn open_handles(&self) -> usize {
        self.state.lock().open_handles
    }

    /// Highest number of writes that were ever in progress at once.
    pub fn max_concurrent_writers(&self) -> usize {
        self.state.lock().max_concurrent_writers
    }

    /// Baud rate requested by the most recent open.
    pub fn last_baud(&self) -> Option<u32> {
        self.state.lock().last_baud
    }

    /// Current timeout.
    pub fn timeout(&self) -> Duration {
        self.state.lock().timeout
    }

    fn lease(&self) -> Self {
        self.state.lock().open_handles += 1;
        Self {
            name: self.name.clone(),
            state: Arc::clone(&self.state),
            leased: true,
        }
    }

    fn disconnected_error(&self) -> PortError {
        PortError::disconnected(&self.name)
    }
}

impl Clone for MockSerialPort {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            state: Arc::clone(&self.state),
            leased: false,
        }
    }
}

impl Drop for MockSerialPort {
    fn drop(&mut self) {
        if self.leased {
            let mut state = self.state.lock();
            state.open_handles = state.open_handles.saturating_sub(1);
        }
    }
}

impl SerialPortAdapter for MockSerialPort {
    fn write_bytes(&mut self, data: &[u8]) -> Result<usize, PortError> {
        let latency = {
            let mut state = self.state.lock();
            if state.disconnected {
                return Err(self.disconnected_error());
            }
            state.active_writers += 1;
            state.max_concurrent_writers = state.max_concurrent_writers.max(state.active_writers);
            state.write_latency
        };

        // The state lock is released while "on the wire" so overlapping writers are visible.
        if !latency.is_zero() {
            std::thread::sleep(latency);
        }

        let mut state = self.state.lock();
        state.active_writers -= 1;

        if std::mem::take(&mut state.fail_next_write) {
            return Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "simulated write failure",
            )));
        }

        let accepted = state.short_write.map_or(data.len(), |limit| limit.min(data.len()));
        let written = data[..accepted].to_vec();

        if let Some(delay) = state.echo_delay {
            let at = Instant::now() + delay;
            state.read_queue.extend(written.iter().map(|&b| (at, b)));
        }
        state.write_log.push(written);

        Ok(accepted)
    }

    fn read_bytes(&mut self, buffer: &mut [u8]) -> Result<usize, PortError> {
        let mut state = self.state.lock();

        if state.disconnected {
            return Err(self.disconnected_error());
        }

        let now = Instant::now();
        let mut bytes_read = 0;
        for byte in buffer.iter_mut() {
            match state.read_queue.front() {
                Some(&(at, queued)) if at <= now => {
                    *byte = queued;
                    state.read_queue.pop_front();
                    bytes_read += 1;
                }
                _ => break,
            }
        }

        if bytes_read == 0 {
            Err(PortError::Io(std::io::Error::new(
                std::io::ErrorKind::WouldBlock,
                "No data available",
            )))
        } else {
            Ok(bytes_read)
        }
    }

    fn set_timeout(&mut self, timeout: Duration) -> Result<(), PortError> {
        self.state.lock().timeout = timeout;
        Ok(())
    }

    fn try_clone_adapter(&self) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        if self.state.lock().disconnected {
            return Err(self.disconnected_error());
        }
        Ok(Box::new(self.lease()))
    }
}

impl std::fmt::Debug for MockSerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockSerialPort")
            .field("name", &self.name)
            .field("leased", &self.leased)
            .field("available_bytes", &self.available_bytes())
            .finish()
    }
}

/// Backend that opens registered [`MockSerialPort`]s by device path.
///
/// Paths that were never registered fail with [`PortError::NotFound`]; a port
/// that already has live leases fails like a busy device would.
#[derive(Debug, Clone, Default)]
pub struct MockBackend {
    ports: Arc<Mutex<HashMap<String, MockSerialPort>>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `port` openable at `path`, returning a test-side view of it.
    pub fn register(&self, path: impl Into<String>, port: MockSerialPort) -> MockSerialPort {
        let view = port.clone();
        self.ports.lock().insert(path.into(), port);
        view
    }

    /// Register a fresh mock port at `path`.
    pub fn add_port(&self, path: impl Into<String>) -> MockSerialPort {
        let path = path.into();
        let port = MockSerialPort::new(path.clone());
        self.register(path, port)
    }

    /// Test-side view of the port registered at `path`.
    pub fn port(&self, path: &str) -> Option<MockSerialPort> {
        self.ports.lock().get(path).cloned()
    }
}

impl PortBackend for MockBackend {
    fn open(
        &self,
        path: &str,
        config: &PortConfiguration,
    ) -> Result<Box<dyn SerialPortAdapter>, PortError> {
        let ports = self.ports.lock();
        let port = ports.get(path).ok_or_else(|| PortError::not_found(path))?;

        {
            let mut state = port.state.lock();
            if state.disconnected {
                return Err(PortError::not_found(path));
            }
            if state.open_handles > 0 {
                return Err(PortError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "Access is denied (port busy)",
                )));
            }
            state.timeout = config.timeout;
            state.last_baud = Some(config.baud_rate);
        }

        Ok(Box::new(port.lease()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enqueue_and_read() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"Hello");

        let mut buffer = [0u8; 10];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(n, 5);
        assert_eq!(&buffer[..n], b"Hello");
    }

    #[test]
    fn test_delayed_bytes_not_visible_early() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read_after(b"late", Duration::from_secs(60));

        let mut buffer = [0u8; 4];
        let err = port.read_bytes(&mut buffer).unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(port.available_bytes(), 4);
    }

    #[test]
    fn test_echo() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_echo(Some(Duration::ZERO));
        port.write_bytes(&[0x01, 0x02]).unwrap();

        let mut buffer = [0u8; 4];
        let n = port.read_bytes(&mut buffer).unwrap();
        assert_eq!(&buffer[..n], &[0x01, 0x02]);
    }

    #[test]
    fn test_short_write() {
        let mut port = MockSerialPort::new("MOCK0");
        port.set_short_write(Some(1));
        assert_eq!(port.write_bytes(&[1, 2, 3]).unwrap(), 1);
        assert_eq!(port.get_write_log(), vec![vec![1]]);
    }

    #[test]
    fn test_fail_next_write_is_one_shot() {
        let mut port = MockSerialPort::new("MOCK0");
        port.fail_next_write();
        assert!(port.write_bytes(b"x").is_err());
        assert_eq!(port.write_bytes(b"x").unwrap(), 1);
    }

    #[test]
    fn test_disconnect() {
        let mut port = MockSerialPort::new("MOCK0");
        port.enqueue_read(b"data");
        port.disconnect();

        let mut buffer = [0u8; 4];
        assert!(matches!(
            port.read_bytes(&mut buffer),
            Err(PortError::Disconnected(_))
        ));
        assert!(port.write_bytes(b"x").is_err());
    }

    #[test]
    fn test_set_timeout_is_shared_with_views() {
        let port = MockSerialPort::new("MOCK0");
        let mut lane = port.clone();
        lane.set_timeout(Duration::from_millis(7)).unwrap();
        assert_eq!(port.timeout(), Duration::from_millis(7));
    }

    #[test]
    fn test_backend_leases() {
        let backend = MockBackend::new();
        let view = backend.add_port("/dev/MOCK0");

        let config = PortConfiguration::eight_n_one(19_200, Duration::from_millis(20));
        let adapter = backend.open("/dev/MOCK0", &config).unwrap();
        let second = adapter.try_clone_adapter().unwrap();
        assert_eq!(view.open_handles(), 2);
        assert_eq!(view.last_baud(), Some(19_200));

        // Exclusive while leased.
        assert!(backend.open("/dev/MOCK0", &config).is_err());

        drop(adapter);
        drop(second);
        assert_eq!(view.open_handles(), 0);
        assert!(backend.open("/dev/MOCK0", &config).is_ok());
    }

    #[test]
    fn test_backend_unknown_path() {
        let backend = MockBackend::new();
        let err = backend
            .open("/dev/missing", &PortConfiguration::default())
            .unwrap_err();
        assert!(matches!(err, PortError::NotFound(_)));
    }
}
