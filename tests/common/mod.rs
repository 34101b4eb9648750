//! Shared test utilities for the port manager integration tests.
//!
//! - A harness wiring a `PortManager` to a `MockBackend` and a `MemoryLog`
//! - Timing presets
//! - Payload builders

#![allow(dead_code)]

use lightctl::logging::MemoryLog;
use lightctl::manager::{PortManager, Timing};
use lightctl::port::{MockBackend, MockSerialPort};
use std::sync::Arc;
use std::time::Duration;

/// Device prefix used by every harness; keeps paths identical on all platforms.
pub const PREFIX: &str = "/dev/";

/// Production defaults: 10ms pacing, 20ms receive window.
pub fn default_timing() -> Timing {
    Timing::default()
}

/// Short pacing with a wide receive window so data-carrying tests do not race
/// the scheduler.
pub fn roomy_timing() -> Timing {
    Timing {
        pacing: Duration::from_millis(2),
        receive_window: Duration::from_millis(150),
        read_timeout: Duration::from_millis(5),
        idle_poll: Duration::from_millis(1),
    }
}

/// Test harness with a manager, its mock backend and its captured log.
pub struct TestHarness {
    pub manager: Arc<PortManager>,
    pub backend: MockBackend,
    pub log: Arc<MemoryLog>,
}

impl TestHarness {
    pub fn new(timing: Timing) -> Self {
        let backend = MockBackend::new();
        let log = Arc::new(MemoryLog::new());
        let manager = PortManager::new(Arc::new(backend.clone()), log.clone())
            .with_device_prefix(PREFIX)
            .with_timing(timing);

        Self {
            manager: Arc::new(manager),
            backend,
            log,
        }
    }

    /// Register a mock device reachable under `port_name`.
    pub fn add_device(&self, port_name: &str) -> MockSerialPort {
        self.backend.add_port(format!("{PREFIX}{port_name}"))
    }
}

/// Payload where every byte carries the sender id, so interleaving is detectable.
pub fn tagged_payload(sender: u8, len: usize) -> Vec<u8> {
    vec![sender; len]
}
