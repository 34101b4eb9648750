//! One open physical connection.

use crate::port::SerialPortAdapter;
use parking_lot::{Mutex, MutexGuard};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

use super::handle::PortHandle;

type Lane = Mutex<Box<dyn SerialPortAdapter>>;

/// A live port shared between the handle table and in-flight calls.
///
/// Transmit and receive each own a separate OS handle behind a separate lock,
/// so neither direction ever waits on the other. Both handles are released
/// when the last `Arc<PortSession>` is dropped.
#[derive(Debug)]
pub(crate) struct PortSession {
    pub(crate) handle: PortHandle,
    pub(crate) port_name: String,
    pub(crate) device_path: String,
    pub(crate) baud_rate: u32,
    live: AtomicBool,
    tx: Lane,
    rx: Lane,
}

impl PortSession {
    pub(crate) fn new(
        handle: PortHandle,
        port_name: &str,
        device_path: String,
        baud_rate: u32,
        tx: Box<dyn SerialPortAdapter>,
        rx: Box<dyn SerialPortAdapter>,
    ) -> Self {
        Self {
            handle,
            port_name: port_name.to_string(),
            device_path,
            baud_rate,
            live: AtomicBool::new(true),
            tx: Mutex::new(tx),
            rx: Mutex::new(rx),
        }
    }

    pub(crate) fn is_live(&self) -> bool {
        self.live.load(Ordering::Acquire)
    }

    /// Stop admitting work. Loops in flight see this at their next check.
    pub(crate) fn mark_closed(&self) {
        self.live.store(false, Ordering::Release);
    }

    pub(crate) fn lock_tx(&self) -> MutexGuard<'_, Box<dyn SerialPortAdapter>> {
        self.tx.lock()
    }

    pub(crate) fn lock_rx(&self) -> MutexGuard<'_, Box<dyn SerialPortAdapter>> {
        self.rx.lock()
    }

    pub(crate) fn info(&self) -> SessionInfo {
        SessionInfo {
            handle: self.handle,
            port_name: self.port_name.clone(),
            device_path: self.device_path.clone(),
            baud_rate: self.baud_rate,
        }
    }
}

/// Snapshot of an open session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub handle: PortHandle,
    pub port_name: String,
    pub device_path: String,
    pub baud_rate: u32,
}
