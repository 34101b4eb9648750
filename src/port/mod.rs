//! Port abstraction layer for serial communication.
//!
//! Provides the adapter and backend traits, the `serialport`-backed
//! implementation, and mocks used to drive the registry without hardware.

pub mod error;
pub mod mock;
pub mod path;
pub mod sync_port;
pub mod traits;

pub use error::PortError;
pub use mock::{MockBackend, MockSerialPort};
pub use path::{default_device_prefix, device_path};
pub use sync_port::{SyncSerialPort, SystemBackend};
pub use traits::*;
