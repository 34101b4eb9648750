//! lightctl library
//!
//! Shares serial (COM-port style) links to light-control devices between
//! threads: a registry of integer handles, a paced transmit path and a bounded
//! byte-polling receive path, with every event written to a pluggable log sink.
//!
//! # Modules
//!
//! - `manager`: handle registry and per-port transmit/receive lanes
//! - `port`: adapter/backend traits, the `serialport` backend and mocks
//! - `logging`: event sinks (tracing, rotating files, in-memory)
//! - `config`: TOML configuration with environment overrides
//! - `hex`: hex dumps and hex parsing
//! - `error`: front-end error type

pub mod config;
pub mod error;
pub mod hex;
pub mod logging;
pub mod manager;
pub mod port;

// Re-export commonly used types for convenience
pub use error::{AppError, AppResult};
pub use logging::{EventLog, FileLog, LogLevel, MemoryLog, SharedLog, TracingLog};
pub use manager::{
    ManagerError, ManagerResult, PortHandle, PortManager, SessionInfo, Timing, INVALID_HANDLE,
    MODULE_TAG,
};
pub use port::{
    MockBackend, MockSerialPort, PortBackend, PortConfiguration, PortError, SerialPortAdapter,
    SystemBackend,
};
pub use config::{Config, ConfigError, ConfigLoader, ConfigResult};
