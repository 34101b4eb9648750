//! Event logging for port traffic and lifecycle.
//!
//! The registry reports every open, close, transmit, receive and failure through
//! an [`EventLog`]. Sinks never return errors and never panic; a sink that
//! cannot write simply drops the record.
//!
//! - [`TracingLog`] forwards to `tracing` (default)
//! - [`FileLog`] writes dated, size-rotated files with retention
//! - [`MemoryLog`] keeps records in memory for tests

mod file_log;
mod memory;
mod tracing_log;

pub use file_log::{FileLog, FileLogConfig};
pub use memory::{LogRecord, MemoryLog};
pub use tracing_log::TracingLog;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Record severity, ordered `Debug < Info < Warn < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" | "trace" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            other => Err(format!("unknown log level '{other}'")),
        }
    }
}

impl From<LogLevel> for tracing::Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Error => tracing::Level::ERROR,
        }
    }
}

/// Sink for leveled, module-tagged records.
pub trait EventLog: Send + Sync {
    fn log(&self, level: LogLevel, module: &str, message: &str);

    /// Log a byte buffer as `"{prefix} LEN={n} HEX={hex}"`.
    fn log_bytes(&self, level: LogLevel, module: &str, prefix: &str, data: &[u8]) {
        self.log(level, module, &format_bytes(prefix, data));
    }
}

/// Shared handle to a sink.
pub type SharedLog = Arc<dyn EventLog>;

/// Text produced by [`EventLog::log_bytes`].
pub fn format_bytes(prefix: &str, data: &[u8]) -> String {
    format!("{prefix} LEN={} HEX={}", data.len(), crate::hex::hex_dump(data))
}
