//! Configuration schema definitions.
//!
//! All sections default, so an empty file (or no file) is a valid configuration.

use crate::logging::{FileLogConfig, LogLevel};
use crate::manager::Timing;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Serial port configuration
    pub serial: SerialConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Serial port configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Baud rate used when a command does not give one
    pub default_baud: u32,
    /// Delay after every write and after every received byte
    pub pacing_ms: u64,
    /// Length of one receive polling window
    pub receive_window_ms: u64,
    /// OS-level timeout of a single read
    pub read_timeout_ms: u64,
    /// Sleep between empty read attempts
    pub idle_poll_ms: u64,
    /// Override for the port-name-to-device-path prefix
    pub device_prefix: Option<String>,
    /// Port aliases for convenience
    #[serde(default)]
    pub port_aliases: HashMap<String, String>,
}

impl Default for SerialConfig {
    fn default() -> Self {
        let timing = Timing::default();
        Self {
            default_baud: 9600,
            pacing_ms: timing.pacing.as_millis() as u64,
            receive_window_ms: timing.receive_window.as_millis() as u64,
            read_timeout_ms: timing.read_timeout.as_millis() as u64,
            idle_poll_ms: timing.idle_poll.as_millis() as u64,
            device_prefix: None,
            port_aliases: HashMap::new(),
        }
    }
}

impl SerialConfig {
    /// Timing knobs for the port manager.
    pub fn timing(&self) -> Timing {
        Timing {
            pacing: Duration::from_millis(self.pacing_ms),
            receive_window: Duration::from_millis(self.receive_window_ms),
            read_timeout: Duration::from_millis(self.read_timeout_ms),
            idle_poll: Duration::from_millis(self.idle_poll_ms),
        }
    }

    /// Resolve a port name through aliases
    pub fn resolve_port(&self, name: &str) -> String {
        self.port_aliases
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string())
    }
}

/// Logging configuration section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Directory for rotated log files; file logging is off when unset
    pub dir: Option<PathBuf>,
    /// Start a new file once the current one reaches this size
    pub max_file_size_bytes: u64,
    /// Delete log files older than this many days (0 keeps everything)
    pub retain_days: u32,
    /// Minimum level written
    pub level: LogLevel,
    /// Stderr format: "json", "pretty", "compact"
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: None,
            max_file_size_bytes: 10 * 1024 * 1024,
            retain_days: 30,
            level: LogLevel::Debug,
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// File sink settings, if a directory is configured.
    pub fn file_log(&self) -> Option<FileLogConfig> {
        self.dir.as_ref().map(|dir| FileLogConfig {
            dir: dir.clone(),
            max_file_size: self.max_file_size_bytes,
            retain_days: self.retain_days,
            level: self.level,
        })
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// JSON format
    Json,
    /// Pretty format with colors
    #[default]
    Pretty,
    /// Compact format
    Compact,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}
