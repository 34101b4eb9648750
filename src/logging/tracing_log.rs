use super::{EventLog, LogLevel};
use tracing::{debug, error, info, warn};

/// Forwards records to the global `tracing` subscriber with a `module` field.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLog;

impl EventLog for TracingLog {
    fn log(&self, level: LogLevel, module: &str, message: &str) {
        match level {
            LogLevel::Debug => debug!(module = module, "{}", message),
            LogLevel::Info => info!(module = module, "{}", message),
            LogLevel::Warn => warn!(module = module, "{}", message),
            LogLevel::Error => error!(module = module, "{}", message),
        }
    }
}
