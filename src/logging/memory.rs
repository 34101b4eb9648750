use super::{EventLog, LogLevel};
use parking_lot::Mutex;

/// One captured record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub module: String,
    pub message: String,
}

/// Keeps every record in memory. Intended for tests.
#[derive(Debug, Default)]
pub struct MemoryLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<LogRecord> {
        self.records.lock().clone()
    }

    /// Records at `level` whose message contains `needle`.
    pub fn matching(&self, level: LogLevel, needle: &str) -> Vec<LogRecord> {
        self.records
            .lock()
            .iter()
            .filter(|r| r.level == level && r.message.contains(needle))
            .cloned()
            .collect()
    }

    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        !self.matching(level, needle).is_empty()
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.records.lock().iter().filter(|r| r.level == level).count()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl EventLog for MemoryLog {
    fn log(&self, level: LogLevel, module: &str, message: &str) {
        self.records.lock().push(LogRecord {
            level,
            module: module.to_string(),
            message: message.to_string(),
        });
    }
}
