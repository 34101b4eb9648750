//! Dated, size-rotated log files.
//!
//! Files are named `YYYY-MM-DD_N.log`. A new index starts once the current
//! file reaches `max_file_size`; the index resets to 0 when the local date
//! changes. Files older than `retain_days` are deleted when the log is opened.

use super::{EventLog, LogLevel};
use chrono::{DateTime, Local};
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Settings for [`FileLog`].
#[derive(Debug, Clone)]
pub struct FileLogConfig {
    pub dir: PathBuf,
    pub max_file_size: u64,
    /// Zero keeps files forever.
    pub retain_days: u32,
    /// Records below this level are dropped.
    pub level: LogLevel,
}

#[derive(Debug)]
struct FileLogState {
    file: Option<File>,
    written: u64,
    date: String,
    index: u32,
}

#[derive(Debug)]
pub struct FileLog {
    config: FileLogConfig,
    state: Mutex<FileLogState>,
}

impl FileLog {
    /// Create the directory, purge expired files and open today's file.
    pub fn open(config: FileLogConfig) -> io::Result<Self> {
        fs::create_dir_all(&config.dir)?;
        purge_expired(&config.dir, config.retain_days, SystemTime::now())?;

        let log = Self {
            state: Mutex::new(FileLogState {
                file: None,
                written: 0,
                date: date_string(&Local::now()),
                index: 0,
            }),
            config,
        };
        {
            let mut state = log.state.lock();
            log.ensure_file(&mut state)?;
        }
        Ok(log)
    }

    pub fn config(&self) -> &FileLogConfig {
        &self.config
    }

    /// Path of the file the next record goes to.
    pub fn current_path(&self) -> PathBuf {
        let state = self.state.lock();
        self.file_path(&state.date, state.index)
    }

    fn file_path(&self, date: &str, index: u32) -> PathBuf {
        self.config.dir.join(format!("{date}_{index}.log"))
    }

    /// Zero means no size limit.
    fn size_limit(&self) -> u64 {
        match self.config.max_file_size {
            0 => u64::MAX,
            n => n,
        }
    }

    fn ensure_file(&self, state: &mut FileLogState) -> io::Result<()> {
        let limit = self.size_limit();
        if state.file.is_some() && state.written < limit {
            return Ok(());
        }
        if state.file.take().is_some() {
            state.index += 1;
        }
        // Skip indices already filled by an earlier run.
        loop {
            let path = self.file_path(&state.date, state.index);
            let len = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            if len < limit {
                state.file = Some(OpenOptions::new().create(true).append(true).open(&path)?);
                state.written = len;
                return Ok(());
            }
            state.index += 1;
        }
    }

    fn write_at(
        &self,
        now: DateTime<Local>,
        level: LogLevel,
        module: &str,
        message: &str,
    ) -> io::Result<()> {
        let mut state = self.state.lock();

        let today = date_string(&now);
        if today != state.date {
            state.file = None;
            state.date = today;
            state.index = 0;
        }
        self.ensure_file(&mut state)?;

        let line = format!(
            "[{}] [{}] [{}] {}\n",
            now.format("%Y-%m-%d %H:%M:%S%.3f"),
            level,
            module,
            message
        );
        if let Some(file) = state.file.as_mut() {
            file.write_all(line.as_bytes())?;
        }
        state.written += line.len() as u64;
        Ok(())
    }
}

impl EventLog for FileLog {
    fn log(&self, level: LogLevel, module: &str, message: &str) {
        if level < self.config.level {
            return;
        }
        if let Err(e) = self.write_at(Local::now(), level, module, message) {
            tracing::warn!(dir = %self.config.dir.display(), "log file write failed: {}", e);
        }
    }
}

fn date_string(now: &DateTime<Local>) -> String {
    now.format("%Y-%m-%d").to_string()
}

/// Delete `*.log` files in `dir` last modified more than `retain_days` before `now`.
fn purge_expired(dir: &Path, retain_days: u32, now: SystemTime) -> io::Result<usize> {
    if retain_days == 0 {
        return Ok(0);
    }
    let max_age = Duration::from_secs(u64::from(retain_days) * SECS_PER_DAY);
    let mut removed = 0;

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let meta = entry.metadata()?;
        if meta.is_dir() || path.extension().and_then(|e| e.to_str()) != Some("log") {
            continue;
        }
        let age = meta
            .modified()
            .ok()
            .and_then(|m| now.duration_since(m).ok())
            .unwrap_or_default();
        if age > max_age && fs::remove_file(&path).is_ok() {
            removed += 1;
        }
    }
    Ok(removed)
}
