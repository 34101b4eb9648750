//! Configuration loader with file resolution and environment override support.

use super::error::{ConfigError, ConfigResult};
use super::schema::Config;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable prefix for overrides
const ENV_PREFIX: &str = "LIGHTCTL";

/// Config file name
const CONFIG_FILE_NAME: &str = "lightctl.toml";

/// Environment variable for explicit config path
const CONFIG_PATH_ENV: &str = "LIGHTCTL_CONFIG";

/// Configuration loader with resolution and override logic.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Resolved config file path (if any)
    pub config_path: Option<PathBuf>,
    /// The loaded configuration
    pub config: Config,
}

impl ConfigLoader {
    /// Load configuration using standard resolution order.
    ///
    /// Resolution priority (highest to lowest):
    /// 1. `LIGHTCTL_CONFIG` environment variable (explicit path)
    /// 2. `./lightctl.toml` (current directory)
    /// 3. the platform config directory (`~/.config/lightctl/lightctl.toml`, `%APPDATA%\lightctl\config\lightctl.toml`)
    /// 4. Built-in defaults (no file required)
    ///
    /// Environment variables can override any config file values.
    pub fn load() -> ConfigResult<Self> {
        let config_path = resolve_config_path();

        let mut config = if let Some(ref path) = config_path {
            load_from_file(path)?
        } else {
            Config::default()
        };

        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self { config_path, config })
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref().to_path_buf();
        let mut config = load_from_file(&path)?;
        apply_env_overrides(&mut config)?;
        validate(&config)?;

        Ok(Self {
            config_path: Some(path),
            config,
        })
    }

    /// Create a loader with default configuration (no file).
    pub fn with_defaults() -> Self {
        let mut config = Config::default();
        // Still apply env overrides even with defaults
        if apply_env_overrides(&mut config).is_err() || validate(&config).is_err() {
            config = Config::default();
        }

        Self {
            config_path: None,
            config,
        }
    }

    /// Get the loaded configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Consume the loader and return the configuration.
    pub fn into_config(self) -> Config {
        self.config
    }

    /// Save the current configuration to file.
    pub fn save(&self) -> ConfigResult<()> {
        let path = self
            .config_path
            .as_ref()
            .ok_or(ConfigError::NoFilePath)?;

        save_to_file(&self.config, path)
    }

    /// Save the current configuration to a specific file.
    pub fn save_to(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        save_to_file(&self.config, path.as_ref())
    }
}

/// Resolve the configuration file path using standard locations.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from(CONFIG_FILE_NAME);
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    get_default_config_path().filter(|p| p.exists())
}

/// Platform config directory for this application.
pub fn get_default_config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "lightctl").map(|d| d.config_dir().to_path_buf())
}

/// Default config file path for creating new config files.
pub fn get_default_config_path() -> Option<PathBuf> {
    get_default_config_dir().map(|d| d.join(CONFIG_FILE_NAME))
}

fn load_from_file(path: &Path) -> ConfigResult<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(ConfigError::ParseError)
}

fn save_to_file(config: &Config, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Read `LIGHTCTL_<key>` and parse it, if set.
fn env_value<T: FromStr>(key: &str, what: &str) -> ConfigResult<Option<T>> {
    let var = format!("{ENV_PREFIX}_{key}");
    match std::env::var(&var) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::env_parse(var, format!("Invalid {what}"))),
        Err(_) => Ok(None),
    }
}

/// Apply environment variable overrides to the configuration.
///
/// Environment variables follow the pattern `LIGHTCTL_<SECTION>_<KEY>`, e.g.
/// `LIGHTCTL_SERIAL_PACING_MS=5` or `LIGHTCTL_LOGGING_DIR=/var/log/lightctl`.
fn apply_env_overrides(config: &mut Config) -> ConfigResult<()> {
    let serial = &mut config.serial;
    if let Some(v) = env_value("SERIAL_DEFAULT_BAUD", "baud rate")? {
        serial.default_baud = v;
    }
    if let Some(v) = env_value("SERIAL_PACING_MS", "pacing delay")? {
        serial.pacing_ms = v;
    }
    if let Some(v) = env_value("SERIAL_RECEIVE_WINDOW_MS", "receive window")? {
        serial.receive_window_ms = v;
    }
    if let Some(v) = env_value("SERIAL_READ_TIMEOUT_MS", "read timeout")? {
        serial.read_timeout_ms = v;
    }
    if let Some(v) = env_value("SERIAL_IDLE_POLL_MS", "idle poll interval")? {
        serial.idle_poll_ms = v;
    }
    if let Some(v) = env_value::<String>("SERIAL_DEVICE_PREFIX", "device prefix")? {
        serial.device_prefix = Some(v);
    }

    let logging = &mut config.logging;
    if let Some(v) = env_value::<PathBuf>("LOGGING_DIR", "log directory")? {
        logging.dir = Some(v);
    }
    if let Some(v) = env_value("LOGGING_LEVEL", "log level")? {
        logging.level = v;
    }
    if let Some(v) = env_value("LOGGING_RETAIN_DAYS", "retention")? {
        logging.retain_days = v;
    }
    if let Some(v) = env_value("LOGGING_MAX_FILE_SIZE_BYTES", "file size limit")? {
        logging.max_file_size_bytes = v;
    }
    if let Some(v) = env_value("LOGGING_FORMAT", "log format")? {
        logging.format = v;
    }

    Ok(())
}

/// Reject values the port manager cannot work with.
fn validate(config: &Config) -> ConfigResult<()> {
    if config.serial.default_baud == 0 {
        return Err(ConfigError::validation("serial.default_baud", "must be positive"));
    }
    if config.serial.receive_window_ms == 0 {
        return Err(ConfigError::validation(
            "serial.receive_window_ms",
            "must be positive",
        ));
    }
    if config.serial.read_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "serial.read_timeout_ms",
            "must be positive",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use crate::logging::LogLevel;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_default_loader() {
        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.default_baud, 9600);
        assert!(loader.config_path.is_none());
    }

    #[test]
    #[serial]
    fn test_env_override() {
        env::set_var("LIGHTCTL_SERIAL_PACING_MS", "3");
        env::set_var("LIGHTCTL_LOGGING_LEVEL", "error");

        let loader = ConfigLoader::with_defaults();
        assert_eq!(loader.config().serial.pacing_ms, 3);
        assert_eq!(loader.config().logging.level, LogLevel::Error);

        env::remove_var("LIGHTCTL_SERIAL_PACING_MS");
        env::remove_var("LIGHTCTL_LOGGING_LEVEL");
    }

    #[test]
    #[serial]
    fn test_env_override_poll_size_and_format() {
        env::set_var("LIGHTCTL_SERIAL_IDLE_POLL_MS", "4");
        env::set_var("LIGHTCTL_LOGGING_MAX_FILE_SIZE_BYTES", "4096");
        env::set_var("LIGHTCTL_LOGGING_FORMAT", "json");

        let config = ConfigLoader::with_defaults().into_config();
        assert_eq!(config.serial.idle_poll_ms, 4);
        assert_eq!(config.logging.max_file_size_bytes, 4096);
        assert_eq!(config.logging.format, LogFormat::Json);

        env::remove_var("LIGHTCTL_SERIAL_IDLE_POLL_MS");
        env::remove_var("LIGHTCTL_LOGGING_MAX_FILE_SIZE_BYTES");
        env::remove_var("LIGHTCTL_LOGGING_FORMAT");
    }

    #[test]
    #[serial]
    fn test_save_without_path_is_refused() {
        let loader = ConfigLoader::with_defaults();
        assert!(matches!(loader.save(), Err(ConfigError::NoFilePath)));
    }

    #[test]
    #[serial]
    fn test_bad_env_value_is_reported() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lightctl.toml");
        std::fs::write(&path, "").unwrap();

        env::set_var("LIGHTCTL_SERIAL_DEFAULT_BAUD", "fast");
        let err = ConfigLoader::load_from(&path).unwrap_err();
        env::remove_var("LIGHTCTL_SERIAL_DEFAULT_BAUD");

        assert!(matches!(err, ConfigError::EnvParseError { .. }));
    }

    #[test]
    #[serial]
    fn test_save_and_reload() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("lightctl.toml");

        let mut loader = ConfigLoader::with_defaults();
        loader.config.serial.receive_window_ms = 75;
        loader.save_to(&path).unwrap();

        let reloaded = ConfigLoader::load_from(&path).unwrap();
        assert_eq!(reloaded.config().serial.receive_window_ms, 75);
    }

    #[test]
    #[serial]
    fn test_validation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("lightctl.toml");
        std::fs::write(&path, "[serial]\nreceive_window_ms = 0\n").unwrap();

        let err = ConfigLoader::load_from(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError { .. }));
    }
}
