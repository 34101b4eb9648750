//! Configuration module for lightctl.
//!
//! TOML-based configuration with environment variable overrides.
//!
//! # Configuration Resolution
//!
//! 1. `LIGHTCTL_CONFIG` environment variable (explicit path)
//! 2. `./lightctl.toml` (current directory)
//! 3. The platform config directory (via `directories`)
//! 4. Built-in defaults (no file required)
//!
//! # Environment Overrides
//!
//! The pattern is `LIGHTCTL_<SECTION>_<KEY>`:
//! - `LIGHTCTL_SERIAL_PACING_MS=5`
//! - `LIGHTCTL_SERIAL_RECEIVE_WINDOW_MS=50`
//! - `LIGHTCTL_LOGGING_DIR=/var/log/lightctl`
//!
//! # Example
//!
//! ```rust,no_run
//! use lightctl::config::ConfigLoader;
//!
//! let loader = ConfigLoader::load()?;
//! let timing = loader.config().serial.timing();
//! println!("pacing: {:?}", timing.pacing);
//! # Ok::<(), lightctl::config::ConfigError>(())
//! ```

mod error;
mod loader;
mod schema;

pub use error::{ConfigError, ConfigResult};
pub use loader::{
    get_default_config_dir, get_default_config_path, resolve_config_path, ConfigLoader,
};
pub use schema::{Config, LogFormat, LoggingConfig, SerialConfig};
