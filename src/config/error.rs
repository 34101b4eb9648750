//! Errors raised while loading, validating or saving `lightctl.toml`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    ReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed lightctl.toml: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("cannot encode configuration as TOML: {0}")]
    SerializeError(#[from] toml::ser::Error),

    #[error("cannot write {path}: {source}")]
    WriteError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value parsed but the port manager cannot run with it.
    #[error("{key}: {message}")]
    ValidationError { key: String, message: String },

    /// A `LIGHTCTL_*` override could not be parsed.
    #[error("{var}: {message}")]
    EnvParseError { var: String, message: String },

    /// `save` was called on a loader that was built from defaults only.
    #[error("configuration was not loaded from a file; use save_to")]
    NoFilePath,
}

impl ConfigError {
    pub fn validation(key: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn env_parse(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EnvParseError {
            var: var.into(),
            message: message.into(),
        }
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_key() {
        let err = ConfigError::validation("serial.receive_window_ms", "must be positive");
        assert_eq!(err.to_string(), "serial.receive_window_ms: must be positive");

        let err = ConfigError::env_parse("LIGHTCTL_SERIAL_PACING_MS", "Invalid pacing delay");
        assert_eq!(err.to_string(), "LIGHTCTL_SERIAL_PACING_MS: Invalid pacing delay");
    }
}
