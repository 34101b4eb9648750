use thiserror::Error;

use crate::config::ConfigError;
use crate::hex::HexError;
use crate::manager::ManagerError;

/// Unified error type for the command-line front end.
///
/// Library callers work with the per-module errors directly; this type only
/// exists so `?` flows across module boundaries in the binary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manager(#[from] ManagerError),

    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] HexError),

    #[error("Serial port error: {0}")]
    SerialError(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),

    #[error("Failed to render configuration: {0}")]
    Toml(#[from] toml::ser::Error),
}

/// A specialized `Result` type for the command-line front end.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversions() {
        let err: AppError = HexError::InvalidByte("zz".into()).into();
        assert_eq!(err.to_string(), "Invalid payload: invalid hex byte 'zz'");

        let err: AppError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, AppError::IoError(_)));
    }
}
