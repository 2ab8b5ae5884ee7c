//! Error types for the designset core library.

use thiserror::Error;

/// Result type alias using `CoreError`.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Core error types.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Settings loading or validation error.
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Error raised by the `config` crate while layering sources.
    #[error("Config crate error: {0}")]
    ConfigCrate(#[from] config::ConfigError),
}

impl CoreError {
    /// Create a new configuration error with a message.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error() {
        let err = CoreError::config("bind address is empty");
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("bind address is empty"));
    }

    #[test]
    fn test_config_crate_error_conversion() {
        let err: CoreError = config::ConfigError::Message("bad value".to_string()).into();
        assert_eq!(err.to_string(), "Config crate error: bad value");
    }
}
