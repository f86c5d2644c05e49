//! Error types for the entropy engine
//!
//! This module defines all error types used throughout the library.

use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The pipeline has been shut down
    #[error("Pipeline is shut down")]
    ShutDown,
}

/// Errors raised by configuration validation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Tick interval must be a positive finite number of seconds
    #[error("Invalid tick interval: {0} (must be positive and finite)")]
    InvalidTickInterval(f64),

    /// Histogram needs at least two bins
    #[error("Invalid bin count: {0} (must be at least 2)")]
    InvalidBinCount(usize),

    /// Window span must be a positive finite number of seconds
    #[error("Invalid window length: {0} (must be positive and finite)")]
    InvalidWindowLength(f64),

    /// Smoothing factor must lie in (0, 1]
    #[error("Invalid smoothing alpha: {0} (must be in (0, 1])")]
    InvalidAlpha(f64),

    /// Staleness ttl must be a positive finite number of seconds
    #[error("Invalid ttl: {0} (must be positive and finite)")]
    InvalidTtl(f64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EngineError::Config(ConfigError::InvalidAlpha(1.5));
        let msg = format!("{}", err);
        assert!(msg.contains("alpha"));
        assert!(msg.contains("1.5"));
    }

    #[test]
    fn test_error_conversion() {
        let config_err = ConfigError::InvalidBinCount(1);
        let engine_err: EngineError = config_err.into();
        assert!(matches!(engine_err, EngineError::Config(_)));
    }
}
