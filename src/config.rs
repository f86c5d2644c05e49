//! Engine configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Configuration for the entropy estimation pipeline.
///
/// Immutable once the pipeline starts; all parameters are validated
/// before any ingestion begins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Tick interval in seconds.
    pub dt: f64,

    /// Number of histogram bins for the entropy estimate.
    pub bin_count: usize,

    /// Seconds of history retained in the sliding window.
    pub window_length: f64,

    /// EMA smoothing factor in (0, 1].
    pub alpha: f64,

    /// Seconds of ingestion silence before the pipeline is flagged stale.
    pub ttl: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dt: 0.25,
            bin_count: 24,
            window_length: 45.0,
            alpha: 0.2,
            ttl: 2.0,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tick interval in seconds.
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Set the histogram bin count.
    pub fn with_bin_count(mut self, bin_count: usize) -> Self {
        self.bin_count = bin_count;
        self
    }

    /// Set the window length in seconds.
    pub fn with_window_length(mut self, window_length: f64) -> Self {
        self.window_length = window_length;
        self
    }

    /// Set the EMA smoothing factor.
    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Set the staleness ttl in seconds.
    pub fn with_ttl(mut self, ttl: f64) -> Self {
        self.ttl = ttl;
        self
    }

    /// Validate all parameters. Out-of-range values are a startup
    /// configuration error, not a runtime one.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidTickInterval(self.dt));
        }
        if self.bin_count < 2 {
            return Err(ConfigError::InvalidBinCount(self.bin_count));
        }
        if !self.window_length.is_finite() || self.window_length <= 0.0 {
            return Err(ConfigError::InvalidWindowLength(self.window_length));
        }
        if !self.alpha.is_finite() || self.alpha <= 0.0 || self.alpha > 1.0 {
            return Err(ConfigError::InvalidAlpha(self.alpha));
        }
        if !self.ttl.is_finite() || self.ttl <= 0.0 {
            return Err(ConfigError::InvalidTtl(self.ttl));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count, 24);
        assert!((config.dt - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_setters() {
        let config = EngineConfig::new()
            .with_dt(0.5)
            .with_bin_count(8)
            .with_window_length(10.0)
            .with_alpha(0.3)
            .with_ttl(5.0);

        assert!(config.validate().is_ok());
        assert_eq!(config.bin_count, 8);
        assert!((config.ttl - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_nonpositive_dt() {
        let config = EngineConfig::default().with_dt(0.0);
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidTickInterval(0.0))
        );

        let config = EngineConfig::default().with_dt(f64::NAN);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidTickInterval(_))
        ));
    }

    #[test]
    fn test_rejects_small_bin_count() {
        let config = EngineConfig::default().with_bin_count(1);
        assert_eq!(config.validate(), Err(ConfigError::InvalidBinCount(1)));
    }

    #[test]
    fn test_rejects_out_of_range_alpha() {
        for alpha in [0.0, -0.1, 1.1, f64::INFINITY] {
            let config = EngineConfig::default().with_alpha(alpha);
            assert!(matches!(
                config.validate(),
                Err(ConfigError::InvalidAlpha(_))
            ));
        }
        // alpha == 1.0 is the no-smoothing edge of the valid range
        let config = EngineConfig::default().with_alpha(1.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_nonpositive_window_and_ttl() {
        let config = EngineConfig::default().with_window_length(-1.0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidWindowLength(_))
        ));

        let config = EngineConfig::default().with_ttl(0.0);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidTtl(_))));
    }

    #[test]
    fn test_config_serialization() {
        let config = EngineConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let parsed: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config.bin_count, parsed.bin_count);
        assert!((config.alpha - parsed.alpha).abs() < f64::EPSILON);
    }
}
