// EE Testdata - Stream configuration
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Stream configuration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::generator::GeneratorError;

/// Kind of tokens the stream emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    /// Numeric values from the quasi-periodic baseline.
    Numeric,
    /// Cyclic lowercase letters.
    Letters,
    /// Cyclic punctuation symbols.
    Symbols,
    /// Numeric baseline with symbols mixed in (~25%).
    Mixed,
}

impl DataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::Numeric => "123",
            DataType::Letters => "abc",
            DataType::Symbols => "sym",
            DataType::Mixed => "mix",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataType {
    type Err = GeneratorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // accept "--123" as well as "123"
        let s = s.trim().trim_start_matches("--");
        match s.to_ascii_lowercase().as_str() {
            "123" => Ok(DataType::Numeric),
            "abc" => Ok(DataType::Letters),
            "sym" => Ok(DataType::Symbols),
            "mix" => Ok(DataType::Mixed),
            other => Err(GeneratorError::UnknownDataType(other.to_string())),
        }
    }
}

/// Stream generator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Kind of tokens to emit.
    pub datatype: DataType,
    /// Seconds of logical time per emitted token.
    pub interval: f64,
    /// Perturbation intensity in [0, 1].
    pub unexpected_factor: f64,
    /// RNG seed for reproducibility.
    pub seed: u64,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            datatype: DataType::Numeric,
            interval: 1.0,
            unexpected_factor: 0.2,
            seed: 42,
        }
    }
}

impl StreamConfig {
    /// Create a config for the given datatype with defaults elsewhere.
    pub fn new(datatype: DataType) -> Self {
        Self {
            datatype,
            ..Default::default()
        }
    }

    /// Set the logical emission interval in seconds.
    pub fn with_interval(mut self, interval: f64) -> Self {
        self.interval = interval;
        self
    }

    /// Set the unexpected factor.
    pub fn with_unexpected_factor(mut self, factor: f64) -> Self {
        self.unexpected_factor = factor;
        self
    }

    /// Set the RNG seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if !(self.interval > 0.0 && self.interval.is_finite()) {
            return Err(GeneratorError::InvalidInterval(self.interval));
        }
        if !(0.0..=1.0).contains(&self.unexpected_factor) {
            return Err(GeneratorError::InvalidUnexpectedFactor(
                self.unexpected_factor,
            ));
        }
        Ok(())
    }
}
