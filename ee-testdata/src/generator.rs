// EE Testdata - Token stream generator
// Copyright (c) 2025 David Martin Venti
//
// Dual-licensed under AGPL-3.0 and Commercial License.
// See LICENSE file for details.

//! Token stream generation.
//!
//! A deterministic quasi-periodic baseline carries the signal; all
//! perturbations (noise, spikes, regime switches, dropouts, duplicates)
//! are scaled by the configured unexpected factor. Identical seeds
//! produce identical streams.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{DataType, StreamConfig};

const LETTERS: &[char] = &[
    'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's',
    't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const SYMBOLS: &[char] = &[
    '!', '@', '#', '$', '%', '^', '&', '*', '?', '-', '+', '=', ':', ';',
];

/// Fraction of mixed-mode tokens drawn from the symbol alphabets.
const MIX_SYMBOL_FRACTION: f64 = 0.25;

/// Errors from stream configuration.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("unknown datatype '{0}' (expected 123, abc, sym or mix)")]
    UnknownDataType(String),

    #[error("interval must be positive and finite, got {0}")]
    InvalidInterval(f64),

    #[error("unexpected factor must be in [0, 1], got {0}")]
    InvalidUnexpectedFactor(f64),
}

/// Perturbation counters for observability.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneratorStats {
    pub emitted: u64,
    pub spikes: u64,
    pub regime_switches: u64,
    pub dropouts: u64,
    pub duplicates: u64,
}

/// Seeded token stream.
pub struct TokenStream {
    config: StreamConfig,
    rng: StdRng,
    noise: Normal<f64>,
    /// Logical time of the next emission.
    t: f64,
    /// Cyclic index into the symbol alphabets.
    k: usize,
    regime_bias: f64,
    next_regime: f64,
    pending_duplicate: Option<String>,
    stats: GeneratorStats,
}

impl TokenStream {
    /// Create a stream from a validated configuration.
    pub fn new(config: StreamConfig) -> Result<Self, GeneratorError> {
        config.validate()?;
        let sigma = 0.25 * config.unexpected_factor;
        let noise = Normal::new(0.0, sigma).expect("sigma is finite and non-negative");
        let rng = StdRng::seed_from_u64(config.seed);
        let mut stream = Self {
            rng,
            noise,
            t: 0.0,
            k: 0,
            regime_bias: 0.0,
            next_regime: 0.0,
            pending_duplicate: None,
            stats: GeneratorStats::default(),
            config,
        };
        stream.next_regime = stream.regime_interval();
        Ok(stream)
    }

    /// Produce the next token, or `None` when a dropout suppresses this
    /// emission slot. Duplicates occupy the following slot.
    pub fn next_token(&mut self) -> Option<String> {
        if let Some(token) = self.pending_duplicate.take() {
            self.stats.emitted += 1;
            return Some(token);
        }

        let now = self.t;
        self.t += self.config.interval;
        self.maybe_regime_switch(now);

        let token = self.render(now);

        if self.maybe_dropout() {
            return None;
        }
        if self.maybe_duplicate() {
            self.pending_duplicate = Some(token.clone());
        }
        self.stats.emitted += 1;
        Some(token)
    }

    /// Perturbation counters so far.
    pub fn stats(&self) -> &GeneratorStats {
        &self.stats
    }

    /// Stream configuration.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    fn render(&mut self, now: f64) -> String {
        match self.config.datatype {
            DataType::Numeric => format!("{:.6}", self.numeric_value(now)),
            DataType::Letters => self.cyclic_symbol(LETTERS),
            DataType::Symbols => self.cyclic_symbol(SYMBOLS),
            DataType::Mixed => {
                if self.rng.gen::<f64>() < MIX_SYMBOL_FRACTION {
                    // letters and symbols share one cyclic index
                    let merged: Vec<char> = LETTERS.iter().chain(SYMBOLS).copied().collect();
                    self.cyclic_symbol(&merged)
                } else {
                    format!("{:.6}", self.numeric_value(now))
                }
            }
        }
    }

    /// Quasi-periodic baseline: two incommensurate tones, a slow
    /// modulation and a gentle drift, so the pattern never repeats
    /// exactly.
    fn baseline(&self, t: f64) -> f64 {
        (2.0 * t).sin()
            + 0.7 * (std::f64::consts::PI * std::f64::consts::SQRT_2 * t).sin()
            + 0.05 * (0.1 * t).sin()
            + 0.001 * t
    }

    fn numeric_value(&mut self, now: f64) -> f64 {
        self.baseline(now) + self.regime_bias + self.noise_sample() + self.spike()
    }

    fn cyclic_symbol(&mut self, alphabet: &[char]) -> String {
        let c = alphabet[self.k % alphabet.len()];
        self.k += 1;
        c.to_string()
    }

    fn noise_sample(&mut self) -> f64 {
        if self.config.unexpected_factor == 0.0 {
            return 0.0;
        }
        self.noise.sample(&mut self.rng)
    }

    fn spike(&mut self) -> f64 {
        let uf = self.config.unexpected_factor;
        let p = uf * uf * 0.05;
        if self.rng.gen::<f64>() < p {
            self.stats.spikes += 1;
            let sign = if self.rng.gen::<bool>() { 1.0 } else { -1.0 };
            sign * (2.0 + 8.0 * uf)
        } else {
            0.0
        }
    }

    fn regime_interval(&self) -> f64 {
        // higher factor, shorter intervals
        let scale = (1.0 - self.config.unexpected_factor).max(0.1);
        (30.0 * scale).max(5.0)
    }

    fn maybe_regime_switch(&mut self, now: f64) {
        if now >= self.next_regime {
            let shift = self.rng.gen_range(-1.0..1.0) * (0.5 + self.config.unexpected_factor);
            self.regime_bias += shift;
            self.next_regime = now + self.regime_interval();
            self.stats.regime_switches += 1;
        }
    }

    fn maybe_dropout(&mut self) -> bool {
        let p = 0.01 * self.config.unexpected_factor;
        if self.rng.gen::<f64>() < p {
            self.stats.dropouts += 1;
            true
        } else {
            false
        }
    }

    fn maybe_duplicate(&mut self) -> bool {
        let p = 0.01 * self.config.unexpected_factor;
        if self.rng.gen::<f64>() < p {
            self.stats.duplicates += 1;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(config: StreamConfig, n: usize) -> Vec<Option<String>> {
        let mut stream = TokenStream::new(config).unwrap();
        (0..n).map(|_| stream.next_token()).collect()
    }

    #[test]
    fn test_same_seed_same_stream() {
        let config = StreamConfig::new(DataType::Numeric)
            .with_unexpected_factor(0.8)
            .with_seed(7);
        assert_eq!(collect(config.clone(), 500), collect(config, 500));
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = StreamConfig::new(DataType::Numeric)
            .with_unexpected_factor(0.5)
            .with_seed(1);
        let b = a.clone().with_seed(2);
        assert_ne!(collect(a, 100), collect(b, 100));
    }

    #[test]
    fn test_zero_factor_is_pure_baseline() {
        let config = StreamConfig::new(DataType::Numeric)
            .with_interval(0.5)
            .with_unexpected_factor(0.0);
        let mut stream = TokenStream::new(config).unwrap();
        // stay short of the first regime switch at t = 30s
        for i in 0..50 {
            let token = stream.next_token().expect("no dropouts at factor 0");
            let value: f64 = token.parse().unwrap();
            let t = i as f64 * 0.5;
            let expected = (2.0 * t).sin()
                + 0.7 * (std::f64::consts::PI * std::f64::consts::SQRT_2 * t).sin()
                + 0.05 * (0.1 * t).sin()
                + 0.001 * t;
            assert!((value - expected).abs() < 1e-5);
        }
        let stats = stream.stats();
        assert_eq!(stats.spikes, 0);
        assert_eq!(stats.dropouts, 0);
        assert_eq!(stats.duplicates, 0);
        assert_eq!(stats.emitted, 50);
    }

    #[test]
    fn test_letters_cycle() {
        let config = StreamConfig::new(DataType::Letters).with_unexpected_factor(0.0);
        let mut stream = TokenStream::new(config).unwrap();
        assert_eq!(stream.next_token().as_deref(), Some("a"));
        assert_eq!(stream.next_token().as_deref(), Some("b"));
        for _ in 0..24 {
            stream.next_token();
        }
        // wrapped around the alphabet
        assert_eq!(stream.next_token().as_deref(), Some("a"));
    }

    #[test]
    fn test_symbols_are_single_chars() {
        let config = StreamConfig::new(DataType::Symbols).with_unexpected_factor(0.0);
        let mut stream = TokenStream::new(config).unwrap();
        for _ in 0..50 {
            let token = stream.next_token().unwrap();
            assert_eq!(token.chars().count(), 1);
            assert!(SYMBOLS.contains(&token.chars().next().unwrap()));
        }
    }

    #[test]
    fn test_mixed_mode_emits_both_kinds() {
        let config = StreamConfig::new(DataType::Mixed)
            .with_unexpected_factor(0.0)
            .with_seed(3);
        let mut stream = TokenStream::new(config).unwrap();
        let mut numeric = 0;
        let mut symbolic = 0;
        for _ in 0..400 {
            let token = stream.next_token().unwrap();
            if token.parse::<f64>().is_ok() {
                numeric += 1;
            } else {
                symbolic += 1;
            }
        }
        assert!(numeric > 0);
        assert!(symbolic > 0);
    }

    #[test]
    fn test_high_factor_produces_perturbations() {
        let config = StreamConfig::new(DataType::Numeric)
            .with_interval(0.1)
            .with_unexpected_factor(1.0)
            .with_seed(11);
        let mut stream = TokenStream::new(config).unwrap();
        for _ in 0..5000 {
            stream.next_token();
        }
        let stats = stream.stats();
        assert!(stats.spikes > 0);
        assert!(stats.regime_switches > 0);
        assert!(stats.dropouts > 0);
        assert!(stats.duplicates > 0);
    }

    #[test]
    fn test_duplicate_occupies_next_slot() {
        let config = StreamConfig::new(DataType::Numeric)
            .with_unexpected_factor(1.0)
            .with_seed(5);
        let mut stream = TokenStream::new(config).unwrap();
        let mut tokens = Vec::new();
        for _ in 0..5000 {
            if let Some(token) = stream.next_token() {
                tokens.push(token);
            }
        }
        let duplicates = stream.stats().duplicates;
        assert!(duplicates > 0);
        // a pending duplicate at the end of the run never gets emitted
        let adjacent_repeats = tokens.windows(2).filter(|w| w[0] == w[1]).count() as u64;
        assert!(adjacent_repeats + 1 >= duplicates);
    }

    #[test]
    fn test_stats_serialize() {
        let stats = GeneratorStats::default();
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"emitted\""));
    }
}
