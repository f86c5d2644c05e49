//! EntropyEngine - synchronous orchestration of the estimation pipeline.
//!
//! Ingestion appends normalized samples to the window; `tick` runs the
//! evict -> estimate -> smooth/derive -> staleness chain and produces a
//! complete `EntropyState` snapshot. Timing is supplied by the caller,
//! which makes every tick deterministic; the concurrent wrapper lives in
//! [`crate::pipeline`].

use crate::config::EngineConfig;
use crate::error::ConfigError;
use crate::event::HealthEvent;
use crate::histogram;
use crate::normalize::Normalizer;
use crate::smoothing::SmoothingEngine;
use crate::staleness::{Liveness, StalenessMonitor};
use crate::state::{EntropyState, STATE_SCHEMA_VERSION};
use crate::window::{Sample, WindowStore};

/// Main engine driving the entropy estimation chain.
pub struct EntropyEngine {
    config: EngineConfig,
    normalizer: Normalizer,
    window: WindowStore,
    smoothing: SmoothingEngine,
    staleness: StalenessMonitor,
    tick_count: u64,
    last_state: Option<EntropyState>,
}

impl EntropyEngine {
    /// Create an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            normalizer: Normalizer::new(),
            window: WindowStore::new(config.window_length),
            smoothing: SmoothingEngine::new(config.alpha),
            staleness: StalenessMonitor::new(config.ttl),
            config,
            tick_count: 0,
            last_state: None,
        })
    }

    /// Ingest one raw textual token at arrival time `timestamp`.
    /// Returns true if the sample was admitted to the window.
    pub fn ingest(&mut self, token: &str, timestamp: f64) -> bool {
        match self.normalizer.normalize_text(token) {
            Some(value) => self.admit(value, timestamp),
            None => false,
        }
    }

    /// Ingest an already-numeric value (e.g. from a CSV replay feed).
    pub fn ingest_value(&mut self, value: f64, timestamp: f64) -> bool {
        if !value.is_finite() {
            self.normalizer.record_drop();
            return false;
        }
        self.admit(value, timestamp)
    }

    fn admit(&mut self, value: f64, timestamp: f64) -> bool {
        if !self.window.push(Sample::new(timestamp, value)) {
            return false;
        }
        self.staleness.record_sample(timestamp);
        true
    }

    /// Run one tick at wall-clock `now`: evict expired samples,
    /// estimate entropy, smooth, derive, update staleness, and build
    /// the published snapshot. Also returns the health event if the
    /// liveness state changed at this tick.
    pub fn tick(&mut self, now: f64) -> (EntropyState, Option<HealthEvent>) {
        self.window.evict(now);

        let estimate = histogram::estimate(self.window.values(), self.config.bin_count);
        let derivatives = self.smoothing.step(estimate.raw_entropy, now);

        let event = self.staleness.evaluate(now).map(|transition| match transition.to {
            Liveness::Stale => HealthEvent::went_stale(now, self.staleness.silence(now)),
            Liveness::Healthy => HealthEvent::recovered(now),
        });

        self.tick_count += 1;
        let state = EntropyState {
            schema_version: STATE_SCHEMA_VERSION.to_string(),
            timestamp: now,
            raw_entropy: estimate.raw_entropy,
            entropy: derivatives.smoothed,
            slope: derivatives.slope,
            curvature: derivatives.curvature,
            curvature_valid: derivatives.curvature_valid,
            sample_count: estimate.sample_count,
            is_stale: self.staleness.is_stale(),
            tick: self.tick_count,
        };

        self.last_state = Some(state.clone());
        (state, event)
    }

    /// Last published snapshot, if any tick has run.
    pub fn last_state(&self) -> Option<&EntropyState> {
        self.last_state.as_ref()
    }

    /// Total ticks processed.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Samples currently in the window.
    pub fn window_len(&self) -> usize {
        self.window.len()
    }

    /// Malformed tokens dropped by the normalizer.
    pub fn dropped_malformed(&self) -> u64 {
        self.normalizer.dropped_count()
    }

    /// Out-of-order samples dropped by the window store.
    pub fn dropped_out_of_order(&self) -> u64 {
        self.window.dropped_out_of_order()
    }

    /// Distinct symbols seen by the normalizer.
    pub fn symbol_count(&self) -> usize {
        self.normalizer.symbol_count()
    }

    /// Current configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reset all state (window, smoothing history, symbol table,
    /// staleness, counters).
    pub fn reset(&mut self) {
        self.normalizer.reset();
        self.window = WindowStore::new(self.config.window_length);
        self.smoothing.reset();
        self.staleness.reset();
        self.tick_count = 0;
        self.last_state = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn test_config() -> EngineConfig {
        EngineConfig {
            dt: 0.25,
            bin_count: 4,
            window_length: 10.0,
            alpha: 0.2,
            ttl: 2.0,
        }
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let config = test_config().with_alpha(0.0);
        assert!(EntropyEngine::new(config).is_err());
    }

    #[test]
    fn test_empty_window_tick_is_degenerate() {
        let mut engine = EntropyEngine::new(test_config()).unwrap();
        let (state, _) = engine.tick(0.25);
        assert_eq!(state.raw_entropy, 0.0);
        assert_eq!(state.sample_count, 0);
        assert!(state.is_stale);
        assert_eq!(state.tick, 1);
    }

    #[test]
    fn test_ingest_and_tick() {
        let mut engine = EntropyEngine::new(test_config()).unwrap();
        for i in 0..8 {
            let value = if i % 2 == 0 { "1" } else { "2" };
            assert!(engine.ingest(value, i as f64 * 0.25));
        }
        let (state, _) = engine.tick(2.0);
        assert_eq!(state.sample_count, 8);
        assert!(!state.is_stale);
        assert!(state.raw_entropy > 0.0);
    }

    #[test]
    fn test_malformed_tokens_are_dropped() {
        let mut engine = EntropyEngine::new(test_config()).unwrap();
        assert!(!engine.ingest("??!garbled input", 0.0));
        assert!(engine.ingest("1.0", 0.1));
        assert_eq!(engine.dropped_malformed(), 1);
        assert_eq!(engine.window_len(), 1);
    }

    #[test]
    fn test_out_of_order_is_dropped() {
        let mut engine = EntropyEngine::new(test_config()).unwrap();
        assert!(engine.ingest("1", 0.0));
        assert!(engine.ingest("2", 1.0));
        assert!(!engine.ingest("3", 0.5));
        assert_eq!(engine.dropped_out_of_order(), 1);
        assert_eq!(engine.window_len(), 2);
    }

    #[test]
    fn test_non_finite_value_is_dropped() {
        let mut engine = EntropyEngine::new(test_config()).unwrap();
        assert!(!engine.ingest_value(f64::NAN, 0.0));
        assert!(!engine.ingest_value(f64::INFINITY, 0.1));
        assert_eq!(engine.dropped_malformed(), 2);
    }

    #[test]
    fn test_symbol_stream() {
        let mut engine = EntropyEngine::new(test_config()).unwrap();
        let alphabet = ["a", "b", "c", "d"];
        for i in 0..40 {
            engine.ingest(alphabet[i % 4], i as f64 * 0.1);
        }
        assert_eq!(engine.symbol_count(), 4);
        let (state, _) = engine.tick(4.0);
        // four equally populated codes across four bins
        assert_relative_eq!(state.raw_entropy, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_stale_recovery_cycle() {
        let mut engine = EntropyEngine::new(test_config()).unwrap();
        engine.ingest("1", 0.0);
        let (state, event) = engine.tick(0.25);
        assert!(!state.is_stale);
        assert!(event.is_some());

        // silence past the 2s ttl
        let (state, event) = engine.tick(2.5);
        assert!(state.is_stale);
        assert!(event.is_some());

        engine.ingest("2", 2.6);
        let (state, event) = engine.tick(2.75);
        assert!(!state.is_stale);
        assert!(event.is_some());
    }

    #[test]
    fn test_eviction_precedes_estimation() {
        let config = test_config().with_window_length(1.0);
        let mut engine = EntropyEngine::new(config).unwrap();
        for i in 0..10 {
            engine.ingest("5", i as f64 * 0.1);
        }
        // far future: everything expired before estimation
        let (state, _) = engine.tick(100.0);
        assert_eq!(state.sample_count, 0);
        assert_eq!(state.raw_entropy, 0.0);
    }

    #[test]
    fn test_last_state_and_counters() {
        let mut engine = EntropyEngine::new(test_config()).unwrap();
        assert!(engine.last_state().is_none());
        engine.tick(0.25);
        engine.tick(0.5);
        assert_eq!(engine.tick_count(), 2);
        assert_eq!(engine.last_state().unwrap().tick, 2);
    }

    #[test]
    fn test_reset() {
        let mut engine = EntropyEngine::new(test_config()).unwrap();
        engine.ingest("a", 0.0);
        engine.ingest("junk token", 0.1);
        engine.tick(0.25);

        engine.reset();
        assert_eq!(engine.tick_count(), 0);
        assert_eq!(engine.window_len(), 0);
        assert_eq!(engine.dropped_malformed(), 0);
        assert_eq!(engine.symbol_count(), 0);
        assert!(engine.last_state().is_none());
        // back to the initial stale state
        let (state, _) = engine.tick(1.0);
        assert!(state.is_stale);
    }
}
