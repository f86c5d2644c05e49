//! # EE - Streaming Entropy Estimation
//!
//! Continuous estimation of the Shannon entropy of a live data stream,
//! with smoothing, temporal derivatives, and liveness monitoring.
//!
//! ## Key Features
//!
//! - **Windowed estimation**: Time-based sliding window with equal-width
//!   histogram binning recomputed from scratch every tick
//! - **Smoothing and derivatives**: EWMA-filtered entropy H̃ with slope
//!   and curvature over actual elapsed time
//! - **Staleness monitoring**: Ttl-driven liveness classification with
//!   health events on every transition
//! - **Latest-wins scheduling**: Overrunning ticks are skipped, never
//!   queued
//!
//! ## Quick Start
//!
//! ```rust
//! use ee::{EngineConfig, EntropyEngine};
//!
//! let config = EngineConfig::default().with_bin_count(4);
//! let mut engine = EntropyEngine::new(config).unwrap();
//!
//! // Feed raw tokens; malformed input is dropped, not fatal
//! for i in 0..20 {
//!     let token = if i % 2 == 0 { "1" } else { "2" };
//!     engine.ingest(token, i as f64 * 0.1);
//! }
//!
//! // One tick runs evict -> estimate -> smooth -> staleness
//! let (state, _event) = engine.tick(2.0);
//! assert_eq!(state.sample_count, 20);
//! assert!(!state.is_stale);
//! assert!(state.raw_entropy > 0.0);
//! ```
//!
//! ## Concurrent Pipeline
//!
//! The [`pipeline`] module wraps the engine with a tokio tick task,
//! watch-published snapshots, and a broadcast health event feed:
//!
//! ```ignore
//! use ee::{EngineConfig, Pipeline};
//!
//! let handle = Pipeline::spawn(EngineConfig::default())?;
//! let ingest = handle.ingest();
//! ingest.push("3.14").await?;
//!
//! let state = handle.latest_state();
//! println!("H = {:.3} (stale: {})", state.entropy, state.is_stale);
//!
//! handle.shutdown().await;
//! ```
//!
//! ## Key Concepts
//!
//! ### Normalized entropy
//!
//! Each tick bins the window's values into equal-width bins over the
//! window's own min/max range and computes Shannon entropy from the bin
//! occupancy distribution, normalized by the entropy of the uniform
//! distribution over the configured bin count. The result is a scale-free
//! score in [0, 1].
//!
//! ### Derivatives
//!
//! Slope and curvature are backward finite differences of the smoothed
//! entropy over actual elapsed time between ticks, so irregular tick
//! spacing does not distort them. Curvature carries a validity flag
//! during the bootstrap region (fewer than two completed intervals).
//!
//! ### Staleness
//!
//! Liveness is classified at tick boundaries from the age of the most
//! recent admitted sample. The pipeline starts stale, recovers on data,
//! and emits a health event at every transition.

// Core modules
pub mod config;
pub mod engine;
pub mod error;
pub mod event;
pub mod histogram;
pub mod normalize;
pub mod pipeline;
pub mod smoothing;
pub mod staleness;
pub mod state;
pub mod window;

// Re-exports for convenience
pub use config::EngineConfig;
pub use engine::EntropyEngine;
pub use error::{ConfigError, EngineError, Result};
pub use event::{EventKind, HealthEvent};
pub use histogram::HistogramEstimate;
pub use normalize::{Normalizer, RawToken};
pub use pipeline::{IngestHandle, Pipeline, PipelineHandle, PipelineView, StatsSnapshot};
pub use smoothing::{Derivatives, SmoothingEngine, MIN_TICK_INTERVAL};
pub use staleness::{Liveness, LivenessTransition, StalenessMonitor};
pub use state::{EntropyState, STATE_SCHEMA_VERSION};
pub use window::{Sample, WindowStore};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_basic_workflow() {
        let config = EngineConfig::default().with_bin_count(4);
        let mut engine = EntropyEngine::new(config).unwrap();

        for i in 0..20 {
            let token = if i % 2 == 0 { "1" } else { "2" };
            assert!(engine.ingest(token, i as f64 * 0.1));
        }

        let (state, event) = engine.tick(2.0);
        assert_eq!(state.sample_count, 20);
        assert!(!state.is_stale);
        assert!(state.raw_entropy > 0.0);
        // first tick after data: stale -> healthy transition
        assert!(event.is_some());
    }
}
