//! Published state snapshot.
//!
//! A new `EntropyState` is computed and swapped in atomically on every
//! tick; the previous instance stays valid for readers until replaced.
//! Value semantics: snapshots are never mutated in place.

use serde::{Deserialize, Serialize};

/// Schema tag carried by every published frame.
pub const STATE_SCHEMA_VERSION: &str = "ee-0.3";

/// The (H̃, slope, curvature) state vector published each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntropyState {
    /// Frame schema version.
    pub schema_version: String,
    /// Tick timestamp in seconds since pipeline start.
    pub timestamp: f64,
    /// Unsmoothed normalized entropy of this tick's window.
    pub raw_entropy: f64,
    /// Smoothed normalized entropy H̃ in [0, 1].
    pub entropy: f64,
    /// First time-derivative of the smoothed entropy.
    pub slope: f64,
    /// Second time-derivative of the smoothed entropy.
    pub curvature: f64,
    /// False while in the derivative bootstrap region.
    pub curvature_valid: bool,
    /// Samples in the analysis window at this tick.
    pub sample_count: usize,
    /// True when ingestion silence exceeded the ttl.
    pub is_stale: bool,
    /// Tick sequence number (1-based).
    pub tick: u64,
}

impl EntropyState {
    /// The pre-first-tick snapshot readers observe before any tick has
    /// published: no data, stale.
    pub fn bootstrap() -> Self {
        Self {
            schema_version: STATE_SCHEMA_VERSION.to_string(),
            timestamp: 0.0,
            raw_entropy: 0.0,
            entropy: 0.0,
            slope: 0.0,
            curvature: 0.0,
            curvature_valid: false,
            sample_count: 0,
            is_stale: true,
            tick: 0,
        }
    }

    /// Serialize to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from JSON.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
