//! Staleness monitor.
//!
//! Classifies the pipeline's liveness from ingestion recency. The
//! pipeline starts stale (no data yet), recovers once an admitted
//! sample is observed within the ttl, and goes stale again after
//! `ttl` seconds of silence.

/// Liveness of the ingestion path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    /// Admitted samples are arriving within the ttl.
    Healthy,
    /// No admitted sample for longer than the ttl (or no data yet).
    Stale,
}

impl Liveness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Liveness::Stale)
    }
}

/// A liveness state change observed at a tick boundary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LivenessTransition {
    pub from: Liveness,
    pub to: Liveness,
    /// Tick timestamp at which the transition was observed.
    pub timestamp: f64,
}

/// Tracks inter-sample gaps and flags the pipeline stale/healthy.
#[derive(Debug)]
pub struct StalenessMonitor {
    ttl: f64,
    last_sample_time: Option<f64>,
    state: Liveness,
}

impl StalenessMonitor {
    /// Create a monitor with the given ttl in seconds. Initial state is
    /// stale until the first sample arrives.
    pub fn new(ttl: f64) -> Self {
        Self {
            ttl,
            last_sample_time: None,
            state: Liveness::Stale,
        }
    }

    /// Record an admitted sample's timestamp.
    pub fn record_sample(&mut self, timestamp: f64) {
        self.last_sample_time = Some(match self.last_sample_time {
            Some(existing) => existing.max(timestamp),
            None => timestamp,
        });
    }

    /// Re-classify liveness at a tick boundary. Returns the transition
    /// if the state changed.
    pub fn evaluate(&mut self, now: f64) -> Option<LivenessTransition> {
        let next = match self.last_sample_time {
            None => Liveness::Stale,
            Some(t) => {
                if now - t > self.ttl {
                    Liveness::Stale
                } else {
                    Liveness::Healthy
                }
            }
        };

        if next == self.state {
            return None;
        }
        let transition = LivenessTransition {
            from: self.state,
            to: next,
            timestamp: now,
        };
        self.state = next;
        Some(transition)
    }

    /// Current liveness state.
    pub fn state(&self) -> Liveness {
        self.state
    }

    pub fn is_stale(&self) -> bool {
        self.state.is_stale()
    }

    /// Timestamp of the most recent admitted sample.
    pub fn last_sample_time(&self) -> Option<f64> {
        self.last_sample_time
    }

    /// Seconds of silence at `now`, or `None` before the first sample.
    pub fn silence(&self, now: f64) -> Option<f64> {
        self.last_sample_time.map(|t| now - t)
    }

    pub fn reset(&mut self) {
        self.last_sample_time = None;
        self.state = Liveness::Stale;
    }
}
