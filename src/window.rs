//! Sliding window store.
//!
//! Holds the most recent samples covering a configurable time span.
//! Ingestion appends, the tick pipeline evicts; out-of-order arrivals
//! are dropped so the window stays ordered by timestamp.

use std::collections::VecDeque;

/// One normalized sample. Immutable once created.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    /// Arrival timestamp in seconds.
    pub timestamp: f64,
    /// Normalized value.
    pub value: f64,
}

impl Sample {
    pub fn new(timestamp: f64, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Time-bounded sample store with non-decreasing timestamp order.
#[derive(Debug)]
pub struct WindowStore {
    samples: VecDeque<Sample>,
    window_length: f64,
    dropped_out_of_order: u64,
}

impl WindowStore {
    /// Create a store retaining `window_length` seconds of history.
    pub fn new(window_length: f64) -> Self {
        Self {
            samples: VecDeque::new(),
            window_length,
            dropped_out_of_order: 0,
        }
    }

    /// Append a sample. Returns `false` if the sample is out of order
    /// (older than the newest admitted sample); late data does not
    /// retroactively reorder the window.
    pub fn push(&mut self, sample: Sample) -> bool {
        if let Some(last) = self.samples.back() {
            if sample.timestamp < last.timestamp {
                self.dropped_out_of_order += 1;
                return false;
            }
        }
        self.samples.push_back(sample);
        true
    }

    /// Remove all samples older than `now - window_length`.
    pub fn evict(&mut self, now: f64) {
        let cutoff = now - self.window_length;
        while let Some(front) = self.samples.front() {
            if front.timestamp < cutoff {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Read-only view of the current window contents.
    pub fn snapshot(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Values of the current window, oldest first.
    pub fn values(&self) -> impl Iterator<Item = f64> + Clone + '_ {
        self.samples.iter().map(|s| s.value)
    }

    /// Number of samples currently held.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Timestamp of the newest admitted sample.
    pub fn last_timestamp(&self) -> Option<f64> {
        self.samples.back().map(|s| s.timestamp)
    }

    /// Number of out-of-order samples dropped.
    pub fn dropped_out_of_order(&self) -> u64 {
        self.dropped_out_of_order
    }
}
