//! Histogram entropy estimator.
//!
//! Bins the current window's values into equal-width bins spanning the
//! observed range and computes normalized Shannon entropy. Bin edges are
//! re-derived from the live range on every tick, so the histogram stays
//! adaptive to the value range; entropy values are comparable within a
//! tick's own windowing, not across bin-edge shifts.

use serde::{Deserialize, Serialize};

/// Result of one entropy estimation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistogramEstimate {
    /// Normalized Shannon entropy in [0, 1].
    pub raw_entropy: f64,
    /// Per-bin sample counts.
    pub bin_counts: Vec<u64>,
    /// Number of samples in the window.
    pub sample_count: usize,
}

impl HistogramEstimate {
    /// The bootstrap/no-data estimate: zero entropy, all-zero counts.
    pub fn empty(bin_count: usize) -> Self {
        Self {
            raw_entropy: 0.0,
            bin_counts: vec![0; bin_count],
            sample_count: 0,
        }
    }
}

/// Estimate normalized entropy over a window of values.
///
/// The iterator is consumed twice (range scan, then binning), hence the
/// `Clone` bound. A zero-range window collapses to a single degenerate
/// bin with entropy 0.
pub fn estimate<I>(values: I, bin_count: usize) -> HistogramEstimate
where
    I: Iterator<Item = f64> + Clone,
{
    let mut sample_count = 0usize;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values.clone() {
        sample_count += 1;
        min = min.min(v);
        max = max.max(v);
    }

    if sample_count == 0 {
        return HistogramEstimate::empty(bin_count);
    }

    if min == max {
        // All values identical: one degenerate bin, no disorder.
        return HistogramEstimate {
            raw_entropy: 0.0,
            bin_counts: vec![sample_count as u64],
            sample_count,
        };
    }

    let range = max - min;
    let mut bin_counts = vec![0u64; bin_count];
    for v in values {
        let mut index = (((v - min) / range) * bin_count as f64) as usize;
        if index >= bin_count {
            // the maximum value lands in the last bin
            index = bin_count - 1;
        }
        bin_counts[index] += 1;
    }

    let total = sample_count as f64;
    let mut entropy = 0.0;
    for &count in &bin_counts {
        if count > 0 {
            let p = count as f64 / total;
            entropy -= p * p.ln();
        }
    }

    let raw_entropy = (entropy / (bin_count as f64).ln()).clamp(0.0, 1.0);

    HistogramEstimate {
        raw_entropy,
        bin_counts,
        sample_count,
    }
}
