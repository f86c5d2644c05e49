//! Smoothing and derivative engine.
//!
//! Applies exponential smoothing to the raw entropy series and derives
//! first/second time derivatives with backward finite differences over
//! the actual wall-clock interval between ticks.

/// Minimum tick interval in seconds. Ticks closer together than this
/// hold the previous derivatives instead of dividing by a near-zero
/// interval.
pub const MIN_TICK_INTERVAL: f64 = 1e-6;

/// Output of one smoothing step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Derivatives {
    /// Smoothed entropy.
    pub smoothed: f64,
    /// First time-derivative of the smoothed series.
    pub slope: f64,
    /// Second time-derivative of the smoothed series.
    pub curvature: f64,
    /// False while in the bootstrap region (fewer than two prior ticks).
    pub curvature_valid: bool,
}

#[derive(Debug, Clone, Copy)]
struct LastTick {
    smoothed: f64,
    slope: f64,
    curvature: f64,
    timestamp: f64,
}

/// EMA smoother with finite-difference slope and curvature.
#[derive(Debug)]
pub struct SmoothingEngine {
    alpha: f64,
    last: Option<LastTick>,
    prior_ticks: u64,
}

impl SmoothingEngine {
    /// Create a smoother with factor `alpha` in (0, 1].
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            last: None,
            prior_ticks: 0,
        }
    }

    /// Advance one tick with the new raw entropy at wall-clock `now`.
    pub fn step(&mut self, raw_entropy: f64, now: f64) -> Derivatives {
        let out = match self.last {
            None => Derivatives {
                // first tick: no smoothing history to blend with
                smoothed: raw_entropy,
                slope: 0.0,
                curvature: 0.0,
                curvature_valid: false,
            },
            Some(prev) => {
                let smoothed =
                    self.alpha * raw_entropy + (1.0 - self.alpha) * prev.smoothed;
                let dt = now - prev.timestamp;
                if dt < MIN_TICK_INTERVAL {
                    // duplicate/too-frequent tick: smoothing advances,
                    // derivatives hold, and the reference timestamp
                    // stays at the last good tick
                    let held = Derivatives {
                        smoothed,
                        slope: prev.slope,
                        curvature: prev.curvature,
                        curvature_valid: self.prior_ticks >= 2,
                    };
                    self.last = Some(LastTick {
                        smoothed,
                        slope: prev.slope,
                        curvature: prev.curvature,
                        timestamp: prev.timestamp,
                    });
                    self.prior_ticks += 1;
                    return held;
                }
                let slope = (smoothed - prev.smoothed) / dt;
                let curvature_valid = self.prior_ticks >= 2;
                let curvature = if curvature_valid {
                    (slope - prev.slope) / dt
                } else {
                    0.0
                };
                Derivatives {
                    smoothed,
                    slope,
                    curvature,
                    curvature_valid,
                }
            }
        };

        self.last = Some(LastTick {
            smoothed: out.smoothed,
            slope: out.slope,
            curvature: out.curvature,
            timestamp: now,
        });
        self.prior_ticks += 1;
        out
    }

    /// Number of ticks processed.
    pub fn prior_ticks(&self) -> u64 {
        self.prior_ticks
    }

    /// Clear smoothing history.
    pub fn reset(&mut self) {
        self.last = None;
        self.prior_ticks = 0;
    }
}
