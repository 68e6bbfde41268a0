//! Adaptive duration baseline
//!
//! Tracks a smoothed per-query latency average so that anomalously slow or
//! fast batches scale the energy estimate relative to history. State is
//! in-memory only and lives for the process lifetime.

/// Smoothing factor applied to each observation (TCP SRTT-style)
pub const DEFAULT_ALPHA: f64 = 0.125;

/// Initial average duration in seconds
pub const DEFAULT_INITIAL_AVERAGE: f64 = 1.0;

/// Floor applied to sub-baseline batches
const SCALING_FLOOR: f64 = 0.8;

/// Cap applied to anomalously slow batches
const SCALING_CAP: f64 = 10.0;

/// Exponential-moving-average tracker of per-query latency
#[derive(Debug, Clone)]
pub struct DurationBaseline {
    average: f64,
    alpha: f64,
}

impl DurationBaseline {
    pub fn new(initial_average: f64, alpha: f64) -> Self {
        Self {
            average: initial_average,
            alpha,
        }
    }

    /// Fold one observed duration (seconds) into the running average
    pub fn update(&mut self, observed: f64) {
        self.average += self.alpha * (observed - self.average);
    }

    /// Current smoothed average in seconds
    pub fn average(&self) -> f64 {
        self.average
    }

    /// Scaling factor for a batch whose mean duration is `observed`.
    ///
    /// Reads the pre-update average; callers update the baseline with the
    /// same mean afterwards so a slow batch cannot hide itself.
    pub fn scaling_factor(&self, observed: f64) -> f64 {
        clamp_ratio(observed / self.average)
    }
}

impl Default for DurationBaseline {
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_AVERAGE, DEFAULT_ALPHA)
    }
}

/// Clamp a duration ratio into the scaling-factor range
fn clamp_ratio(ratio: f64) -> f64 {
    if !ratio.is_finite() {
        return 1.0;
    }
    if ratio < 1.0 {
        SCALING_FLOOR
    } else if ratio < SCALING_CAP {
        ratio
    } else {
        SCALING_CAP
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_follows_ema_rule() {
        let mut baseline = DurationBaseline::default();
        baseline.update(3.0);
        // 1.0 + 0.125 * (3.0 - 1.0)
        assert!((baseline.average() - 1.25).abs() < 1e-12);
        baseline.update(1.25);
        assert!((baseline.average() - 1.25).abs() < 1e-12);
    }

    #[test]
    fn scaling_clamps_per_reference_points() {
        let baseline = DurationBaseline::new(1.0, DEFAULT_ALPHA);
        assert_eq!(baseline.scaling_factor(0.5), 0.8);
        assert_eq!(baseline.scaling_factor(1.0), 1.0);
        assert_eq!(baseline.scaling_factor(3.0), 3.0);
        assert_eq!(baseline.scaling_factor(50.0), 10.0);
    }

    #[test]
    fn scaling_reads_pre_update_average() {
        let mut baseline = DurationBaseline::new(2.0, DEFAULT_ALPHA);
        let factor = baseline.scaling_factor(4.0);
        assert_eq!(factor, 2.0);
        baseline.update(4.0);
        assert!((baseline.average() - 2.25).abs() < 1e-12);
    }

    #[test]
    fn degenerate_ratio_scales_to_one() {
        let baseline = DurationBaseline::new(0.0, DEFAULT_ALPHA);
        assert_eq!(baseline.scaling_factor(1.0), 1.0);
    }
}
