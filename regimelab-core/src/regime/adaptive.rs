//! Adaptive volatility thresholds.
//!
//! Two bounded FIFO buffers (normalized ATR and Bollinger width) feed
//! rolling percentile estimates. While the sample is too small the
//! thresholds fall back to conservative fixed defaults. State is owned by
//! one classifier instance and mutates monotonically during a run.

use std::collections::VecDeque;

/// Defaults used until the buffers hold enough samples.
const DEFAULT_ATR_P30: f64 = 0.005;
const DEFAULT_ATR_P70: f64 = 0.015;
const DEFAULT_BOLL_P30: f64 = 0.02;
const DEFAULT_BOLL_P70: f64 = 0.06;

/// Current percentile thresholds for both volatility metrics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityThresholds {
    pub atr_p30: f64,
    pub atr_p70: f64,
    pub boll_p30: f64,
    pub boll_p70: f64,
}

/// Rolling percentile estimator over the last `window` bars.
#[derive(Debug, Clone)]
pub struct AdaptiveThresholds {
    window: usize,
    atr_buffer: VecDeque<f64>,
    boll_buffer: VecDeque<f64>,
}

impl AdaptiveThresholds {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            atr_buffer: VecDeque::with_capacity(window + 1),
            boll_buffer: VecDeque::with_capacity(window + 1),
        }
    }

    /// Push the current bar's values, evicting the oldest sample once the
    /// buffers are full.
    pub fn update(&mut self, atr_normalized: f64, boll_width: f64) {
        self.atr_buffer.push_back(atr_normalized);
        self.boll_buffer.push_back(boll_width);
        if self.atr_buffer.len() > self.window {
            self.atr_buffer.pop_front();
            self.boll_buffer.pop_front();
        }
    }

    pub fn sample_count(&self) -> usize {
        self.atr_buffer.len()
    }

    /// Enough data for reliable percentiles: at least min(window/2, 30)
    /// samples.
    pub fn has_sufficient_data(&self) -> bool {
        self.sample_count() >= (self.window / 2).min(30)
    }

    /// Current thresholds at the given percentile pair, or the conservative
    /// defaults while the sample is small.
    pub fn current(&self, low_pct: f64, high_pct: f64) -> VolatilityThresholds {
        if !self.has_sufficient_data() {
            return VolatilityThresholds {
                atr_p30: DEFAULT_ATR_P30,
                atr_p70: DEFAULT_ATR_P70,
                boll_p30: DEFAULT_BOLL_P30,
                boll_p70: DEFAULT_BOLL_P70,
            };
        }
        let atr: Vec<f64> = self.atr_buffer.iter().copied().collect();
        let boll: Vec<f64> = self.boll_buffer.iter().copied().collect();
        VolatilityThresholds {
            atr_p30: percentile(&atr, low_pct),
            atr_p70: percentile(&atr, high_pct),
            boll_p30: percentile(&boll, low_pct),
            boll_p70: percentile(&boll, high_pct),
        }
    }
}

/// Percentile with linear interpolation between adjacent order statistics.
fn percentile(values: &[f64], pct: f64) -> f64 {
    debug_assert!(!values.is_empty());
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = pct / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return sorted[lo];
    }
    let weight = rank - lo as f64;
    sorted[lo] * (1.0 - weight) + sorted[hi] * weight
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_linearly() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 5.0);
        assert_eq!(percentile(&values, 50.0), 3.0);
        // rank = 0.3 * 4 = 1.2 → 2.0 + 0.2 * (3.0 - 2.0)
        assert!((percentile(&values, 30.0) - 2.2).abs() < 1e-12);
    }

    #[test]
    fn defaults_until_sufficient_data() {
        let mut thresholds = AdaptiveThresholds::new(100);
        for _ in 0..29 {
            thresholds.update(0.5, 0.5);
        }
        assert!(!thresholds.has_sufficient_data());
        let t = thresholds.current(30.0, 70.0);
        assert_eq!(t.atr_p30, DEFAULT_ATR_P30);
        assert_eq!(t.boll_p70, DEFAULT_BOLL_P70);

        thresholds.update(0.5, 0.5);
        assert!(thresholds.has_sufficient_data());
        let t = thresholds.current(30.0, 70.0);
        assert_eq!(t.atr_p30, 0.5);
        assert_eq!(t.atr_p70, 0.5);
    }

    #[test]
    fn small_window_lowers_the_sample_requirement() {
        let mut thresholds = AdaptiveThresholds::new(20);
        for _ in 0..10 {
            thresholds.update(0.01, 0.02);
        }
        // min(20/2, 30) = 10 samples suffice.
        assert!(thresholds.has_sufficient_data());
    }

    #[test]
    fn buffers_evict_oldest_beyond_window() {
        let mut thresholds = AdaptiveThresholds::new(50);
        for i in 0..60 {
            thresholds.update(i as f64, i as f64);
        }
        assert_eq!(thresholds.sample_count(), 50);
        let t = thresholds.current(30.0, 70.0);
        // Values 10..59 remain: p30 rank = 0.3 * 49 = 14.7 → 24.7.
        assert!((t.atr_p30 - 24.7).abs() < 1e-9);
        assert!((t.atr_p70 - (10.0 + 0.7 * 49.0)).abs() < 1e-9);
    }

    #[test]
    fn percentiles_track_the_distribution() {
        let mut thresholds = AdaptiveThresholds::new(100);
        for i in 0..100 {
            thresholds.update(0.001 * i as f64, 0.01 * i as f64);
        }
        let t = thresholds.current(30.0, 70.0);
        assert!(t.atr_p30 < t.atr_p70);
        assert!(t.boll_p30 < t.boll_p70);
        assert!((t.atr_p30 - 0.001 * 29.7).abs() < 1e-9);
    }
}
