//! Stochastic Oscillator.
//!
//! Raw %K = 100 × (close − lowest_low) / (highest_high − lowest_low) over
//! the lookback window; smoothed %K = SMA(k_smooth) of raw; %D =
//! SMA(d_smooth) of smoothed %K. Undefined when the window has zero range.

use super::sma::sma_of_series;
use super::Indicator;
use crate::domain::Candle;

/// Which line an instance emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StochasticOutput {
    K,
    D,
}

#[derive(Debug, Clone)]
pub struct Stochastic {
    period: usize,
    k_smooth: usize,
    d_smooth: usize,
    output: StochasticOutput,
    name: String,
}

impl Stochastic {
    pub fn new(period: usize, k_smooth: usize, d_smooth: usize, output: StochasticOutput) -> Self {
        assert!(
            period >= 1 && k_smooth >= 1 && d_smooth >= 1,
            "Stochastic periods must be >= 1"
        );
        let suffix = match output {
            StochasticOutput::K => "k",
            StochasticOutput::D => "d",
        };
        Self {
            period,
            k_smooth,
            d_smooth,
            output,
            name: format!("stoch_{period}_{suffix}"),
        }
    }
}

impl Indicator for Stochastic {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        let k = self.period + self.k_smooth - 2;
        match self.output {
            StochasticOutput::K => k,
            StochasticOutput::D => k + self.d_smooth - 1,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let mut raw = vec![f64::NAN; n];
        if n >= self.period {
            for i in (self.period - 1)..n {
                let window = &candles[i + 1 - self.period..=i];
                let highest = window.iter().map(|c| c.high).fold(f64::MIN, f64::max);
                let lowest = window.iter().map(|c| c.low).fold(f64::MAX, f64::min);
                let range = highest - lowest;
                if range > 0.0 {
                    raw[i] = 100.0 * (candles[i].close - lowest) / range;
                }
            }
        }

        let k = sma_of_series(&raw, self.k_smooth);
        match self.output {
            StochasticOutput::K => k,
            StochasticOutput::D => sma_of_series(&k, self.d_smooth),
        }
    }
}
