//! Moving Average Convergence Divergence (MACD).
//!
//! MACD line = EMA(fast) − EMA(slow); signal = EMA(signal_period) of the
//! MACD line; histogram = MACD − signal. Exposed as one instance per
//! component.

use super::ema::ema_of_series;
use super::Indicator;
use crate::domain::Candle;

/// Which MACD component an instance emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacdOutput {
    Line,
    Signal,
    Histogram,
}

impl MacdOutput {
    fn suffix(&self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::Signal => "signal",
            Self::Histogram => "histogram",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Macd {
    fast: usize,
    slow: usize,
    signal: usize,
    output: MacdOutput,
    name: String,
}

impl Macd {
    pub fn new(fast: usize, slow: usize, signal: usize, output: MacdOutput) -> Self {
        assert!(fast >= 1 && slow >= 1 && signal >= 1, "MACD periods must be >= 1");
        assert!(fast < slow, "MACD fast period must be < slow period");
        Self {
            fast,
            slow,
            signal,
            output,
            name: format!("macd_{fast}_{slow}_{signal}_{}", output.suffix()),
        }
    }
}

impl Indicator for Macd {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        match self.output {
            MacdOutput::Line => self.slow - 1,
            MacdOutput::Signal | MacdOutput::Histogram => self.slow + self.signal - 2,
        }
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let (line, signal, histogram) = macd_columns(&closes, self.fast, self.slow, self.signal);
        match self.output {
            MacdOutput::Line => line,
            MacdOutput::Signal => signal,
            MacdOutput::Histogram => histogram,
        }
    }
}

/// All three MACD columns at once. Shared with the regime classifier and
/// the composite signal layer.
pub fn macd_columns(
    closes: &[f64],
    fast: usize,
    slow: usize,
    signal_period: usize,
) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let n = closes.len();
    let ema_fast = ema_of_series(closes, fast);
    let ema_slow = ema_of_series(closes, slow);

    let mut line = vec![f64::NAN; n];
    for i in 0..n {
        if !ema_fast[i].is_nan() && !ema_slow[i].is_nan() {
            line[i] = ema_fast[i] - ema_slow[i];
        }
    }

    let signal = ema_of_series(&line, signal_period);

    let mut histogram = vec![f64::NAN; n];
    for i in 0..n {
        if !line[i].is_nan() && !signal[i].is_nan() {
            histogram[i] = line[i] - signal[i];
        }
    }

    (line, signal, histogram)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn macd_line_warmup_is_slow_minus_one() {
        let candles = make_candles(&(0..20).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let result = Macd::new(3, 6, 4, MacdOutput::Line).compute(&candles);
        for i in 0..5 {
            assert!(result[i].is_nan(), "expected NaN at index {i}");
        }
        assert!(!result[5].is_nan());
    }

    #[test]
    fn macd_signal_warmup_adds_signal_period() {
        let candles = make_candles(&(0..20).map(|i| 100.0 + i as f64).collect::<Vec<_>>());
        let macd = Macd::new(3, 6, 4, MacdOutput::Signal);
        assert_eq!(macd.lookback(), 8);
        let result = macd.compute(&candles);
        for i in 0..8 {
            assert!(result[i].is_nan(), "expected NaN at index {i}");
        }
        assert!(!result[8].is_nan());
    }

    #[test]
    fn histogram_is_line_minus_signal() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let (line, signal, histogram) = macd_columns(&closes, 3, 6, 4);
        for i in 0..30 {
            if !histogram[i].is_nan() {
                assert_approx(histogram[i], line[i] - signal[i], DEFAULT_EPSILON);
            }
        }
    }

    #[test]
    fn constant_series_has_zero_macd() {
        let candles = make_candles(&[100.0; 20]);
        let result = Macd::new(3, 6, 4, MacdOutput::Histogram).compute(&candles);
        assert_approx(result[19], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    #[should_panic(expected = "fast period must be < slow")]
    fn macd_rejects_fast_not_below_slow() {
        let _ = Macd::new(6, 6, 4, MacdOutput::Line);
    }
}
