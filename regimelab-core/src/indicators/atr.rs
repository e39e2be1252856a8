//! Average True Range (ATR).
//!
//! TR = max(high − low, |high − prev_close|, |low − prev_close|), undefined
//! at bar 0 (no previous close). ATR = N-period simple mean of TR, so the
//! first defined value is at index N.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Atr {
    period: usize,
    name: String,
}

impl Atr {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ATR period must be >= 1");
        Self {
            period,
            name: format!("atr_{period}"),
        }
    }
}

impl Indicator for Atr {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        self.period
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let tr = true_ranges(candles);
        let mut result = vec![f64::NAN; n];

        for i in self.period..n {
            let window = &tr[i + 1 - self.period..=i];
            result[i] = window.iter().sum::<f64>() / self.period as f64;
        }
        result
    }
}

/// Per-bar true range; NaN at bar 0.
pub fn true_ranges(candles: &[Candle]) -> Vec<f64> {
    let mut tr = vec![f64::NAN; candles.len()];
    for i in 1..candles.len() {
        let prev_close = candles[i - 1].close;
        let c = &candles[i];
        tr[i] = (c.high - c.low)
            .max((c.high - prev_close).abs())
            .max((c.low - prev_close).abs());
    }
    tr
}
