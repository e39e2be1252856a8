//! Volume Weighted Average Price (VWAP).
//!
//! Cumulative typical price × volume over cumulative volume, from the
//! beginning of the series. Undefined while cumulative volume is zero.

use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Vwap {
    name: String,
}

impl Vwap {
    pub fn new() -> Self {
        Self {
            name: "vwap".to_string(),
        }
    }
}

impl Default for Vwap {
    fn default() -> Self {
        Self::new()
    }
}

impl Indicator for Vwap {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        0
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let mut result = vec![f64::NAN; candles.len()];
        let mut cum_pv = 0.0;
        let mut cum_volume = 0.0;
        for (i, candle) in candles.iter().enumerate() {
            cum_pv += candle.typical_price() * candle.volume;
            cum_volume += candle.volume;
            if cum_volume > 0.0 {
                result[i] = cum_pv / cum_volume;
            }
        }
        result
    }
}
