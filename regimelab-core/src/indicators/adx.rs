//! Average Directional Index (ADX).
//!
//! Directional movement per bar: up = high − prev_high, down = prev_low −
//! low. When both are positive the strictly larger one wins; if they are
//! equal both are zeroed. ±DI = 100 × N-period mean of ±DM over the
//! N-period mean of TR; DX = 100 × |+DI − −DI| / (+DI + −DI); ADX is a
//! Wilder recursion over DX seeded from the mean of the first N DX values.
//! Output is clamped to [0, 100]. First defined value at index 2N − 1.

use super::atr::true_ranges;
use super::Indicator;
use crate::domain::Candle;

#[derive(Debug, Clone)]
pub struct Adx {
    period: usize,
    name: String,
}

impl Adx {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "ADX period must be >= 1");
        Self {
            period,
            name: format!("adx_{period}"),
        }
    }
}

impl Indicator for Adx {
    fn name(&self) -> &str {
        &self.name
    }

    fn lookback(&self) -> usize {
        2 * self.period - 1
    }

    fn compute(&self, candles: &[Candle]) -> Vec<f64> {
        let n = candles.len();
        let period = self.period;
        let mut result = vec![f64::NAN; n];
        if n < 2 {
            return result;
        }

        let tr = true_ranges(candles);
        let mut plus_dm = vec![f64::NAN; n];
        let mut minus_dm = vec![f64::NAN; n];
        for i in 1..n {
            let up = candles[i].high - candles[i - 1].high;
            let down = candles[i - 1].low - candles[i].low;
            let mut plus = up.max(0.0);
            let mut minus = down.max(0.0);
            if plus > 0.0 && minus > 0.0 {
                if plus > minus {
                    minus = 0.0;
                } else if minus > plus {
                    plus = 0.0;
                } else {
                    plus = 0.0;
                    minus = 0.0;
                }
            }
            plus_dm[i] = plus;
            minus_dm[i] = minus;
        }

        let mut dx = vec![f64::NAN; n];
        for i in period..n {
            let window = (i + 1 - period)..=i;
            let atr: f64 = tr[window.clone()].iter().sum::<f64>() / period as f64;
            let plus: f64 = plus_dm[window.clone()].iter().sum::<f64>() / period as f64;
            let minus: f64 = minus_dm[window].iter().sum::<f64>() / period as f64;

            let plus_di = if atr > 0.0 { 100.0 * plus / atr } else { 0.0 };
            let minus_di = if atr > 0.0 { 100.0 * minus / atr } else { 0.0 };
            let di_sum = plus_di + minus_di;
            dx[i] = if di_sum > 0.0 {
                (100.0 * (plus_di - minus_di).abs() / di_sum).min(100.0)
            } else {
                0.0
            };
        }

        let seed_index = 2 * period - 1;
        if n <= seed_index {
            return result;
        }
        let seed: f64 = dx[period..=seed_index].iter().sum::<f64>() / period as f64;
        result[seed_index] = seed.clamp(0.0, 100.0);

        let mut prev = seed;
        for i in (seed_index + 1)..n {
            let adx = (prev * (period as f64 - 1.0) + dx[i]) / period as f64;
            result[i] = adx.clamp(0.0, 100.0);
            prev = adx;
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::{assert_approx, make_candles, DEFAULT_EPSILON};

    #[test]
    fn adx_warmup_is_two_periods() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let candles = make_candles(&closes);
        let adx = Adx::new(5);
        assert_eq!(adx.lookback(), 9);
        let result = adx.compute(&candles);
        for i in 0..9 {
            assert!(result[i].is_nan(), "expected NaN at index {i}");
        }
        assert!(!result[9].is_nan());
    }

    #[test]
    fn steady_uptrend_saturates_adx() {
        // Highs and lows both rise every bar: −DM is always 0, so DX = 100
        // at every defined index and the recursion stays pinned at 100.
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let candles = make_candles(&closes);
        let result = Adx::new(5).compute(&candles);
        assert_approx(result[9], 100.0, DEFAULT_EPSILON);
        assert_approx(result[29], 100.0, DEFAULT_EPSILON);
    }

    #[test]
    fn flat_series_has_zero_adx() {
        let candles = make_candles(&[100.0; 25]);
        let result = Adx::new(5).compute(&candles);
        assert_approx(result[24], 0.0, DEFAULT_EPSILON);
    }

    #[test]
    fn adx_is_bounded() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + 10.0 * (i as f64 * 0.4).sin())
            .collect();
        let candles = make_candles(&closes);
        let result = Adx::new(14).compute(&candles);
        for value in result.iter().filter(|v| !v.is_nan()) {
            assert!((0.0..=100.0).contains(value), "ADX out of bounds: {value}");
        }
    }

    #[test]
    fn equal_directional_moves_cancel() {
        // Expanding range: high +2, low -2 each bar → up == down, both
        // zeroed, ADX 0.
        let mut candles = make_candles(&[100.0; 15]);
        for (i, candle) in candles.iter_mut().enumerate() {
            candle.high = 110.0 + 2.0 * i as f64;
            candle.low = 90.0 - 2.0 * i as f64;
        }
        let result = Adx::new(5).compute(&candles);
        assert_approx(result[14], 0.0, DEFAULT_EPSILON);
    }
}
