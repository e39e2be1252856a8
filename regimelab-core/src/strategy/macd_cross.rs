//! MACD signal-line cross strategy.
//!
//! BUY when the MACD line crosses above its signal line, SELL when it
//! crosses below. Strength scales with the histogram magnitude, capped
//! at 1.

use std::collections::HashMap;

use super::buffer::EmaState;
use super::{Strategy, StrategyError};
use crate::domain::{MarketEvent, SignalEvent, SignalKind};

/// Histogram magnitude that maps to full signal strength.
const FULL_STRENGTH_HISTOGRAM: f64 = 10.0;

pub struct MacdCross {
    fast_period: usize,
    slow_period: usize,
    signal_period: usize,
    fast_ema: EmaState,
    slow_ema: EmaState,
    signal_ema: EmaState,
    prev_macd: Option<f64>,
    prev_signal: Option<f64>,
}

impl MacdCross {
    pub fn new(
        fast_period: usize,
        slow_period: usize,
        signal_period: usize,
    ) -> Result<Self, StrategyError> {
        if fast_period < 2 {
            return Err(StrategyError::PeriodTooShort(fast_period));
        }
        if fast_period >= slow_period {
            return Err(StrategyError::FastNotBelowSlow {
                fast: fast_period,
                slow: slow_period,
            });
        }
        Ok(Self {
            fast_period,
            slow_period,
            signal_period,
            fast_ema: EmaState::new(fast_period),
            slow_ema: EmaState::new(slow_period),
            signal_ema: EmaState::new(signal_period),
            prev_macd: None,
            prev_signal: None,
        })
    }
}

impl Strategy for MacdCross {
    fn name(&self) -> &str {
        "macd_cross"
    }

    fn warmup_bars(&self) -> usize {
        self.slow_period + self.signal_period
    }

    fn on_market_event(&mut self, event: &MarketEvent) -> Option<SignalEvent> {
        let close = event.candle.close;
        let fast = self.fast_ema.update(close);
        let slow = self.slow_ema.update(close);
        let (Some(fast), Some(slow)) = (fast, slow) else {
            return None;
        };

        let macd = fast - slow;
        let Some(signal_line) = self.signal_ema.update(macd) else {
            return None;
        };

        let mut signal_event = None;
        if let (Some(prev_macd), Some(prev_signal)) = (self.prev_macd, self.prev_signal) {
            let kind = if prev_macd <= prev_signal && macd > signal_line {
                Some(SignalKind::Buy)
            } else if prev_macd >= prev_signal && macd < signal_line {
                Some(SignalKind::Sell)
            } else {
                None
            };

            if let Some(kind) = kind {
                let histogram = macd - signal_line;
                let mut metadata = HashMap::new();
                metadata.insert("macd".to_string(), macd);
                metadata.insert("signal_line".to_string(), signal_line);
                metadata.insert("histogram".to_string(), histogram);
                signal_event = Some(SignalEvent {
                    timestamp: event.timestamp,
                    symbol: event.symbol.clone(),
                    kind,
                    strength: (histogram.abs() / FULL_STRENGTH_HISTOGRAM).min(1.0),
                    metadata,
                });
            }
        }

        self.prev_macd = Some(macd);
        self.prev_signal = Some(signal_line);
        signal_event
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::macd::macd_columns;
    use crate::indicators::make_candles;

    fn feed(strategy: &mut MacdCross, closes: &[f64]) -> Vec<(usize, SignalKind)> {
        let mut signals = Vec::new();
        for (i, candle) in make_candles(closes).into_iter().enumerate() {
            let event = MarketEvent {
                timestamp: candle.open_time,
                symbol: "TEST".into(),
                candle,
                regime: None,
            };
            if let Some(signal) = strategy.on_market_event(&event) {
                signals.push((i, signal.kind));
            }
        }
        signals
    }

    #[test]
    fn rejects_bad_periods() {
        assert!(matches!(
            MacdCross::new(26, 12, 9),
            Err(StrategyError::FastNotBelowSlow { .. })
        ));
        assert!(matches!(
            MacdCross::new(1, 26, 9),
            Err(StrategyError::PeriodTooShort(1))
        ));
    }

    #[test]
    fn incremental_macd_matches_batch_columns() {
        let closes: Vec<f64> = (0..60)
            .map(|i| 100.0 + 8.0 * (i as f64 * 0.25).sin())
            .collect();
        let candles = make_candles(&closes);
        let (line, signal, _) = macd_columns(&closes, 3, 7, 4);

        let mut strategy = MacdCross::new(3, 7, 4).unwrap();
        for (i, candle) in candles.into_iter().enumerate() {
            let event = MarketEvent {
                timestamp: candle.open_time,
                symbol: "TEST".into(),
                candle,
                regime: None,
            };
            strategy.on_market_event(&event);
            match strategy.prev_macd {
                Some(value) => assert!(
                    (value - line[i]).abs() < 1e-10,
                    "line mismatch at {i}: {value} vs {}",
                    line[i]
                ),
                None => assert!(line[i].is_nan() || signal[i].is_nan()),
            }
        }
    }

    #[test]
    fn oscillation_triggers_both_crosses() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + 10.0 * (i as f64 * std::f64::consts::TAU / 40.0).sin())
            .collect();
        let mut strategy = MacdCross::new(5, 12, 4).unwrap();
        let signals = feed(&mut strategy, &closes);
        assert!(signals.iter().any(|(_, k)| *k == SignalKind::Buy));
        assert!(signals.iter().any(|(_, k)| *k == SignalKind::Sell));
    }

    #[test]
    fn constant_series_never_crosses() {
        let mut strategy = MacdCross::new(5, 12, 4).unwrap();
        let signals = feed(&mut strategy, &vec![100.0; 80]);
        assert!(signals.is_empty());
    }
}
