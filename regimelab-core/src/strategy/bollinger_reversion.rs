//! Bollinger band mean-reversion strategy.
//!
//! BUY when the close sits within `touch_threshold` of the lower band,
//! SELL within the same threshold of the upper band. An upper-band touch
//! wins when a degenerate bar satisfies both.

use std::collections::HashMap;

use super::buffer::BarBuffer;
use super::{Strategy, StrategyError};
use crate::domain::{MarketEvent, SignalEvent, SignalKind};

pub struct BollingerReversion {
    period: usize,
    num_std: f64,
    touch_threshold: f64,
    buffer: BarBuffer,
}

impl BollingerReversion {
    pub fn new(period: usize, num_std: f64, touch_threshold: f64) -> Result<Self, StrategyError> {
        if period < 2 {
            return Err(StrategyError::PeriodTooShort(period));
        }
        if num_std <= 0.0 {
            return Err(StrategyError::InvalidNumStd(num_std));
        }
        Ok(Self {
            period,
            num_std,
            touch_threshold,
            buffer: BarBuffer::new(period + 10),
        })
    }

    /// (middle, upper, lower) over the buffered window, population std.
    fn current_bands(&self) -> Option<(f64, f64, f64)> {
        if self.buffer.len() < self.period {
            return None;
        }
        let closes = self.buffer.closes();
        let window = &closes[closes.len() - self.period..];
        let middle = window.iter().sum::<f64>() / self.period as f64;
        let variance =
            window.iter().map(|v| (v - middle).powi(2)).sum::<f64>() / self.period as f64;
        let std = variance.sqrt();
        Some((middle, middle + self.num_std * std, middle - self.num_std * std))
    }
}

impl Strategy for BollingerReversion {
    fn name(&self) -> &str {
        "bollinger_reversion"
    }

    fn warmup_bars(&self) -> usize {
        self.period
    }

    fn on_market_event(&mut self, event: &MarketEvent) -> Option<SignalEvent> {
        self.buffer.push(event.candle.clone());
        let (middle, upper, lower) = self.current_bands()?;

        let band_width = upper - lower;
        if band_width <= 0.0 {
            // Collapsed bands (constant window): no reversion signal.
            return None;
        }

        let close = event.candle.close;
        let price_position = (close - lower) / band_width;

        let mut metadata = HashMap::new();
        metadata.insert("price".to_string(), close);
        metadata.insert("lower_band".to_string(), lower);
        metadata.insert("middle_band".to_string(), middle);
        metadata.insert("upper_band".to_string(), upper);
        metadata.insert("price_position".to_string(), price_position);

        let mut signal = None;

        let lower_distance = (close - lower) / lower;
        if lower_distance <= self.touch_threshold {
            signal = Some(SignalEvent {
                timestamp: event.timestamp,
                symbol: event.symbol.clone(),
                kind: SignalKind::Buy,
                strength: (1.0 - price_position).clamp(0.0, 1.0),
                metadata: metadata.clone(),
            });
        }

        let upper_distance = (upper - close) / upper;
        if upper_distance <= self.touch_threshold {
            signal = Some(SignalEvent {
                timestamp: event.timestamp,
                symbol: event.symbol.clone(),
                kind: SignalKind::Sell,
                strength: price_position.clamp(0.0, 1.0),
                metadata,
            });
        }

        signal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;

    fn feed(strategy: &mut BollingerReversion, closes: &[f64]) -> Vec<SignalEvent> {
        make_candles(closes)
            .into_iter()
            .filter_map(|candle| {
                let event = MarketEvent {
                    timestamp: candle.open_time,
                    symbol: "TEST".into(),
                    candle,
                    regime: None,
                };
                strategy.on_market_event(&event)
            })
            .collect()
    }

    #[test]
    fn rejects_bad_parameters() {
        assert!(matches!(
            BollingerReversion::new(1, 2.0, 0.01),
            Err(StrategyError::PeriodTooShort(1))
        ));
        assert!(matches!(
            BollingerReversion::new(20, 0.0, 0.01),
            Err(StrategyError::InvalidNumStd(_))
        ));
    }

    #[test]
    fn constant_series_is_silent() {
        let mut strategy = BollingerReversion::new(5, 2.0, 0.01).unwrap();
        let signals = feed(&mut strategy, &vec![100.0; 30]);
        assert!(signals.is_empty());
    }

    #[test]
    fn drop_below_lower_band_buys() {
        // Mild noise, then a sharp drop through the lower band.
        let mut closes: Vec<f64> = (0..10)
            .map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        closes.push(90.0);

        let mut strategy = BollingerReversion::new(5, 2.0, 0.01).unwrap();
        let signals = feed(&mut strategy, &closes);
        let last = signals.last().expect("expected a signal on the drop");
        assert_eq!(last.kind, SignalKind::Buy);
        assert!(last.strength > 0.5);
    }

    #[test]
    fn spike_above_upper_band_sells() {
        let mut closes: Vec<f64> = (0..10)
            .map(|i| 100.0 + if i % 2 == 0 { 0.5 } else { -0.5 })
            .collect();
        closes.push(110.0);

        let mut strategy = BollingerReversion::new(5, 2.0, 0.01).unwrap();
        let signals = feed(&mut strategy, &closes);
        let last = signals.last().expect("expected a signal on the spike");
        assert_eq!(last.kind, SignalKind::Sell);
    }
}
