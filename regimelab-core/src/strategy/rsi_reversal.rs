//! RSI reversal strategy.
//!
//! Mean reversion: BUY while RSI is below the oversold threshold, SELL
//! while it is above the overbought threshold. Strength scales with the
//! distance from the threshold.

use std::collections::HashMap;

use super::buffer::BarBuffer;
use super::{Strategy, StrategyError};
use crate::domain::{MarketEvent, SignalEvent, SignalKind};
use crate::indicators::rsi::rsi_of_series;

pub struct RsiReversal {
    period: usize,
    oversold: f64,
    overbought: f64,
    buffer: BarBuffer,
}

impl RsiReversal {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Result<Self, StrategyError> {
        if period < 2 {
            return Err(StrategyError::PeriodTooShort(period));
        }
        if oversold >= overbought {
            return Err(StrategyError::InvalidRsiThresholds {
                oversold,
                overbought,
            });
        }
        Ok(Self {
            period,
            oversold,
            overbought,
            buffer: BarBuffer::new(period + 20),
        })
    }

    /// RSI over the buffered closes; `None` until period + 1 bars exist.
    fn current_rsi(&self) -> Option<f64> {
        if self.buffer.len() < self.period + 1 {
            return None;
        }
        let closes = self.buffer.closes();
        let column = rsi_of_series(&closes, self.period);
        let value = *column.last()?;
        (!value.is_nan()).then_some(value)
    }
}

impl Strategy for RsiReversal {
    fn name(&self) -> &str {
        "rsi_reversal"
    }

    fn warmup_bars(&self) -> usize {
        self.period + 1
    }

    fn on_market_event(&mut self, event: &MarketEvent) -> Option<SignalEvent> {
        self.buffer.push(event.candle.clone());
        let rsi = self.current_rsi()?;

        let (kind, strength) = if rsi < self.oversold {
            (
                SignalKind::Buy,
                ((self.oversold - rsi) / self.oversold).min(1.0),
            )
        } else if rsi > self.overbought {
            (
                SignalKind::Sell,
                ((rsi - self.overbought) / (100.0 - self.overbought)).min(1.0),
            )
        } else {
            return None;
        };

        let mut metadata = HashMap::new();
        metadata.insert("rsi".to_string(), rsi);
        Some(SignalEvent {
            timestamp: event.timestamp,
            symbol: event.symbol.clone(),
            kind,
            strength,
            metadata,
        })
    }
}
