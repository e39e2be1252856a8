//! Moving average crossover strategy.
//!
//! BUY on a bullish cross (prev_fast ≤ prev_slow and fast > slow), SELL on
//! the mirror-image bearish cross. Trend-following; whipsaws in ranges.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use super::buffer::{BarBuffer, EmaState};
use super::{Strategy, StrategyError};
use crate::domain::{MarketEvent, SignalEvent, SignalKind};

/// Which moving average flavor drives the cross.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum MaType {
    Sma,
    Ema,
}

impl FromStr for MaType {
    type Err = StrategyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SMA" => Ok(Self::Sma),
            "EMA" => Ok(Self::Ema),
            other => Err(StrategyError::UnknownMaType(other.to_string())),
        }
    }
}

pub struct MaCrossover {
    fast_period: usize,
    slow_period: usize,
    ma_type: MaType,
    buffer: BarBuffer,
    fast_ema: EmaState,
    slow_ema: EmaState,
    prev_fast: Option<f64>,
    prev_slow: Option<f64>,
}

impl MaCrossover {
    pub fn new(fast_period: usize, slow_period: usize, ma_type: MaType) -> Result<Self, StrategyError> {
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
            ma_type,
            buffer: BarBuffer::new(slow_period + 10),
            fast_ema: EmaState::new(fast_period),
            slow_ema: EmaState::new(slow_period),
            prev_fast: None,
            prev_slow: None,
        })
    }

    fn current_mas(&mut self, close: f64) -> Option<(f64, f64)> {
        match self.ma_type {
            MaType::Sma => {
                if self.buffer.len() < self.slow_period {
                    return None;
                }
                Some((
                    self.buffer.sma(self.fast_period)?,
                    self.buffer.sma(self.slow_period)?,
                ))
            }
            MaType::Ema => {
                let fast = self.fast_ema.update(close);
                let slow = self.slow_ema.update(close);
                Some((fast?, slow?))
            }
        }
    }
}

impl Strategy for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn warmup_bars(&self) -> usize {
        // One extra bar for the previous-value comparison.
        self.slow_period + 1
    }

    fn on_market_event(&mut self, event: &MarketEvent) -> Option<SignalEvent> {
        self.buffer.push(event.candle.clone());
        let (fast, slow) = self.current_mas(event.candle.close)?;

        let mut signal = None;
        if let (Some(prev_fast), Some(prev_slow)) = (self.prev_fast, self.prev_slow) {
            let kind = if prev_fast <= prev_slow && fast > slow {
                Some(SignalKind::Buy)
            } else if prev_fast >= prev_slow && fast < slow {
                Some(SignalKind::Sell)
            } else {
                None
            };

            if let Some(kind) = kind {
                let mut metadata = HashMap::new();
                metadata.insert("fast_ma".to_string(), fast);
                metadata.insert("slow_ma".to_string(), slow);
                metadata.insert("prev_fast_ma".to_string(), prev_fast);
                metadata.insert("prev_slow_ma".to_string(), prev_slow);
                signal = Some(SignalEvent {
                    timestamp: event.timestamp,
                    symbol: event.symbol.clone(),
                    kind,
                    strength: 1.0,
                    metadata,
                });
            }
        }

        self.prev_fast = Some(fast);
        self.prev_slow = Some(slow);
        signal
    }
}
