//! Indicator predicates — the leaves of a logic tree.
//!
//! Each leaf names an indicator, its parameters, an optional component for
//! multi-output indicators, and a condition over the resulting column.

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use crate::domain::Candle;
use crate::indicators::bollinger::bollinger_columns;
use crate::indicators::macd::macd_columns;
use crate::indicators::{Atr, Ema, Indicator, Rsi, Sma, Vwap};
use crate::strategy::StrategyError;

/// Indicator dispatch for composite leaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndicatorKind {
    #[serde(rename = "RSI")]
    Rsi,
    #[serde(rename = "MACD")]
    Macd,
    #[serde(rename = "SMA")]
    Sma,
    #[serde(rename = "EMA")]
    Ema,
    #[serde(rename = "BB")]
    Bb,
    #[serde(rename = "ATR")]
    Atr,
    #[serde(rename = "VWAP")]
    Vwap,
}

impl IndicatorKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Rsi => "RSI",
            Self::Macd => "MACD",
            Self::Sma => "SMA",
            Self::Ema => "EMA",
            Self::Bb => "BB",
            Self::Atr => "ATR",
            Self::Vwap => "VWAP",
        }
    }
}

/// Typed indicator parameters; absent fields fall back to the classic
/// defaults (RSI 14, MACD 12/26/9, SMA/EMA 20, BB 20/2.0, ATR 14).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SignalParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fast: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slow: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_std: Option<f64>,
}

fn default_timeframe() -> String {
    "1h".to_string()
}

/// A single indicator predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorSignal {
    pub name: String,
    pub indicator: IndicatorKind,
    #[serde(default)]
    pub parameters: SignalParams,
    pub condition: Condition,
    /// Timeframe label for the signal; the core evaluates everything on the
    /// primary series and carries this for the persisted form.
    #[serde(default = "default_timeframe")]
    pub timeframe: String,
    /// Component selector for multi-output indicators
    /// (MACD: macd | signal | histogram; BB: upper | middle | lower).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub indicator_component: Option<String>,
}

impl IndicatorSignal {
    pub fn new(
        name: impl Into<String>,
        indicator: IndicatorKind,
        parameters: SignalParams,
        condition: Condition,
    ) -> Self {
        Self {
            name: name.into(),
            indicator,
            parameters,
            condition,
            timeframe: default_timeframe(),
            indicator_component: None,
        }
    }

    pub fn with_component(mut self, component: impl Into<String>) -> Self {
        self.indicator_component = Some(component.into());
        self
    }

    /// Check the component selector against the indicator kind and the
    /// periods against their construction bounds.
    pub fn validate(&self) -> Result<(), StrategyError> {
        let valid: &[&str] = match self.indicator {
            IndicatorKind::Macd => &["macd", "signal", "histogram"],
            IndicatorKind::Bb => &["upper", "middle", "lower"],
            _ => &[],
        };
        if let Some(component) = &self.indicator_component {
            if !valid.contains(&component.as_str()) {
                return Err(StrategyError::InvalidComponent {
                    indicator: self.indicator.as_str().to_string(),
                    component: component.clone(),
                });
            }
        }
        if let Some(period) = self.parameters.period {
            if period < 2 {
                return Err(StrategyError::PeriodTooShort(period));
            }
        }
        if let (Some(fast), Some(slow)) = (self.parameters.fast, self.parameters.slow) {
            if fast >= slow {
                return Err(StrategyError::FastNotBelowSlow { fast, slow });
            }
        }
        if let Some(num_std) = self.parameters.num_std {
            if num_std <= 0.0 {
                return Err(StrategyError::InvalidNumStd(num_std));
            }
        }
        Ok(())
    }

    /// Bars before this predicate's indicator column is defined.
    pub fn lookback(&self) -> usize {
        let p = &self.parameters;
        match self.indicator {
            IndicatorKind::Rsi => p.period.unwrap_or(14),
            IndicatorKind::Macd => {
                let slow = p.slow.unwrap_or(26);
                match self.indicator_component.as_deref() {
                    Some("signal") | Some("histogram") => slow + p.signal.unwrap_or(9) - 2,
                    _ => slow - 1,
                }
            }
            IndicatorKind::Sma | IndicatorKind::Ema => p.period.unwrap_or(20) - 1,
            IndicatorKind::Bb => p.period.unwrap_or(20) - 1,
            IndicatorKind::Atr => p.period.unwrap_or(14),
            IndicatorKind::Vwap => 0,
        }
    }

    /// Compute this predicate's indicator column over the candles.
    pub fn column(&self, candles: &[Candle]) -> Vec<f64> {
        let p = &self.parameters;
        match self.indicator {
            IndicatorKind::Rsi => Rsi::new(p.period.unwrap_or(14)).compute(candles),
            IndicatorKind::Macd => {
                let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
                let (line, signal, histogram) = macd_columns(
                    &closes,
                    p.fast.unwrap_or(12),
                    p.slow.unwrap_or(26),
                    p.signal.unwrap_or(9),
                );
                match self.indicator_component.as_deref() {
                    Some("signal") => signal,
                    Some("histogram") => histogram,
                    _ => line,
                }
            }
            IndicatorKind::Sma => Sma::new(p.period.unwrap_or(20)).compute(candles),
            IndicatorKind::Ema => Ema::new(p.period.unwrap_or(20)).compute(candles),
            IndicatorKind::Bb => {
                let closes: Vec<f64> = candles.iter().map(|c| c.close).collect();
                let (upper, middle, lower) =
                    bollinger_columns(&closes, p.period.unwrap_or(20), p.num_std.unwrap_or(2.0));
                match self.indicator_component.as_deref() {
                    Some("upper") => upper,
                    Some("lower") => lower,
                    _ => middle,
                }
            }
            IndicatorKind::Atr => Atr::new(p.period.unwrap_or(14)).compute(candles),
            IndicatorKind::Vwap => Vwap::new().compute(candles),
        }
    }

    /// Evaluate the predicate at one bar of the given history.
    pub fn evaluate_at(&self, candles: &[Candle], index: usize) -> bool {
        let column = self.column(candles);
        let current = column[index];
        let previous = if index > 0 {
            Some(column[index - 1])
        } else {
            None
        };
        self.condition.evaluate(current, previous)
    }

    /// Evaluate the predicate across the whole history.
    pub fn evaluate_series(&self, candles: &[Candle]) -> Vec<bool> {
        self.condition.evaluate_series(&self.column(candles))
    }
}
