//! 3-axis market regime classifier.
//!
//! Each bar gets a trend, volatility and momentum state, a canonical full
//! label, a simplified practical label, and a confidence score. Volatility
//! thresholds adapt via rolling percentiles (see `adaptive`); all other
//! cutoffs come from `RegimeConfig`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::adaptive::AdaptiveThresholds;
use crate::domain::Candle;
use crate::indicators::bollinger::bollinger_columns;
use crate::indicators::macd::macd_columns;
use crate::indicators::{Adx, Atr, Indicator, Roc, Rsi, Sma};

/// Failed to parse one of the external regime labels (§ regime vocabulary).
#[derive(Debug, Error)]
#[error("unknown regime label: {0}")]
pub struct UnknownRegimeLabel(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendState {
    Uptrend,
    Downtrend,
    Neutral,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VolatilityState {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentumState {
    Bullish,
    Bearish,
    Weak,
}

/// Simplified practical regime, priority-mapped from the three axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SimplifiedRegime {
    #[serde(rename = "TREND_UP")]
    TrendUp,
    #[serde(rename = "TREND_DOWN")]
    TrendDown,
    #[serde(rename = "RANGE")]
    Range,
    #[serde(rename = "CHOPPY")]
    Choppy,
    #[serde(rename = "NEUTRAL")]
    Neutral,
}

impl TrendState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uptrend => "uptrend",
            Self::Downtrend => "downtrend",
            Self::Neutral => "neutral",
        }
    }
}

impl VolatilityState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::High => "high",
        }
    }
}

impl MomentumState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Bullish => "bullish",
            Self::Bearish => "bearish",
            Self::Weak => "weak",
        }
    }
}

impl SimplifiedRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TrendUp => "TREND_UP",
            Self::TrendDown => "TREND_DOWN",
            Self::Range => "RANGE",
            Self::Choppy => "CHOPPY",
            Self::Neutral => "NEUTRAL",
        }
    }
}

impl fmt::Display for SimplifiedRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SimplifiedRegime {
    type Err = UnknownRegimeLabel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TREND_UP" => Ok(Self::TrendUp),
            "TREND_DOWN" => Ok(Self::TrendDown),
            "RANGE" => Ok(Self::Range),
            "CHOPPY" => Ok(Self::Choppy),
            "NEUTRAL" => Ok(Self::Neutral),
            other => Err(UnknownRegimeLabel(other.to_string())),
        }
    }
}

/// Classification thresholds. Defaults match the reference research setup.
#[derive(Debug, Clone)]
pub struct RegimeConfig {
    pub adx_trending_threshold: f64,
    pub adx_sideways_threshold: f64,
    pub adaptive_window: usize,
    pub vol_low_percentile: f64,
    pub vol_high_percentile: f64,
    pub rsi_bullish_threshold: f64,
    pub rsi_bearish_threshold: f64,
    pub momentum_score_threshold: u32,
}

impl Default for RegimeConfig {
    fn default() -> Self {
        Self {
            adx_trending_threshold: 25.0,
            adx_sideways_threshold: 20.0,
            adaptive_window: 100,
            vol_low_percentile: 30.0,
            vol_high_percentile: 70.0,
            rsi_bullish_threshold: 55.0,
            rsi_bearish_threshold: 45.0,
            momentum_score_threshold: 2,
        }
    }
}

/// Per-bar regime classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeRecord {
    pub trend_state: TrendState,
    pub volatility_state: VolatilityState,
    pub momentum_state: MomentumState,
    pub full_regime: String,
    pub simplified_regime: SimplifiedRegime,
    pub confidence: f64,
}

impl RegimeRecord {
    fn new(
        trend: TrendState,
        volatility: VolatilityState,
        momentum: MomentumState,
        confidence: f64,
    ) -> Self {
        let full_regime = format!(
            "{}_{}VOL_{}MOM",
            trend.as_str().to_uppercase(),
            volatility.as_str().to_uppercase(),
            momentum.as_str().to_uppercase()
        );
        let simplified_regime = simplify(trend, volatility, momentum);
        Self {
            trend_state: trend,
            volatility_state: volatility,
            momentum_state: momentum,
            full_regime,
            simplified_regime,
            confidence,
        }
    }
}

/// Priority-ordered mapping from the three axes to the practical label.
fn simplify(
    trend: TrendState,
    volatility: VolatilityState,
    momentum: MomentumState,
) -> SimplifiedRegime {
    if trend == TrendState::Uptrend && momentum == MomentumState::Bullish {
        return SimplifiedRegime::TrendUp;
    }
    if trend == TrendState::Downtrend && momentum == MomentumState::Bearish {
        return SimplifiedRegime::TrendDown;
    }
    if volatility == VolatilityState::High
        && momentum == MomentumState::Weak
        && trend == TrendState::Neutral
    {
        return SimplifiedRegime::Choppy;
    }
    if trend == TrendState::Neutral && volatility == VolatilityState::Low {
        return SimplifiedRegime::Range;
    }
    SimplifiedRegime::Neutral
}

/// One bar's indicator inputs. NaN marks an undefined (warm-up) value.
#[derive(Debug, Clone, Copy)]
pub struct RegimeRow {
    pub close: f64,
    pub adx: f64,
    pub sma_50: f64,
    pub sma_200: f64,
    pub atr: f64,
    pub bb_upper: f64,
    pub bb_middle: f64,
    pub bb_lower: f64,
    pub roc: f64,
    pub macd_histogram: f64,
    pub rsi: f64,
}

/// Indicator parameters for the standard regime column set.
const REGIME_RSI_PERIOD: usize = 14;
const REGIME_ATR_PERIOD: usize = 14;
const REGIME_ADX_PERIOD: usize = 14;
const REGIME_ROC_PERIOD: usize = 10;
const REGIME_BB_PERIOD: usize = 20;
const REGIME_BB_NUM_STD: f64 = 2.0;
const REGIME_MACD_FAST: usize = 12;
const REGIME_MACD_SLOW: usize = 26;
const REGIME_MACD_SIGNAL: usize = 9;

/// The standard regime column set, one typed column per classifier input.
///
/// Computed in a single batch pass over the series; `row` assembles the
/// per-bar view the three axes consume. Built per run and discarded with
/// the classification.
#[derive(Debug, Clone)]
pub struct RegimeColumns {
    close: Vec<f64>,
    adx: Vec<f64>,
    sma_50: Vec<f64>,
    sma_200: Vec<f64>,
    atr: Vec<f64>,
    bb_upper: Vec<f64>,
    bb_middle: Vec<f64>,
    bb_lower: Vec<f64>,
    roc: Vec<f64>,
    macd_histogram: Vec<f64>,
    rsi: Vec<f64>,
}

impl RegimeColumns {
    pub fn compute(candles: &[Candle]) -> Self {
        let close: Vec<f64> = candles.iter().map(|c| c.close).collect();
        let (bb_upper, bb_middle, bb_lower) =
            bollinger_columns(&close, REGIME_BB_PERIOD, REGIME_BB_NUM_STD);
        let (_, _, macd_histogram) = macd_columns(
            &close,
            REGIME_MACD_FAST,
            REGIME_MACD_SLOW,
            REGIME_MACD_SIGNAL,
        );
        Self {
            adx: Adx::new(REGIME_ADX_PERIOD).compute(candles),
            sma_50: Sma::new(50).compute(candles),
            sma_200: Sma::new(200).compute(candles),
            atr: Atr::new(REGIME_ATR_PERIOD).compute(candles),
            roc: Roc::new(REGIME_ROC_PERIOD).compute(candles),
            rsi: Rsi::new(REGIME_RSI_PERIOD).compute(candles),
            bb_upper,
            bb_middle,
            bb_lower,
            macd_histogram,
            close,
        }
    }

    pub fn len(&self) -> usize {
        self.close.len()
    }

    pub fn is_empty(&self) -> bool {
        self.close.is_empty()
    }

    /// Per-bar view of the columns. Warm-up prefixes stay NaN and flow
    /// into the classifier's undefined-input fallbacks.
    pub fn row(&self, index: usize) -> RegimeRow {
        RegimeRow {
            close: self.close[index],
            adx: self.adx[index],
            sma_50: self.sma_50[index],
            sma_200: self.sma_200[index],
            atr: self.atr[index],
            bb_upper: self.bb_upper[index],
            bb_middle: self.bb_middle[index],
            bb_lower: self.bb_lower[index],
            roc: self.roc[index],
            macd_histogram: self.macd_histogram[index],
            rsi: self.rsi[index],
        }
    }
}

/// Event-driven regime classifier. One instance per backtest run: the
/// adaptive threshold state accumulates strictly in bar order.
#[derive(Debug, Clone)]
pub struct RegimeClassifier {
    config: RegimeConfig,
    thresholds: AdaptiveThresholds,
}

impl RegimeClassifier {
    pub fn new(config: RegimeConfig) -> Self {
        let thresholds = AdaptiveThresholds::new(config.adaptive_window);
        Self { config, thresholds }
    }

    /// Trend axis from ADX strength and the SMA ladder.
    fn detect_trend(&self, row: &RegimeRow) -> TrendState {
        if row.adx.is_nan() || row.close.is_nan() || row.sma_50.is_nan() {
            return TrendState::Neutral;
        }
        if row.adx < self.config.adx_sideways_threshold {
            return TrendState::Neutral;
        }
        if row.adx >= self.config.adx_trending_threshold {
            if !row.sma_200.is_nan() {
                if row.close > row.sma_50 && row.sma_50 > row.sma_200 {
                    return TrendState::Uptrend;
                }
                if row.close < row.sma_50 && row.sma_50 < row.sma_200 {
                    return TrendState::Downtrend;
                }
            } else {
                if row.close > row.sma_50 {
                    return TrendState::Uptrend;
                }
                if row.close < row.sma_50 {
                    return TrendState::Downtrend;
                }
            }
        }
        TrendState::Neutral
    }

    /// Volatility axis. Updates the adaptive buffers with the current bar's
    /// values first, then classifies against the refreshed percentiles.
    /// Undefined inputs leave the buffers untouched and default to low.
    fn detect_volatility(&mut self, row: &RegimeRow) -> VolatilityState {
        if row.atr.is_nan() || row.close.is_nan() || row.close == 0.0 {
            return VolatilityState::Low;
        }
        if row.bb_upper.is_nan() || row.bb_middle.is_nan() || row.bb_lower.is_nan() {
            return VolatilityState::Low;
        }

        let normalized_atr = row.atr / row.close;
        let boll_width = if row.bb_middle == 0.0 {
            0.0
        } else {
            (row.bb_upper - row.bb_lower) / row.bb_middle
        };

        self.thresholds.update(normalized_atr, boll_width);
        let t = self
            .thresholds
            .current(self.config.vol_low_percentile, self.config.vol_high_percentile);

        if normalized_atr > t.atr_p70 || boll_width > t.boll_p70 {
            return VolatilityState::High;
        }
        if normalized_atr < t.atr_p30 && boll_width < t.boll_p30 {
            return VolatilityState::Low;
        }
        VolatilityState::Low
    }

    /// Momentum axis: two of three among ROC, MACD histogram and RSI must
    /// agree on a direction.
    fn detect_momentum(&self, row: &RegimeRow) -> MomentumState {
        if row.roc.is_nan() || row.macd_histogram.is_nan() || row.rsi.is_nan() {
            return MomentumState::Weak;
        }

        let mut bullish = 0;
        let mut bearish = 0;

        if row.roc > 0.0 {
            bullish += 1;
        } else if row.roc < 0.0 {
            bearish += 1;
        }

        if row.macd_histogram > 0.0 {
            bullish += 1;
        } else if row.macd_histogram < 0.0 {
            bearish += 1;
        }

        if row.rsi > self.config.rsi_bullish_threshold {
            bullish += 1;
        } else if row.rsi < self.config.rsi_bearish_threshold {
            bearish += 1;
        }

        let threshold = self.config.momentum_score_threshold;
        if bullish >= threshold {
            MomentumState::Bullish
        } else if bearish >= threshold {
            MomentumState::Bearish
        } else {
            MomentumState::Weak
        }
    }

    /// Confidence in [0, 1]: base 0.5, adjusted by ADX strength,
    /// trend/momentum alignment and missing core indicators.
    fn confidence(&self, row: &RegimeRow, trend: TrendState, momentum: MomentumState) -> f64 {
        let mut confidence: f64 = 0.5;

        if !row.adx.is_nan() {
            if row.adx > 40.0 {
                confidence += 0.3;
            } else if row.adx >= self.config.adx_trending_threshold {
                confidence += 0.15;
            } else if row.adx < self.config.adx_sideways_threshold {
                confidence -= 0.1;
            }
        }

        let aligned_up = trend == TrendState::Uptrend && momentum == MomentumState::Bullish;
        let aligned_down = trend == TrendState::Downtrend && momentum == MomentumState::Bearish;
        if aligned_up || aligned_down {
            confidence += 0.2;
        } else if trend != TrendState::Neutral && momentum == MomentumState::Weak {
            confidence -= 0.1;
        }

        let missing = [row.adx, row.rsi, row.macd_histogram]
            .iter()
            .filter(|v| v.is_nan())
            .count();
        confidence -= missing as f64 * 0.1;

        confidence.clamp(0.0, 1.0)
    }

    /// Classify one bar from its indicator row. Mutates the adaptive
    /// threshold state, so rows must arrive in chronological order.
    pub fn classify_row(&mut self, row: &RegimeRow) -> RegimeRecord {
        let trend = self.detect_trend(row);
        let volatility = self.detect_volatility(row);
        let momentum = self.detect_momentum(row);
        let confidence = self.confidence(row, trend, momentum);
        RegimeRecord::new(trend, volatility, momentum, confidence)
    }

    /// Classify an entire series chronologically.
    ///
    /// The indicator columns are computed in one batch pass; this is
    /// equivalent to bar-by-bar classification because every indicator is
    /// prefix-stable and the adaptive state still advances bar by bar.
    pub fn classify_series(&mut self, candles: &[Candle]) -> Vec<RegimeRecord> {
        let columns = RegimeColumns::compute(candles);
        (0..columns.len())
            .map(|i| self.classify_row(&columns.row(i)))
            .collect()
    }
}

impl Default for RegimeClassifier {
    fn default() -> Self {
        Self::new(RegimeConfig::default())
    }
}
