//! Trading strategies.
//!
//! A strategy observes one bar at a time and optionally emits a signal. It
//! never sees bars beyond the one being evaluated, owns its own parameters
//! and rolling state, and stays silent until its declared warm-up has
//! elapsed. The engine treats `None` and HOLD identically.

pub mod bollinger_reversion;
pub mod buffer;
pub mod composite;
pub mod definition;
pub mod ma_crossover;
pub mod macd_cross;
pub mod rsi_reversal;

pub use bollinger_reversion::BollingerReversion;
pub use buffer::{BarBuffer, EmaState};
pub use composite::{
    CompositeStrategy, Condition, IndicatorKind, IndicatorSignal, LogicOperator, LogicTree,
    SignalParams, SubRegimeFilter,
};
pub use definition::{ParamValue, StrategyDefinition, StrategyType};
pub use ma_crossover::{MaCrossover, MaType};
pub use macd_cross::MacdCross;
pub use rsi_reversal::RsiReversal;

use crate::domain::{CandleSeries, MarketEvent, SignalEvent};
use thiserror::Error;

/// Construction-time strategy errors. These fail the run immediately;
/// insufficient history at run time is not an error.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("fast_period ({fast}) must be < slow_period ({slow})")]
    FastNotBelowSlow { fast: usize, slow: usize },
    #[error("period ({0}) must be >= 2")]
    PeriodTooShort(usize),
    #[error("oversold ({oversold}) must be < overbought ({overbought})")]
    InvalidRsiThresholds { oversold: f64, overbought: f64 },
    #[error("num_std ({0}) must be > 0")]
    InvalidNumStd(f64),
    #[error("unknown ma_type: {0} (expected SMA or EMA)")]
    UnknownMaType(String),
    #[error("unknown builtin strategy class: {0}")]
    UnknownBuiltinClass(String),
    #[error("builtin strategy definition requires builtin_class")]
    MissingBuiltinClass,
    #[error("composite strategy definition requires entry_logic and exit_logic")]
    MissingLogic,
    #[error("indicator component {component} is not valid for {indicator}")]
    InvalidComponent { indicator: String, component: String },
}

/// The strategy contract consumed by the backtest engine.
pub trait Strategy: Send {
    /// Human-readable name used in logs and reports.
    fn name(&self) -> &str;

    /// Bars required before the strategy can emit its first signal.
    fn warmup_bars(&self) -> usize;

    /// Observe one bar and optionally emit a signal. Implementations may
    /// only use data from this event and earlier ones.
    fn on_market_event(&mut self, event: &MarketEvent) -> Option<SignalEvent>;

    /// Optional lifecycle hook: precompute over the full series before the
    /// loop starts. Permitted only because the precomputed outputs equal
    /// the bar-by-bar ones.
    fn preload(&mut self, _series: &CandleSeries) {}

    /// Entry signals suppressed by regime filtering, if this strategy
    /// tracks any.
    fn signals_skipped_by_regime(&self) -> u64 {
        0
    }
}
