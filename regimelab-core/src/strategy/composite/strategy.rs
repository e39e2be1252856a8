//! Composite strategy: entry/exit logic trees with regime filtering.
//!
//! State machine: flat → (entry tree fires, regime allows) → long →
//! (exit tree fires) → flat. Entry fires while long and exit fires while
//! flat are ignored. Exits are never suppressed by the regime filter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

use super::logic_tree::LogicTree;
use crate::domain::{Candle, CandleSeries, MarketEvent, SignalEvent, SignalKind};
use crate::regime::{MomentumState, RegimeRecord, SimplifiedRegime, TrendState, VolatilityState};
use crate::strategy::{Strategy, StrategyError};

/// Per-axis regime constraints; an absent axis allows every value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubRegimeFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend: Option<Vec<TrendState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volatility: Option<Vec<VolatilityState>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub momentum: Option<Vec<MomentumState>>,
}

impl SubRegimeFilter {
    pub fn allows(&self, regime: &RegimeRecord) -> bool {
        if let Some(trend) = &self.trend {
            if !trend.contains(&regime.trend_state) {
                return false;
            }
        }
        if let Some(volatility) = &self.volatility {
            if !volatility.contains(&regime.volatility_state) {
                return false;
            }
        }
        if let Some(momentum) = &self.momentum {
            if !momentum.contains(&regime.momentum_state) {
                return false;
            }
        }
        true
    }
}

/// Entry/exit boolean columns precomputed over the full series.
struct PrecomputedSignals {
    entry: Vec<bool>,
    exit: Vec<bool>,
    index_by_time: HashMap<DateTime<Utc>, usize>,
}

pub struct CompositeStrategy {
    name: String,
    description: String,
    entry_logic: LogicTree,
    exit_logic: LogicTree,
    regime_filter: Option<Vec<SimplifiedRegime>>,
    sub_regime_filter: Option<SubRegimeFilter>,
    // Run state
    precomputed: Option<PrecomputedSignals>,
    buffered: Vec<Candle>,
    in_position: bool,
    skipped_by_regime: u64,
}

impl CompositeStrategy {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        entry_logic: LogicTree,
        exit_logic: LogicTree,
        regime_filter: Option<Vec<SimplifiedRegime>>,
        sub_regime_filter: Option<SubRegimeFilter>,
    ) -> Result<Self, StrategyError> {
        entry_logic.validate()?;
        exit_logic.validate()?;
        Ok(Self {
            name: name.into(),
            description: description.into(),
            entry_logic,
            exit_logic,
            regime_filter,
            sub_regime_filter,
            precomputed: None,
            buffered: Vec::new(),
            in_position: false,
            skipped_by_regime: 0,
        })
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn regime_filter(&self) -> Option<&[SimplifiedRegime]> {
        self.regime_filter.as_deref()
    }

    pub fn sub_regime_filter(&self) -> Option<&SubRegimeFilter> {
        self.sub_regime_filter.as_ref()
    }

    /// Whether the filters admit an entry on this bar. A bar without regime
    /// metadata is conservatively allowed.
    fn regime_allows(&self, regime: Option<&RegimeRecord>) -> bool {
        let Some(regime) = regime else {
            return true;
        };
        if let Some(allowed) = &self.regime_filter {
            if !allowed.contains(&regime.simplified_regime) {
                return false;
            }
        }
        if let Some(sub) = &self.sub_regime_filter {
            if !sub.allows(regime) {
                return false;
            }
        }
        true
    }

    /// Entry/exit verdicts for the current bar: from the precomputed
    /// columns when preloaded, otherwise evaluated over the buffered
    /// history. Both paths agree because indicator columns are
    /// prefix-stable.
    fn signals_at(&self, event: &MarketEvent) -> Option<(bool, bool)> {
        if let Some(pre) = &self.precomputed {
            let index = *pre.index_by_time.get(&event.timestamp)?;
            Some((pre.entry[index], pre.exit[index]))
        } else {
            let index = self.buffered.len() - 1;
            // Only the side the state machine can act on needs evaluating,
            // but computing both keeps the two paths easy to compare.
            Some((
                self.entry_logic.evaluate_at(&self.buffered, index),
                self.exit_logic.evaluate_at(&self.buffered, index),
            ))
        }
    }
}

impl Strategy for CompositeStrategy {
    fn name(&self) -> &str {
        &self.name
    }

    fn warmup_bars(&self) -> usize {
        self.entry_logic
            .warmup_bars()
            .max(self.exit_logic.warmup_bars())
    }

    fn preload(&mut self, series: &CandleSeries) {
        let candles = series.candles();
        let entry = self.entry_logic.evaluate_series(candles);
        let exit = self.exit_logic.evaluate_series(candles);
        let index_by_time = candles
            .iter()
            .enumerate()
            .map(|(i, c)| (c.open_time, i))
            .collect();
        self.precomputed = Some(PrecomputedSignals {
            entry,
            exit,
            index_by_time,
        });
    }

    fn on_market_event(&mut self, event: &MarketEvent) -> Option<SignalEvent> {
        if self.precomputed.is_none() {
            self.buffered.push(event.candle.clone());
        }
        let (entry_fired, exit_fired) = self.signals_at(event)?;

        if !self.in_position {
            if entry_fired {
                if self.regime_allows(event.regime.as_ref()) {
                    self.in_position = true;
                    return Some(SignalEvent {
                        timestamp: event.timestamp,
                        symbol: event.symbol.clone(),
                        kind: SignalKind::Buy,
                        strength: 1.0,
                        metadata: HashMap::new(),
                    });
                }
                self.skipped_by_regime += 1;
                debug!(
                    strategy = %self.name,
                    timestamp = %event.timestamp,
                    "entry suppressed by regime filter"
                );
            }
        } else if exit_fired {
            self.in_position = false;
            return Some(SignalEvent {
                timestamp: event.timestamp,
                symbol: event.symbol.clone(),
                kind: SignalKind::Sell,
                strength: 1.0,
                metadata: HashMap::new(),
            });
        }
        None
    }

    fn signals_skipped_by_regime(&self) -> u64 {
        self.skipped_by_regime
    }
}
