//! Event-driven backtest engine.
//!
//! One strict chronological pass over the candle series. Per bar:
//! MarketEvent → strategy → optional signal → at most one market order →
//! fill with slippage and commission → portfolio mutation → equity mark at
//! the bar close. Intra-bar fills are therefore reflected in the same
//! bar's end-of-bar equity.

pub mod config;

pub use config::{EngineConfig, EngineError};

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::domain::{
    CandleSeries, FillEvent, MarketEvent, OrderEvent, OrderSide, OrderType, Portfolio,
    SignalEvent, SignalKind, Timeframe,
};
use crate::regime::{RegimeClassifier, RegimeRecord};
use crate::strategy::Strategy;

/// Everything a run produces. Metrics and the external result record are
/// derived from this in `regimelab-runner`.
#[derive(Debug)]
pub struct RunOutput {
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub portfolio: Portfolio,
    pub bars_processed: u64,
    pub signals_generated: u64,
    pub orders_executed: u64,
    pub signals_skipped_by_regime: u64,
}

/// The backtest engine. Owns the frozen series, the strategy, the
/// portfolio and the regime column for exactly one run; nothing is shared
/// across runs.
pub struct BacktestEngine {
    series: CandleSeries,
    strategy: Box<dyn Strategy>,
    config: EngineConfig,
    portfolio: Portfolio,
    regime_records: Option<Vec<RegimeRecord>>,
    bars_processed: u64,
    signals_generated: u64,
    orders_executed: u64,
}

impl BacktestEngine {
    pub fn new(
        series: CandleSeries,
        strategy: Box<dyn Strategy>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let portfolio = Portfolio::new(config.initial_capital);
        Ok(Self {
            series,
            strategy,
            config,
            portfolio,
            regime_records: None,
            bars_processed: 0,
            signals_generated: 0,
            orders_executed: 0,
        })
    }

    /// Run the backtest to completion and hand back the results.
    pub fn run(mut self) -> RunOutput {
        info!(
            bars = self.series.len(),
            symbol = self.series.symbol(),
            strategy = self.strategy.name(),
            warmup_bars = self.strategy.warmup_bars(),
            initial_capital = self.config.initial_capital,
            commission_rate = self.config.commission_rate,
            slippage_rate = self.config.slippage_rate,
            "starting backtest"
        );

        // Batch preparation is valid because indicators and the regime
        // classifier are prefix-stable (bar t depends only on bars <= t).
        if self.config.enable_regime_detection {
            let mut classifier = RegimeClassifier::new(self.config.regime.clone());
            self.regime_records = Some(classifier.classify_series(self.series.candles()));
        }
        self.strategy.preload(&self.series);

        for index in 0..self.series.len() {
            self.process_bar(index);
        }

        info!(
            bars = self.bars_processed,
            signals = self.signals_generated,
            orders = self.orders_executed,
            trades = self.portfolio.total_trades(),
            "backtest complete"
        );

        RunOutput {
            symbol: self.series.symbol().to_string(),
            timeframe: self.series.timeframe(),
            start_time: self.series.first().open_time,
            end_time: self.series.last().open_time,
            signals_skipped_by_regime: self.strategy.signals_skipped_by_regime(),
            portfolio: self.portfolio,
            bars_processed: self.bars_processed,
            signals_generated: self.signals_generated,
            orders_executed: self.orders_executed,
        }
    }

    fn process_bar(&mut self, index: usize) {
        let candle = self.series.candles()[index].clone();
        self.bars_processed += 1;

        let event = MarketEvent {
            timestamp: candle.open_time,
            symbol: self.series.symbol().to_string(),
            candle: candle.clone(),
            regime: self
                .regime_records
                .as_ref()
                .map(|records| records[index].clone()),
        };

        if let Some(signal) = self.strategy.on_market_event(&event) {
            if signal.kind != SignalKind::Hold {
                self.signals_generated += 1;
                self.process_signal(&signal, candle.close);
            }
        }

        let mut prices = HashMap::new();
        prices.insert(self.series.symbol().to_string(), candle.close);
        self.portfolio.mark(candle.open_time, &prices);
    }

    fn process_signal(&mut self, signal: &SignalEvent, close: f64) {
        match signal.kind {
            SignalKind::Buy => {
                if self.portfolio.has_position(&signal.symbol) {
                    debug!(symbol = %signal.symbol, "BUY while long: ignored");
                    return;
                }
                if let Some(order) = self.create_buy_order(signal, close) {
                    self.execute(order, close);
                }
            }
            SignalKind::Sell => {
                let Some(position) = self.portfolio.get_position(&signal.symbol) else {
                    debug!(symbol = %signal.symbol, "SELL while flat: ignored");
                    return;
                };
                let order = OrderEvent {
                    timestamp: signal.timestamp,
                    symbol: signal.symbol.clone(),
                    order_type: OrderType::Market,
                    quantity: position.quantity,
                    side: OrderSide::Sell,
                };
                self.execute(order, close);
            }
            SignalKind::Hold => {}
        }
    }

    /// Size a BUY from available cash, accounting for commission and
    /// slippage so the cash outflow equals cash × position_size_pct
    /// exactly.
    fn create_buy_order(&self, signal: &SignalEvent, close: f64) -> Option<OrderEvent> {
        let available = self.portfolio.cash * self.config.position_size_pct;
        let max_cost = available / (1.0 + self.config.commission_rate);
        let fill_price = close * (1.0 + self.config.slippage_rate);
        let quantity = max_cost / fill_price;

        if !(quantity > 0.0) {
            debug!(
                symbol = %signal.symbol,
                cash = self.portfolio.cash,
                "BUY skipped: computed quantity is not positive"
            );
            return None;
        }
        Some(OrderEvent {
            timestamp: signal.timestamp,
            symbol: signal.symbol.clone(),
            order_type: OrderType::Market,
            quantity,
            side: OrderSide::Buy,
        })
    }

    /// Fill at the bar close adjusted for slippage, charge commission on
    /// the filled notional, and apply to the portfolio.
    fn execute(&mut self, order: OrderEvent, close: f64) {
        let fill_price = match order.side {
            OrderSide::Buy => close * (1.0 + self.config.slippage_rate),
            OrderSide::Sell => close * (1.0 - self.config.slippage_rate),
        };
        let commission = order.quantity * fill_price * self.config.commission_rate;
        let fill = FillEvent {
            timestamp: order.timestamp,
            symbol: order.symbol,
            quantity: order.quantity,
            side: order.side,
            fill_price,
            commission,
            slippage_rate: self.config.slippage_rate,
        };
        self.portfolio.apply_fill(&fill);
        self.orders_executed += 1;
    }
}
