//! Portfolio — cash, open positions, trade history, equity curve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::events::{FillEvent, OrderSide};
use super::position::Position;
use super::trade::Trade;

/// Relative tolerance when deciding whether a sell flattens the whole
/// position.
const FULL_CLOSE_TOLERANCE: f64 = 1e-8;

/// One point of the equity curve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub time: DateTime<Utc>,
    pub value: f64,
}

/// Aggregate portfolio state for one backtest run.
///
/// The accounting identity holds at every mark:
/// `total_value == cash + Σ position.quantity × mark_price`.
#[derive(Debug, Clone)]
pub struct Portfolio {
    pub initial_capital: f64,
    pub cash: f64,
    pub positions: HashMap<String, Position>,
    pub trades: Vec<Trade>,
    pub equity_curve: Vec<EquityPoint>,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            cash: initial_capital,
            positions: HashMap::new(),
            trades: Vec::new(),
            equity_curve: Vec::new(),
        }
    }

    /// Apply a fill: mutate cash, positions and (on a full close) the trade
    /// history.
    ///
    /// Long-only rules:
    /// - BUY into an empty slot opens a position; BUY into an existing
    ///   position averages up.
    /// - SELL of the full open quantity (within a relative tolerance)
    ///   closes the position and records a trade.
    /// - Partial SELL reduces quantity; commissions stay deferred until the
    ///   eventual full close.
    /// - SELL with no open position is ignored; the engine never issues one.
    pub fn apply_fill(&mut self, fill: &FillEvent) {
        match fill.side {
            OrderSide::Buy => {
                if let Some(pos) = self.positions.get_mut(&fill.symbol) {
                    pos.average_up(fill.quantity, fill.fill_price, fill.commission);
                } else {
                    self.positions.insert(
                        fill.symbol.clone(),
                        Position::new(
                            fill.symbol.clone(),
                            fill.quantity,
                            fill.fill_price,
                            fill.timestamp,
                            fill.commission,
                        ),
                    );
                }
                self.cash += fill.cash_flow();
            }
            OrderSide::Sell => {
                let Some(pos) = self.positions.get_mut(&fill.symbol) else {
                    return;
                };
                if (fill.quantity - pos.quantity).abs() <= pos.quantity * FULL_CLOSE_TOLERANCE {
                    let trade = Trade::new(
                        pos.entry_time,
                        fill.timestamp,
                        fill.symbol.clone(),
                        pos.entry_price,
                        fill.fill_price,
                        pos.quantity,
                        pos.entry_commission,
                        fill.commission,
                    );
                    self.trades.push(trade);
                    self.positions.remove(&fill.symbol);
                } else {
                    pos.quantity -= fill.quantity;
                }
                self.cash += fill.cash_flow();
            }
        }
    }

    /// Total portfolio value: cash plus positions marked at the given
    /// prices. A missing price falls back to the entry price.
    pub fn total_value(&self, prices: &HashMap<String, f64>) -> f64 {
        let position_value: f64 = self
            .positions
            .values()
            .map(|pos| {
                let price = prices.get(&pos.symbol).copied().unwrap_or(pos.entry_price);
                pos.market_value(price)
            })
            .sum();
        self.cash + position_value
    }

    /// Append an equity point for this bar.
    pub fn mark(&mut self, time: DateTime<Utc>, prices: &HashMap<String, f64>) {
        let value = self.total_value(prices);
        self.equity_curve.push(EquityPoint { time, value });
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn total_trades(&self) -> usize {
        self.trades.len()
    }

    pub fn winning_trades(&self) -> usize {
        self.trades.iter().filter(|t| t.is_winner()).count()
    }

    pub fn losing_trades(&self) -> usize {
        self.trades.iter().filter(|t| !t.is_winner()).count()
    }

    /// Win rate as a percentage; 0 with no trades.
    pub fn win_rate(&self) -> f64 {
        if self.trades.is_empty() {
            return 0.0;
        }
        self.winning_trades() as f64 / self.trades.len() as f64 * 100.0
    }

    /// Total return percentage from the equity curve; 0 before any mark.
    pub fn total_return(&self) -> f64 {
        let Some(last) = self.equity_curve.last() else {
            return 0.0;
        };
        (last.value - self.initial_capital) / self.initial_capital * 100.0
    }
}
