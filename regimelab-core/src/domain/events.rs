//! Event types flowing through the backtest loop.
//!
//! Per bar: MarketEvent → strategy → optional SignalEvent → OrderEvent →
//! FillEvent → portfolio mutation. Events are immutable once emitted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::candle::Candle;
use crate::regime::RegimeRecord;

/// Directional intent of a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "HOLD")]
    Hold,
}

/// Order direction. The engine is long-only: sells always flatten an
/// existing position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderSide {
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "SELL")]
    Sell,
}

/// Order type. Only market orders exist in the core execution model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderType {
    #[serde(rename = "MARKET")]
    Market,
}

/// One bar delivered to a strategy, with regime metadata when regime
/// detection is enabled.
#[derive(Debug, Clone)]
pub struct MarketEvent {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub candle: Candle,
    pub regime: Option<RegimeRecord>,
}

/// Trading signal emitted by a strategy.
///
/// The metadata payload carries numeric context (indicator values, band
/// levels) for diagnostics; the engine ignores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalEvent {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub kind: SignalKind,
    /// Signal strength in [0, 1]; higher = stronger conviction.
    pub strength: f64,
    #[serde(default)]
    pub metadata: HashMap<String, f64>,
}

/// Market order produced from a signal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderEvent {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub order_type: OrderType,
    pub quantity: f64,
    pub side: OrderSide,
}

/// Executed order with slippage-adjusted price and commission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FillEvent {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub quantity: f64,
    pub side: OrderSide,
    pub fill_price: f64,
    pub commission: f64,
    pub slippage_rate: f64,
}

impl FillEvent {
    /// Traded notional before commission.
    pub fn notional(&self) -> f64 {
        self.quantity * self.fill_price
    }

    /// Signed cash impact: buys cost notional + commission, sells return
    /// notional − commission.
    pub fn cash_flow(&self) -> f64 {
        match self.side {
            OrderSide::Buy => -(self.notional() + self.commission),
            OrderSide::Sell => self.notional() - self.commission,
        }
    }
}
