//! Domain types for RegimeLab.

pub mod candle;
pub mod events;
pub mod portfolio;
pub mod position;
pub mod trade;

pub use candle::{Candle, CandleSeries, DataError, Timeframe};
pub use events::{
    FillEvent, MarketEvent, OrderEvent, OrderSide, OrderType, SignalEvent, SignalKind,
};
pub use portfolio::{EquityPoint, Portfolio};
pub use position::Position;
pub use trade::Trade;

/// Symbol type alias
pub type Symbol = String;
