//! Position — an open long holding in a single symbol.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An open long position.
///
/// `entry_price` is the volume-weighted average across all fills that built
/// the position; `entry_commission` accumulates the same way and is charged
/// against the trade when the position fully closes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub symbol: String,
    pub quantity: f64,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub entry_commission: f64,
}

impl Position {
    pub fn new(
        symbol: String,
        quantity: f64,
        entry_price: f64,
        entry_time: DateTime<Utc>,
        entry_commission: f64,
    ) -> Self {
        Self {
            symbol,
            quantity,
            entry_price,
            entry_time,
            entry_commission,
        }
    }

    /// Market value at the given price.
    pub fn market_value(&self, price: f64) -> f64 {
        self.quantity * price
    }

    /// Unrealized profit/loss before commissions.
    pub fn unrealized_pnl(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.quantity
    }

    /// Fold another buy fill into the position: quantities sum, the entry
    /// price becomes the volume-weighted average, commissions accumulate.
    pub fn average_up(&mut self, quantity: f64, price: f64, commission: f64) {
        let total_cost = self.quantity * self.entry_price + quantity * price;
        let total_quantity = self.quantity + quantity;
        self.entry_price = total_cost / total_quantity;
        self.quantity = total_quantity;
        self.entry_commission += commission;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap()
    }

    #[test]
    fn unrealized_pnl_from_entry() {
        let pos = Position::new("BTC/USDT".into(), 10.0, 100.0, entry_time(), 1.0);
        assert_eq!(pos.unrealized_pnl(110.0), 100.0);
        assert_eq!(pos.unrealized_pnl(95.0), -50.0);
    }

    #[test]
    fn average_up_weights_by_quantity() {
        let mut pos = Position::new("BTC/USDT".into(), 10.0, 100.0, entry_time(), 1.0);
        pos.average_up(30.0, 120.0, 2.0);
        assert_eq!(pos.quantity, 40.0);
        // (10*100 + 30*120) / 40 = 115
        assert!((pos.entry_price - 115.0).abs() < 1e-12);
        assert_eq!(pos.entry_commission, 3.0);
    }

    #[test]
    fn market_value_at_price() {
        let pos = Position::new("BTC/USDT".into(), 2.5, 100.0, entry_time(), 0.0);
        assert_eq!(pos.market_value(104.0), 260.0);
    }
}
