//! Trade — a completed long round trip, immutable after construction.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A closed trade (entry → exit).
///
/// `pnl` and `return_pct` are derived once at construction:
/// pnl = (exit − entry) × quantity − entry_commission − exit_commission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trade {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub symbol: String,
    pub entry_price: f64,
    pub exit_price: f64,
    pub quantity: f64,
    pub entry_commission: f64,
    pub exit_commission: f64,
    pub pnl: f64,
    pub return_pct: f64,
}

impl Trade {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        entry_time: DateTime<Utc>,
        exit_time: DateTime<Utc>,
        symbol: String,
        entry_price: f64,
        exit_price: f64,
        quantity: f64,
        entry_commission: f64,
        exit_commission: f64,
    ) -> Self {
        let gross_pnl = (exit_price - entry_price) * quantity;
        let pnl = gross_pnl - entry_commission - exit_commission;
        let return_pct = pnl / (entry_price * quantity) * 100.0;
        Self {
            entry_time,
            exit_time,
            symbol,
            entry_price,
            exit_price,
            quantity,
            entry_commission,
            exit_commission,
            pnl,
            return_pct,
        }
    }

    pub fn is_winner(&self) -> bool {
        self.pnl > 0.0
    }

    /// Holding time, always positive (entry_time < exit_time).
    pub fn duration(&self) -> Duration {
        self.exit_time - self.entry_time
    }

    pub fn duration_hours(&self) -> f64 {
        self.duration().num_seconds() as f64 / 3600.0
    }
}
