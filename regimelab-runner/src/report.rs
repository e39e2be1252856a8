//! Structured backtest result record.
//!
//! The value handed back to hosts (API, storage, agent tooling): metrics,
//! the equity curve aligned with processed bars, the trade list, and the
//! regime-filter accounting when a composite strategy ran.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use regimelab_core::domain::{EquityPoint, Timeframe, Trade};
use regimelab_core::regime::SimplifiedRegime;
use regimelab_core::strategy::SubRegimeFilter;

use crate::metrics::BacktestMetrics;

/// One closed trade, in the external result shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradeSummary {
    pub entry_time: DateTime<Utc>,
    pub exit_time: DateTime<Utc>,
    pub entry_price: f64,
    pub exit_price: f64,
    pub pnl: f64,
    pub pnl_pct: f64,
    pub duration_hours: f64,
}

impl From<&Trade> for TradeSummary {
    fn from(trade: &Trade) -> Self {
        Self {
            entry_time: trade.entry_time,
            exit_time: trade.exit_time,
            entry_price: trade.entry_price,
            exit_price: trade.exit_price,
            pnl: trade.pnl,
            pnl_pct: trade.return_pct,
            duration_hours: trade.duration_hours(),
        }
    }
}

/// Regime-filter accounting for a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegimeStats {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regime_filter: Option<Vec<SimplifiedRegime>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_regime_filter: Option<SubRegimeFilter>,
    pub signals_skipped_by_regime: u64,
}

/// The full result record for one backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestReport {
    pub strategy_name: String,
    pub symbol: String,
    pub timeframe: Timeframe,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub metrics: BacktestMetrics,
    pub equity_curve: Vec<EquityPoint>,
    pub trades: Vec<TradeSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regime_stats: Option<RegimeStats>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn trade_summary_carries_derived_fields() {
        let entry = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let exit = Utc.with_ymd_and_hms(2024, 1, 2, 12, 0, 0).unwrap();
        let trade = Trade::new(entry, exit, "BTC/USDT".into(), 100.0, 105.0, 2.0, 0.2, 0.21);
        let summary = TradeSummary::from(&trade);
        assert_eq!(summary.pnl, trade.pnl);
        assert_eq!(summary.pnl_pct, trade.return_pct);
        assert_eq!(summary.duration_hours, 12.0);
    }

    #[test]
    fn report_serialization_roundtrip() {
        let base = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let report = BacktestReport {
            strategy_name: "rsi_reversion".into(),
            symbol: "BTC/USDT".into(),
            timeframe: Timeframe::H1,
            start_date: base,
            end_date: base + chrono::Duration::hours(99),
            metrics: BacktestMetrics::compute(&[], &[], 10_000.0, 252.0),
            equity_curve: vec![EquityPoint {
                time: base,
                value: 10_000.0,
            }],
            trades: vec![],
            regime_stats: Some(RegimeStats {
                regime_filter: Some(vec![SimplifiedRegime::TrendUp]),
                sub_regime_filter: None,
                signals_skipped_by_regime: 3,
            }),
        };

        let json = serde_json::to_string(&report).unwrap();
        let deser: BacktestReport = serde_json::from_str(&json).unwrap();
        assert_eq!(deser.strategy_name, report.strategy_name);
        assert_eq!(deser.timeframe, Timeframe::H1);
        assert_eq!(
            deser.regime_stats.unwrap().signals_skipped_by_regime,
            3
        );
    }

    #[test]
    fn timeframe_serializes_to_external_label() {
        let json = serde_json::to_string(&Timeframe::H4).unwrap();
        assert_eq!(json, "\"4h\"");
    }
}
