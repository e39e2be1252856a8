//! Performance metrics — pure functions over the equity curve and trade
//! list.
//!
//! Every metric is a pure function: curve and/or trades in, scalar out.
//! Values are kept at full precision here; rounding belongs to the
//! presentation boundary.

use serde::{Deserialize, Serialize};

use regimelab_core::domain::{EquityPoint, Trade};

/// Bars per year used to annualize Sharpe/Sortino by default.
pub const DEFAULT_PERIODS_PER_YEAR: f64 = 252.0;

/// Aggregate metrics for a single backtest run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BacktestMetrics {
    pub initial_capital: f64,
    pub final_value: f64,
    pub total_return_pct: f64,
    pub annual_return_pct: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub calmar_ratio: f64,
    pub max_drawdown_pct: f64,
    pub max_drawdown_duration: usize,
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub win_rate_pct: f64,
    pub total_profit: f64,
    pub total_loss: f64,
    pub profit_factor: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub avg_trade: f64,
    pub max_win_streak: usize,
    pub max_loss_streak: usize,
    pub avg_trade_duration_hours: f64,
}

impl BacktestMetrics {
    /// Compute all metrics from a finished run.
    pub fn compute(
        equity_curve: &[EquityPoint],
        trades: &[Trade],
        initial_capital: f64,
        periods_per_year: f64,
    ) -> Self {
        let winning = trades.iter().filter(|t| t.is_winner()).count();
        let losing = trades.len() - winning;
        Self {
            initial_capital,
            final_value: final_value(equity_curve, initial_capital),
            total_return_pct: total_return_pct(equity_curve, initial_capital),
            annual_return_pct: annual_return_pct(equity_curve, initial_capital),
            sharpe_ratio: sharpe_ratio(equity_curve, 0.0, periods_per_year),
            sortino_ratio: sortino_ratio(equity_curve, 0.0, periods_per_year),
            calmar_ratio: calmar_ratio(equity_curve, initial_capital),
            max_drawdown_pct: max_drawdown_pct(equity_curve),
            max_drawdown_duration: max_drawdown_duration(equity_curve),
            total_trades: trades.len(),
            winning_trades: winning,
            losing_trades: losing,
            win_rate_pct: win_rate_pct(trades),
            total_profit: total_profit(trades),
            total_loss: total_loss(trades),
            profit_factor: profit_factor(trades),
            avg_win: avg_win(trades),
            avg_loss: avg_loss(trades),
            avg_trade: avg_trade(trades),
            max_win_streak: max_win_streak(trades),
            max_loss_streak: max_loss_streak(trades),
            avg_trade_duration_hours: avg_trade_duration_hours(trades),
        }
    }
}

// ─── Returns ────────────────────────────────────────────────────────

pub fn final_value(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    equity_curve
        .last()
        .map_or(initial_capital, |point| point.value)
}

pub fn total_return_pct(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    let final_eq = final_value(equity_curve, initial_capital);
    (final_eq - initial_capital) / initial_capital * 100.0
}

/// CAGR over the elapsed wall-clock span: days / 365.25. Zero for spans of
/// zero or negative length or fewer than 2 points.
pub fn annual_return_pct(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let start = equity_curve[0].time;
    let end = equity_curve[equity_curve.len() - 1].time;
    let days = (end - start).num_seconds() as f64 / 86_400.0;
    let years = days / 365.25;
    if years <= 0.0 {
        return 0.0;
    }
    let final_eq = final_value(equity_curve, initial_capital);
    if final_eq <= 0.0 {
        return 0.0;
    }
    ((final_eq / initial_capital).powf(1.0 / years) - 1.0) * 100.0
}

// ─── Risk ───────────────────────────────────────────────────────────

fn per_bar_returns(equity_curve: &[EquityPoint]) -> Vec<f64> {
    equity_curve
        .windows(2)
        .map(|pair| (pair[1].value - pair[0].value) / pair[0].value)
        .collect()
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation.
fn std_dev(values: &[f64]) -> f64 {
    let m = mean(values);
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Annualized Sharpe ratio over per-bar returns. Zero when the deviation
/// vanishes or fewer than 2 equity points exist.
pub fn sharpe_ratio(
    equity_curve: &[EquityPoint],
    risk_free_rate: f64,
    periods_per_year: f64,
) -> f64 {
    let returns = per_bar_returns(equity_curve);
    if returns.is_empty() {
        return 0.0;
    }
    let rf_per_bar = risk_free_rate / periods_per_year;
    let m = mean(&returns);
    let std = std_dev(&returns);
    if std == 0.0 {
        return 0.0;
    }
    (m - rf_per_bar) / std * periods_per_year.sqrt()
}

/// Annualized Sortino ratio: downside deviation only. Zero with no
/// downside.
pub fn sortino_ratio(
    equity_curve: &[EquityPoint],
    risk_free_rate: f64,
    periods_per_year: f64,
) -> f64 {
    let returns = per_bar_returns(equity_curve);
    if returns.is_empty() {
        return 0.0;
    }
    let rf_per_bar = risk_free_rate / periods_per_year;
    let excess: Vec<f64> = returns.iter().map(|r| r - rf_per_bar).collect();
    let downside_sq: f64 = excess.iter().filter(|r| **r < 0.0).map(|r| r * r).sum();
    let downside_std = (downside_sq / excess.len() as f64).sqrt();
    if downside_std == 0.0 {
        return 0.0;
    }
    mean(&excess) / downside_std * periods_per_year.sqrt()
}

/// Calmar ratio: annual return over the magnitude of max drawdown, both in
/// percent. Zero when there is no drawdown.
pub fn calmar_ratio(equity_curve: &[EquityPoint], initial_capital: f64) -> f64 {
    let drawdown = max_drawdown_pct(equity_curve);
    if drawdown >= 0.0 {
        return 0.0;
    }
    annual_return_pct(equity_curve, initial_capital) / drawdown.abs()
}

/// Maximum drawdown as a percentage ≤ 0.
pub fn max_drawdown_pct(equity_curve: &[EquityPoint]) -> f64 {
    if equity_curve.len() < 2 {
        return 0.0;
    }
    let mut peak = equity_curve[0].value;
    let mut max_dd = 0.0_f64;
    for point in equity_curve {
        if point.value > peak {
            peak = point.value;
        }
        let dd = (point.value - peak) / peak * 100.0;
        if dd < max_dd {
            max_dd = dd;
        }
    }
    max_dd
}

/// Longest contiguous stretch (in bars) spent below the running peak.
pub fn max_drawdown_duration(equity_curve: &[EquityPoint]) -> usize {
    if equity_curve.len() < 2 {
        return 0;
    }
    let mut peak = equity_curve[0].value;
    let mut peak_index = 0;
    let mut max_duration = 0;
    for (i, point) in equity_curve.iter().enumerate() {
        if point.value >= peak {
            peak = point.value;
            peak_index = i;
        } else {
            max_duration = max_duration.max(i - peak_index);
        }
    }
    max_duration
}

// ─── Trade statistics ───────────────────────────────────────────────

pub fn win_rate_pct(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    let winners = trades.iter().filter(|t| t.is_winner()).count();
    winners as f64 / trades.len() as f64 * 100.0
}

/// Sum of positive trade pnls.
pub fn total_profit(trades: &[Trade]) -> f64 {
    trades.iter().filter(|t| t.is_winner()).map(|t| t.pnl).sum()
}

/// Sum of |pnl| across losing trades.
pub fn total_loss(trades: &[Trade]) -> f64 {
    trades
        .iter()
        .filter(|t| !t.is_winner())
        .map(|t| t.pnl.abs())
        .sum()
}

/// Gross profit over gross loss: +∞ with profits and no losses, 0 with
/// neither.
pub fn profit_factor(trades: &[Trade]) -> f64 {
    let profit = total_profit(trades);
    let loss = total_loss(trades);
    if loss == 0.0 {
        return if profit > 0.0 { f64::INFINITY } else { 0.0 };
    }
    profit / loss
}

pub fn avg_win(trades: &[Trade]) -> f64 {
    let winners: Vec<f64> = trades
        .iter()
        .filter(|t| t.is_winner())
        .map(|t| t.pnl)
        .collect();
    if winners.is_empty() {
        return 0.0;
    }
    mean(&winners)
}

pub fn avg_loss(trades: &[Trade]) -> f64 {
    let losers: Vec<f64> = trades
        .iter()
        .filter(|t| !t.is_winner())
        .map(|t| t.pnl)
        .collect();
    if losers.is_empty() {
        return 0.0;
    }
    mean(&losers)
}

pub fn avg_trade(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.pnl).sum::<f64>() / trades.len() as f64
}

pub fn max_win_streak(trades: &[Trade]) -> usize {
    longest_streak(trades, true)
}

pub fn max_loss_streak(trades: &[Trade]) -> usize {
    longest_streak(trades, false)
}

fn longest_streak(trades: &[Trade], winners: bool) -> usize {
    let mut best = 0;
    let mut current = 0;
    for trade in trades {
        if trade.is_winner() == winners {
            current += 1;
            best = best.max(current);
        } else {
            current = 0;
        }
    }
    best
}

pub fn avg_trade_duration_hours(trades: &[Trade]) -> f64 {
    if trades.is_empty() {
        return 0.0;
    }
    trades.iter().map(|t| t.duration_hours()).sum::<f64>() / trades.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn curve(values: &[f64]) -> Vec<EquityPoint> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        values
            .iter()
            .enumerate()
            .map(|(i, &value)| EquityPoint {
                time: base + Duration::days(i as i64),
                value,
            })
            .collect()
    }

    fn trade(pnl_target: f64, hours: i64) -> Trade {
        let entry = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        // quantity 1, zero commissions: pnl = exit - entry price.
        Trade::new(
            entry,
            entry + Duration::hours(hours),
            "BTC/USDT".into(),
            100.0,
            100.0 + pnl_target,
            1.0,
            0.0,
            0.0,
        )
    }

    #[test]
    fn total_return_from_curve() {
        let c = curve(&[10_000.0, 10_500.0, 11_000.0]);
        assert!((total_return_pct(&c, 10_000.0) - 10.0).abs() < 1e-12);
        assert_eq!(final_value(&[], 10_000.0), 10_000.0);
    }

    #[test]
    fn annual_return_zero_for_short_spans() {
        assert_eq!(annual_return_pct(&curve(&[10_000.0]), 10_000.0), 0.0);
    }

    #[test]
    fn annual_return_compounds_over_a_year() {
        // 366 daily points spans exactly 365 days ≈ one year.
        let mut values = vec![10_000.0; 365];
        values.push(11_000.0);
        let c = curve(&values);
        let cagr = annual_return_pct(&c, 10_000.0);
        // One year of +10% → close to 10% annualized.
        assert!((cagr - 10.0).abs() < 0.2, "cagr = {cagr}");
    }

    #[test]
    fn sharpe_zero_for_flat_curve() {
        let c = curve(&[10_000.0; 50]);
        assert_eq!(sharpe_ratio(&c, 0.0, DEFAULT_PERIODS_PER_YEAR), 0.0);
        assert_eq!(sharpe_ratio(&curve(&[10_000.0]), 0.0, 252.0), 0.0);
    }

    #[test]
    fn sharpe_positive_for_steady_growth_with_noise() {
        let values: Vec<f64> = (0..100)
            .map(|i| 10_000.0 * (1.0 + 0.001 * i as f64) + if i % 2 == 0 { 5.0 } else { -5.0 })
            .collect();
        assert!(sharpe_ratio(&curve(&values), 0.0, DEFAULT_PERIODS_PER_YEAR) > 0.0);
    }

    #[test]
    fn sortino_ignores_upside_deviation() {
        // Monotone growth: no downside → 0 by convention.
        let values: Vec<f64> = (0..50).map(|i| 10_000.0 + 10.0 * i as f64).collect();
        assert_eq!(sortino_ratio(&curve(&values), 0.0, 252.0), 0.0);
    }

    #[test]
    fn max_drawdown_finds_the_trough() {
        let c = curve(&[100.0, 120.0, 90.0, 110.0, 130.0]);
        // Peak 120 → trough 90: -25%.
        assert!((max_drawdown_pct(&c) - (-25.0)).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_zero_for_monotone_curve() {
        let c = curve(&[100.0, 110.0, 120.0]);
        assert_eq!(max_drawdown_pct(&c), 0.0);
        assert_eq!(max_drawdown_duration(&c), 0);
    }

    #[test]
    fn drawdown_duration_counts_bars_below_peak() {
        let c = curve(&[100.0, 120.0, 90.0, 95.0, 110.0, 125.0, 120.0]);
        // Below the 120 peak from index 2 through 4 (recovered at 5):
        // longest stretch is 3 bars (indices 2, 3, 4).
        assert_eq!(max_drawdown_duration(&c), 3);
    }

    #[test]
    fn profit_factor_edge_cases() {
        assert_eq!(profit_factor(&[]), 0.0);
        assert_eq!(profit_factor(&[trade(10.0, 1)]), f64::INFINITY);
        assert_eq!(profit_factor(&[trade(-10.0, 1)]), 0.0);
        let pf = profit_factor(&[trade(30.0, 1), trade(-10.0, 1)]);
        assert!((pf - 3.0).abs() < 1e-12);
    }

    #[test]
    fn streaks() {
        let trades = vec![
            trade(1.0, 1),
            trade(2.0, 1),
            trade(-1.0, 1),
            trade(3.0, 1),
            trade(4.0, 1),
            trade(5.0, 1),
            trade(-2.0, 1),
            trade(-3.0, 1),
        ];
        assert_eq!(max_win_streak(&trades), 3);
        assert_eq!(max_loss_streak(&trades), 2);
    }

    #[test]
    fn averages_and_win_rate() {
        let trades = vec![trade(10.0, 2), trade(-4.0, 4), trade(6.0, 6)];
        assert!((win_rate_pct(&trades) - 200.0 / 3.0).abs() < 1e-9);
        assert!((avg_win(&trades) - 8.0).abs() < 1e-12);
        assert!((avg_loss(&trades) - (-4.0)).abs() < 1e-12);
        assert!((avg_trade(&trades) - 4.0).abs() < 1e-12);
        assert!((avg_trade_duration_hours(&trades) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn empty_trade_list_boundaries() {
        assert_eq!(win_rate_pct(&[]), 0.0);
        assert_eq!(avg_win(&[]), 0.0);
        assert_eq!(avg_loss(&[]), 0.0);
        assert_eq!(avg_trade(&[]), 0.0);
        assert_eq!(max_win_streak(&[]), 0);
        assert_eq!(avg_trade_duration_hours(&[]), 0.0);
    }

    #[test]
    fn compute_assembles_everything() {
        let c = curve(&[10_000.0, 10_200.0, 10_100.0, 10_400.0]);
        let trades = vec![trade(10.0, 2), trade(-5.0, 4)];
        let metrics = BacktestMetrics::compute(&c, &trades, 10_000.0, 252.0);
        assert_eq!(metrics.total_trades, 2);
        assert_eq!(metrics.winning_trades, 1);
        assert_eq!(metrics.losing_trades, 1);
        assert!((metrics.final_value - 10_400.0).abs() < 1e-12);
        assert!(metrics.max_drawdown_pct < 0.0);
    }
}
