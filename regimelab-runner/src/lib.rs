//! RegimeLab Runner — metrics, result records, and run orchestration.
//!
//! The thin layer hosts call: hand it a validated candle series, a
//! persisted strategy definition and an engine configuration; it drives
//! the core engine once, computes the performance metrics and emits the
//! structured `BacktestReport`.

pub mod metrics;
pub mod report;

pub use metrics::{BacktestMetrics, DEFAULT_PERIODS_PER_YEAR};
pub use report::{BacktestReport, RegimeStats, TradeSummary};

use thiserror::Error;
use tracing::info;

use regimelab_core::domain::CandleSeries;
use regimelab_core::engine::{BacktestEngine, EngineConfig, EngineError, RunOutput};
use regimelab_core::strategy::{Strategy, StrategyDefinition, StrategyError, StrategyType};

/// Errors surfaced to the caller when a run cannot start.
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
}

/// Run a persisted strategy definition over a candle series and produce
/// the full result record.
pub fn run_backtest(
    series: CandleSeries,
    definition: &StrategyDefinition,
    config: EngineConfig,
) -> Result<BacktestReport, RunnerError> {
    let strategy = definition.build()?;
    let output = run_engine(series, strategy, config)?;

    // Composite runs carry their filter configuration into the report so
    // hosts can account for suppressed entries.
    let regime_stats = match definition.strategy_type {
        StrategyType::Composite => Some(RegimeStats {
            regime_filter: definition.regime_filter.clone(),
            sub_regime_filter: definition.sub_regime_filter.clone(),
            signals_skipped_by_regime: output.signals_skipped_by_regime,
        }),
        StrategyType::Builtin => None,
    };

    Ok(build_report(definition.name.clone(), output, regime_stats))
}

/// Run a pre-built strategy instance. Used by hosts that construct
/// strategies programmatically rather than from persisted definitions.
pub fn run_with_strategy(
    series: CandleSeries,
    strategy: Box<dyn Strategy>,
    strategy_name: impl Into<String>,
    config: EngineConfig,
) -> Result<BacktestReport, RunnerError> {
    let output = run_engine(series, strategy, config)?;
    let regime_stats = (output.signals_skipped_by_regime > 0).then(|| RegimeStats {
        regime_filter: None,
        sub_regime_filter: None,
        signals_skipped_by_regime: output.signals_skipped_by_regime,
    });
    Ok(build_report(strategy_name.into(), output, regime_stats))
}

fn run_engine(
    series: CandleSeries,
    strategy: Box<dyn Strategy>,
    config: EngineConfig,
) -> Result<RunOutput, RunnerError> {
    let engine = BacktestEngine::new(series, strategy, config)?;
    Ok(engine.run())
}

fn build_report(
    strategy_name: String,
    output: RunOutput,
    regime_stats: Option<RegimeStats>,
) -> BacktestReport {
    let metrics = BacktestMetrics::compute(
        &output.portfolio.equity_curve,
        &output.portfolio.trades,
        output.portfolio.initial_capital,
        DEFAULT_PERIODS_PER_YEAR,
    );
    info!(
        strategy = %strategy_name,
        total_return_pct = metrics.total_return_pct,
        trades = metrics.total_trades,
        "backtest report ready"
    );
    BacktestReport {
        strategy_name,
        symbol: output.symbol,
        timeframe: output.timeframe,
        start_date: output.start_time,
        end_date: output.end_time,
        metrics,
        trades: output.portfolio.trades.iter().map(TradeSummary::from).collect(),
        equity_curve: output.portfolio.equity_curve,
        regime_stats,
    }
}
