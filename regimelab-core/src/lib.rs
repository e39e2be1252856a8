//! RegimeLab Core — indicator pipeline, market regime classifier, and the
//! event-driven backtest engine.
//!
//! This crate contains the heart of the research tool:
//! - Domain types (candles, events, positions, trades, portfolio)
//! - Bar-indexed technical indicators with explicit warm-up
//! - 3-axis regime classifier (trend × volatility × momentum) with
//!   adaptive percentile thresholds and no look-ahead
//! - Strategy trait, the four built-in strategies, and composable
//!   boolean-tree strategies with regime filtering
//! - Chronological event loop with slippage and commission
//!
//! The core is single-threaded and fully deterministic: for fixed inputs the
//! trade list and equity curve are byte-identical across runs. Metrics and
//! the structured result record live in `regimelab-runner`.

pub mod domain;
pub mod engine;
pub mod indicators;
pub mod regime;
pub mod strategy;
