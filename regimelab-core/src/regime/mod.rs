//! Market regime classification.
//!
//! Event-driven 3-axis classifier (trend × volatility × momentum) with
//! adaptive percentile thresholds. The label for bar t depends only on
//! bars ≤ t; classifying bar-by-bar or in one batch pass produces
//! identical labels.

pub mod adaptive;
pub mod classifier;

pub use adaptive::{AdaptiveThresholds, VolatilityThresholds};
pub use classifier::{
    MomentumState, RegimeClassifier, RegimeColumns, RegimeConfig, RegimeRecord, SimplifiedRegime,
    TrendState, UnknownRegimeLabel, VolatilityState,
};
