//! Engine configuration and its construction-time validation.

use thiserror::Error;

use crate::domain::DataError;
use crate::regime::RegimeConfig;

/// Errors that abort a run before the loop starts.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("initial_capital must be > 0, got {0}")]
    InvalidInitialCapital(f64),
    #[error("commission_rate must be >= 0, got {0}")]
    InvalidCommissionRate(f64),
    #[error("slippage_rate must be >= 0, got {0}")]
    InvalidSlippageRate(f64),
    #[error("position_size_pct must be in (0, 1], got {0}")]
    InvalidPositionSize(f64),
    #[error(transparent)]
    Data(#[from] DataError),
}

/// Backtest run configuration.
///
/// Rates are fractions: commission_rate 0.001 = 10 bps per fill,
/// slippage_rate the adverse price adjustment applied to the bar close.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub initial_capital: f64,
    pub commission_rate: f64,
    pub slippage_rate: f64,
    /// Fraction of cash deployed per entry, in (0, 1].
    pub position_size_pct: f64,
    pub enable_regime_detection: bool,
    pub regime: RegimeConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_capital: 10_000.0,
            commission_rate: 0.001,
            slippage_rate: 0.0005,
            position_size_pct: 1.0,
            enable_regime_detection: true,
            regime: RegimeConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<(), EngineError> {
        if !(self.initial_capital > 0.0) || !self.initial_capital.is_finite() {
            return Err(EngineError::InvalidInitialCapital(self.initial_capital));
        }
        if !(self.commission_rate >= 0.0) || !self.commission_rate.is_finite() {
            return Err(EngineError::InvalidCommissionRate(self.commission_rate));
        }
        if !(self.slippage_rate >= 0.0) || !self.slippage_rate.is_finite() {
            return Err(EngineError::InvalidSlippageRate(self.slippage_rate));
        }
        if !(self.position_size_pct > 0.0 && self.position_size_pct <= 1.0) {
            return Err(EngineError::InvalidPositionSize(self.position_size_pct));
        }
        Ok(())
    }
}
