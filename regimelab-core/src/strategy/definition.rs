//! Persisted strategy definitions.
//!
//! The structured form a host stores and ships back to the core: builtin
//! strategies by class name + parameter map, composite strategies as logic
//! trees with optional regime filters. `build` turns a definition into a
//! runnable boxed strategy; `fingerprint` gives a stable identity for
//! caching and audit.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::composite::{CompositeStrategy, LogicTree, SubRegimeFilter};
use super::{
    BollingerReversion, MaCrossover, MacdCross, MaType, RsiReversal, Strategy, StrategyError,
};
use crate::regime::SimplifiedRegime;

/// Scalar parameter value in a strategy definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl ParamValue {
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Self::Int(v) => Some(v as f64),
            Self::Float(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_usize(&self) -> Option<usize> {
        match *self {
            Self::Int(v) if v >= 0 => Some(v as usize),
            Self::Float(v) if v >= 0.0 && v.fract() == 0.0 => Some(v as usize),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyType {
    Builtin,
    Composite,
}

/// A persisted strategy, unique by name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub strategy_type: StrategyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub builtin_class: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub parameters: BTreeMap<String, ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_logic: Option<LogicTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_logic: Option<LogicTree>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regime_filter: Option<Vec<SimplifiedRegime>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub_regime_filter: Option<SubRegimeFilter>,
}

impl StrategyDefinition {
    pub fn builtin(
        name: impl Into<String>,
        builtin_class: impl Into<String>,
        parameters: BTreeMap<String, ParamValue>,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            strategy_type: StrategyType::Builtin,
            builtin_class: Some(builtin_class.into()),
            parameters,
            entry_logic: None,
            exit_logic: None,
            regime_filter: None,
            sub_regime_filter: None,
        }
    }

    pub fn composite(
        name: impl Into<String>,
        entry_logic: LogicTree,
        exit_logic: LogicTree,
    ) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            strategy_type: StrategyType::Composite,
            builtin_class: None,
            parameters: BTreeMap::new(),
            entry_logic: Some(entry_logic),
            exit_logic: Some(exit_logic),
            regime_filter: None,
            sub_regime_filter: None,
        }
    }

    pub fn with_regime_filter(mut self, filter: Vec<SimplifiedRegime>) -> Self {
        self.regime_filter = Some(filter);
        self
    }

    pub fn with_sub_regime_filter(mut self, filter: SubRegimeFilter) -> Self {
        self.sub_regime_filter = Some(filter);
        self
    }

    fn usize_param(&self, key: &str, default: usize) -> usize {
        self.parameters
            .get(key)
            .and_then(|v| v.as_usize())
            .unwrap_or(default)
    }

    fn f64_param(&self, key: &str, default: f64) -> f64 {
        self.parameters
            .get(key)
            .and_then(|v| v.as_f64())
            .unwrap_or(default)
    }

    /// Instantiate the runnable strategy this definition describes.
    pub fn build(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        match self.strategy_type {
            StrategyType::Builtin => self.build_builtin(),
            StrategyType::Composite => self.build_composite(),
        }
    }

    fn build_builtin(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        let class = self
            .builtin_class
            .as_deref()
            .ok_or(StrategyError::MissingBuiltinClass)?;
        match class {
            "MovingAverageCrossover" => {
                let ma_type = match self.parameters.get("ma_type").and_then(|v| v.as_str()) {
                    Some(label) => MaType::from_str(label)?,
                    None => MaType::Sma,
                };
                Ok(Box::new(MaCrossover::new(
                    self.usize_param("fast_period", 20),
                    self.usize_param("slow_period", 50),
                    ma_type,
                )?))
            }
            "RSIReversal" => Ok(Box::new(RsiReversal::new(
                self.usize_param("rsi_period", 14),
                self.f64_param("oversold", 30.0),
                self.f64_param("overbought", 70.0),
            )?)),
            "MACDCross" => Ok(Box::new(MacdCross::new(
                self.usize_param("fast_period", 12),
                self.usize_param("slow_period", 26),
                self.usize_param("signal_period", 9),
            )?)),
            "BollingerBands" => Ok(Box::new(BollingerReversion::new(
                self.usize_param("period", 20),
                self.f64_param("num_std", 2.0),
                self.f64_param("touch_threshold", 0.01),
            )?)),
            other => Err(StrategyError::UnknownBuiltinClass(other.to_string())),
        }
    }

    fn build_composite(&self) -> Result<Box<dyn Strategy>, StrategyError> {
        let (Some(entry), Some(exit)) = (&self.entry_logic, &self.exit_logic) else {
            return Err(StrategyError::MissingLogic);
        };
        Ok(Box::new(CompositeStrategy::new(
            self.name.clone(),
            self.description.clone(),
            entry.clone(),
            exit.clone(),
            self.regime_filter.clone(),
            self.sub_regime_filter.clone(),
        )?))
    }

    /// Deterministic BLAKE3 fingerprint of the canonical JSON form.
    /// Parameter maps are ordered (`BTreeMap`), so the hash is stable
    /// across platforms and runs.
    pub fn fingerprint(&self) -> String {
        let bytes =
            serde_json::to_vec(self).unwrap_or_else(|_| self.name.clone().into_bytes());
        blake3::hash(&bytes).to_hex().to_string()
    }
}
