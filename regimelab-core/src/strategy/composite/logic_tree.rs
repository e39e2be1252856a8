//! Boolean logic trees over indicator predicates.
//!
//! A tree is either a leaf (one predicate) or a branch (AND/OR over child
//! trees). AND of no children is true, OR of no children is false, and a
//! single-child branch is transparent.

use serde::{Deserialize, Serialize};

use super::signal::IndicatorSignal;
use crate::domain::Candle;
use crate::strategy::StrategyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogicOperator {
    And,
    Or,
}

/// Discriminated logic tree; serializes with an explicit `type` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LogicTree {
    Leaf {
        signal: IndicatorSignal,
    },
    Branch {
        operator: LogicOperator,
        children: Vec<LogicTree>,
    },
}

impl LogicTree {
    pub fn leaf(signal: IndicatorSignal) -> Self {
        Self::Leaf { signal }
    }

    /// AND over signals; a single signal collapses to a leaf.
    pub fn all(signals: Vec<IndicatorSignal>) -> Self {
        Self::combine(LogicOperator::And, signals)
    }

    /// OR over signals; a single signal collapses to a leaf.
    pub fn any(signals: Vec<IndicatorSignal>) -> Self {
        Self::combine(LogicOperator::Or, signals)
    }

    fn combine(operator: LogicOperator, mut signals: Vec<IndicatorSignal>) -> Self {
        if signals.len() == 1 {
            return Self::leaf(signals.remove(0));
        }
        Self::Branch {
            operator,
            children: signals.into_iter().map(Self::leaf).collect(),
        }
    }

    /// All predicates in the tree, leaves first, depth first.
    pub fn signals(&self) -> Vec<&IndicatorSignal> {
        let mut out = Vec::new();
        self.collect_signals(&mut out);
        out
    }

    fn collect_signals<'a>(&'a self, out: &mut Vec<&'a IndicatorSignal>) {
        match self {
            Self::Leaf { signal } => out.push(signal),
            Self::Branch { children, .. } => {
                for child in children {
                    child.collect_signals(out);
                }
            }
        }
    }

    /// Validate every predicate in the tree.
    pub fn validate(&self) -> Result<(), StrategyError> {
        for signal in self.signals() {
            signal.validate()?;
        }
        Ok(())
    }

    /// Longest indicator warm-up among the leaves.
    pub fn warmup_bars(&self) -> usize {
        self.signals()
            .iter()
            .map(|s| s.lookback())
            .max()
            .unwrap_or(0)
    }

    /// Evaluate the tree at one bar of the given history.
    pub fn evaluate_at(&self, candles: &[Candle], index: usize) -> bool {
        match self {
            Self::Leaf { signal } => signal.evaluate_at(candles, index),
            Self::Branch { operator, children } => match operator {
                LogicOperator::And => children.iter().all(|c| c.evaluate_at(candles, index)),
                LogicOperator::Or => children.iter().any(|c| c.evaluate_at(candles, index)),
            },
        }
    }

    /// Evaluate the tree across the whole history.
    pub fn evaluate_series(&self, candles: &[Candle]) -> Vec<bool> {
        match self {
            Self::Leaf { signal } => signal.evaluate_series(candles),
            Self::Branch { operator, children } => {
                let identity = *operator == LogicOperator::And;
                let mut combined = vec![identity; candles.len()];
                for child in children {
                    let series = child.evaluate_series(candles);
                    for (acc, value) in combined.iter_mut().zip(series) {
                        match operator {
                            LogicOperator::And => *acc = *acc && value,
                            LogicOperator::Or => *acc = *acc || value,
                        }
                    }
                }
                combined
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_candles;
    use crate::strategy::composite::condition::Condition;
    use crate::strategy::composite::signal::{IndicatorKind, SignalParams};

    fn sma_above(period: usize, threshold: f64) -> IndicatorSignal {
        IndicatorSignal::new(
            format!("SMA{period}_above"),
            IndicatorKind::Sma,
            SignalParams {
                period: Some(period),
                ..Default::default()
            },
            Condition::GreaterThan(threshold),
        )
    }

    #[test]
    fn empty_and_is_true_empty_or_is_false() {
        let candles = make_candles(&[100.0, 101.0, 102.0]);
        let and = LogicTree::Branch {
            operator: LogicOperator::And,
            children: vec![],
        };
        let or = LogicTree::Branch {
            operator: LogicOperator::Or,
            children: vec![],
        };
        assert_eq!(and.evaluate_series(&candles), vec![true, true, true]);
        assert_eq!(or.evaluate_series(&candles), vec![false, false, false]);
        assert!(and.evaluate_at(&candles, 0));
        assert!(!or.evaluate_at(&candles, 0));
    }

    #[test]
    fn single_child_branch_is_transparent() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0]);
        let leaf = LogicTree::leaf(sma_above(2, 100.5));
        let branch = LogicTree::Branch {
            operator: LogicOperator::And,
            children: vec![leaf.clone()],
        };
        assert_eq!(branch.evaluate_series(&candles), leaf.evaluate_series(&candles));
    }

    #[test]
    fn and_requires_all_children() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let tree = LogicTree::all(vec![sma_above(2, 100.0), sma_above(2, 1000.0)]);
        assert!(tree.evaluate_series(&candles).iter().all(|v| !v));
    }

    #[test]
    fn or_requires_any_child() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        let tree = LogicTree::any(vec![sma_above(2, 100.0), sma_above(2, 1000.0)]);
        let series = tree.evaluate_series(&candles);
        assert!(!series[0]); // warm-up
        assert!(series[1..].iter().all(|v| *v));
    }

    #[test]
    fn nested_tree_evaluates_depth_first() {
        let candles = make_candles(&[100.0, 101.0, 102.0, 103.0, 104.0]);
        // (always ∧ never) ∨ always → always (after warm-up)
        let tree = LogicTree::Branch {
            operator: LogicOperator::Or,
            children: vec![
                LogicTree::all(vec![sma_above(2, 100.0), sma_above(2, 1000.0)]),
                LogicTree::leaf(sma_above(2, 100.0)),
            ],
        };
        let series = tree.evaluate_series(&candles);
        assert!(series[4]);
        for i in 0..candles.len() {
            assert_eq!(tree.evaluate_at(&candles, i), series[i]);
        }
    }

    #[test]
    fn warmup_is_max_of_leaves() {
        let tree = LogicTree::all(vec![sma_above(5, 0.0), sma_above(50, 0.0)]);
        assert_eq!(tree.warmup_bars(), 49);
    }

    #[test]
    fn serialization_roundtrip_with_type_tags() {
        let tree = LogicTree::Branch {
            operator: LogicOperator::Or,
            children: vec![
                LogicTree::leaf(sma_above(5, 100.0)),
                LogicTree::all(vec![sma_above(10, 100.0), sma_above(20, 100.0)]),
            ],
        };
        let json = serde_json::to_value(&tree).unwrap();
        assert_eq!(json["type"], "branch");
        assert_eq!(json["operator"], "OR");
        assert_eq!(json["children"][0]["type"], "leaf");

        let deser: LogicTree = serde_json::from_value(json).unwrap();
        assert_eq!(tree, deser);
    }
}
