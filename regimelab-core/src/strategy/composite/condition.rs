//! Predicate conditions over indicator values.
//!
//! Numeric comparisons and ranges look at the current value only;
//! crossovers look at the (previous, current) pair. An undefined current
//! value evaluates to false, and crossovers additionally require a defined
//! previous value.

use serde::{Deserialize, Serialize};

/// Tolerance for equality comparisons on indicator values.
const EQUALITY_EPSILON: f64 = 1e-6;

/// A condition over an indicator value, as a tagged sum: each operator
/// carries its own payload. Serializes to the persisted
/// `{operator, threshold, threshold2}` shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConditionRepr", into = "ConditionRepr")]
pub enum Condition {
    GreaterThan(f64),
    LessThan(f64),
    GreaterEqual(f64),
    LessEqual(f64),
    Equal(f64),
    NotEqual(f64),
    Between(f64, f64),
    Outside(f64, f64),
    CrossAbove(f64),
    CrossBelow(f64),
}

impl Condition {
    /// Evaluate at one point. `previous` is only consulted by the
    /// crossover operators.
    pub fn evaluate(&self, current: f64, previous: Option<f64>) -> bool {
        if current.is_nan() {
            return false;
        }
        match *self {
            Self::GreaterThan(t) => current > t,
            Self::LessThan(t) => current < t,
            Self::GreaterEqual(t) => current >= t,
            Self::LessEqual(t) => current <= t,
            Self::Equal(t) => (current - t).abs() < EQUALITY_EPSILON,
            Self::NotEqual(t) => (current - t).abs() >= EQUALITY_EPSILON,
            Self::Between(lo, hi) => current >= lo && current <= hi,
            Self::Outside(lo, hi) => current < lo || current > hi,
            Self::CrossAbove(t) => match previous {
                Some(prev) if !prev.is_nan() => prev <= t && current > t,
                _ => false,
            },
            Self::CrossBelow(t) => match previous {
                Some(prev) if !prev.is_nan() => prev >= t && current < t,
                _ => false,
            },
        }
    }

    /// Evaluate across a whole column. Index i sees (values[i-1],
    /// values[i]); this is definitionally identical to the pointwise form,
    /// which is what makes batch and stepwise strategy evaluation agree.
    pub fn evaluate_series(&self, values: &[f64]) -> Vec<bool> {
        values
            .iter()
            .enumerate()
            .map(|(i, &current)| {
                let previous = if i > 0 { Some(values[i - 1]) } else { None };
                self.evaluate(current, previous)
            })
            .collect()
    }
}

/// Wire shape of a condition.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConditionRepr {
    operator: String,
    threshold: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    threshold2: Option<f64>,
}

impl TryFrom<ConditionRepr> for Condition {
    type Error = String;

    fn try_from(repr: ConditionRepr) -> Result<Self, Self::Error> {
        let need_second = || {
            repr.threshold2
                .ok_or_else(|| format!("{} requires threshold2", repr.operator))
        };
        match repr.operator.as_str() {
            ">" => Ok(Self::GreaterThan(repr.threshold)),
            "<" => Ok(Self::LessThan(repr.threshold)),
            ">=" => Ok(Self::GreaterEqual(repr.threshold)),
            "<=" => Ok(Self::LessEqual(repr.threshold)),
            "==" => Ok(Self::Equal(repr.threshold)),
            "!=" => Ok(Self::NotEqual(repr.threshold)),
            "between" => Ok(Self::Between(repr.threshold, need_second()?)),
            "outside" => Ok(Self::Outside(repr.threshold, need_second()?)),
            "cross_above" => Ok(Self::CrossAbove(repr.threshold)),
            "cross_below" => Ok(Self::CrossBelow(repr.threshold)),
            other => Err(format!("unknown operator: {other}")),
        }
    }
}

impl From<Condition> for ConditionRepr {
    fn from(condition: Condition) -> Self {
        let (operator, threshold, threshold2) = match condition {
            Condition::GreaterThan(t) => (">", t, None),
            Condition::LessThan(t) => ("<", t, None),
            Condition::GreaterEqual(t) => (">=", t, None),
            Condition::LessEqual(t) => ("<=", t, None),
            Condition::Equal(t) => ("==", t, None),
            Condition::NotEqual(t) => ("!=", t, None),
            Condition::Between(lo, hi) => ("between", lo, Some(hi)),
            Condition::Outside(lo, hi) => ("outside", lo, Some(hi)),
            Condition::CrossAbove(t) => ("cross_above", t, None),
            Condition::CrossBelow(t) => ("cross_below", t, None),
        };
        Self {
            operator: operator.to_string(),
            threshold,
            threshold2,
        }
    }
}
