//! Rolling state helpers shared by the built-in strategies.

use crate::domain::Candle;
use std::collections::VecDeque;

/// Bounded buffer of recent candles.
///
/// Strategies keep only as much history as their indicators need; the
/// engine never hands them the full series through this path.
#[derive(Debug, Clone)]
pub struct BarBuffer {
    capacity: usize,
    candles: VecDeque<Candle>,
}

impl BarBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            candles: VecDeque::with_capacity(capacity + 1),
        }
    }

    pub fn push(&mut self, candle: Candle) {
        self.candles.push_back(candle);
        if self.candles.len() > self.capacity {
            self.candles.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.candles.iter().map(|c| c.close).collect()
    }

    /// SMA of the last `period` closes, `None` with insufficient data.
    pub fn sma(&self, period: usize) -> Option<f64> {
        if self.candles.len() < period {
            return None;
        }
        let sum: f64 = self
            .candles
            .iter()
            .rev()
            .take(period)
            .map(|c| c.close)
            .sum();
        Some(sum / period as f64)
    }
}

/// Incremental EMA seeded from the SMA of the first `period` inputs.
///
/// Produces exactly the same sequence as the batch EMA column, which keeps
/// event-driven strategies equivalent to their precomputed form.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    alpha: f64,
    seed_sum: f64,
    seed_count: usize,
    value: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            alpha: 2.0 / (period as f64 + 1.0),
            seed_sum: 0.0,
            seed_count: 0,
            value: None,
        }
    }

    /// Feed the next value; returns the EMA once seeded.
    pub fn update(&mut self, input: f64) -> Option<f64> {
        match self.value {
            Some(prev) => {
                let ema = self.alpha * input + (1.0 - self.alpha) * prev;
                self.value = Some(ema);
            }
            None => {
                self.seed_sum += input;
                self.seed_count += 1;
                if self.seed_count == self.period {
                    self.value = Some(self.seed_sum / self.period as f64);
                }
            }
        }
        self.value
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }
}
