//! Simple Moving Average (SMA) with a warm-up that never emits NaN.
//!
//! Until `period` closes are available the mean is taken over every close
//! seen so far (an expanding window), then the window rolls. Values are
//! rounded to cents, which is what the crossover comparison operates on.

use crate::domain::{round_cents, RawBar};

#[derive(Debug, Clone)]
pub struct Sma {
    period: usize,
    name: String,
}

impl Sma {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "SMA period must be >= 1");
        Self {
            period,
            name: format!("sma_{period}"),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Compute the series for `bars`; output has the same length.
    pub fn compute(&self, bars: &[RawBar]) -> Vec<f64> {
        let mut result = Vec::with_capacity(bars.len());
        let mut sum = 0.0;

        for (i, bar) in bars.iter().enumerate() {
            sum += bar.close;
            if i >= self.period {
                sum -= bars[i - self.period].close;
            }
            let count = (i + 1).min(self.period);
            result.push(round_cents(sum / count as f64));
        }

        result
    }
}
