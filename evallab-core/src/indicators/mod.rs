//! Indicators computed over raw bar history.
//!
//! [`MovingAverages`] is the shared feature set both signal annotators and the
//! advice module read: a short and a long SMA aligned index-for-index with
//! the input bars.

pub mod sma;

pub use sma::Sma;

use crate::domain::RawBar;

/// Short and long SMA series over the same bars.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingAverages {
    pub short: Vec<f64>,
    pub long: Vec<f64>,
}

impl MovingAverages {
    pub fn compute(bars: &[RawBar], short_window: usize, long_window: usize) -> Self {
        Self {
            short: Sma::new(short_window).compute(bars),
            long: Sma::new(long_window).compute(bars),
        }
    }

    /// `short - long` at `index`, if in range.
    pub fn spread(&self, index: usize) -> Option<f64> {
        Some(self.short.get(index)? - self.long.get(index)?)
    }

    pub fn len(&self) -> usize {
        self.short.len()
    }

    pub fn is_empty(&self) -> bool {
        self.short.is_empty()
    }
}

/// Create synthetic bars from close prices for testing.
#[cfg(test)]
pub fn make_bars(closes: &[f64]) -> Vec<RawBar> {
    let base_date = chrono::NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| RawBar::from_close(base_date + chrono::Duration::days(i as i64), close))
        .collect()
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;
