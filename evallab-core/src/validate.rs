//! Boundary checks run before a series reaches the engine.
//!
//! The engine trusts its input: a non-finite or non-positive close is a
//! contract violation there. Callers that accept external data run these
//! checks first and surface a descriptive [`ValidationError`] instead.

use chrono::NaiveDate;
use thiserror::Error;

use crate::domain::{BarError, PriceBar, RawBar};

#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("bar series is empty")]
    Empty,
    #[error("bar {index} ({date}): close {close} is not a positive finite price")]
    InvalidClose {
        index: usize,
        date: NaiveDate,
        close: f64,
    },
    #[error("initial cash {0} must be positive and finite")]
    InvalidInitialCash(f64),
    #[error(transparent)]
    Bar(#[from] BarError),
}

pub fn validate_initial_cash(initial_cash: f64) -> Result<(), ValidationError> {
    if initial_cash.is_finite() && initial_cash > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::InvalidInitialCash(initial_cash))
    }
}

/// Check every close in an engine-ready series.
///
/// Date ordering is not checked; the series order is the
/// simulation timeline.
pub fn validate_bars(bars: &[PriceBar]) -> Result<(), ValidationError> {
    check_closes(bars.iter().map(|b| (b.date, b.close)))
}

/// Same checks for raw bars before annotation.
pub fn validate_raw_bars(bars: &[RawBar]) -> Result<(), ValidationError> {
    check_closes(bars.iter().map(|b| (b.date, b.close)))
}

fn check_closes(
    closes: impl ExactSizeIterator<Item = (NaiveDate, f64)>,
) -> Result<(), ValidationError> {
    if closes.len() == 0 {
        return Err(ValidationError::Empty);
    }
    for (index, (date, close)) in closes.enumerate() {
        if !(close.is_finite() && close > 0.0) {
            return Err(ValidationError::InvalidClose { index, date, close });
        }
    }
    Ok(())
}
