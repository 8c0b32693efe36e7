//! EquityPoint: mark-to-market account value at one bar's close.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Account value after processing a bar: `cash + shares * close`, in cents.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
    pub close: f64,
}
