//! TradeRecord: one executed BUY or SELL in the trade log.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Side of an executed trade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeAction {
    Buy,
    Sell,
}

impl fmt::Display for TradeAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeAction::Buy => f.write_str("BUY"),
            TradeAction::Sell => f.write_str("SELL"),
        }
    }
}

/// An immutable trade log entry.
///
/// `price`, `cash_after` and `pnl` are already rounded to cents. `pnl` is the
/// realized profit of the closed position and is only present on SELL entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TradeRecord {
    pub date: NaiveDate,
    pub action: TradeAction,
    pub price: f64,
    pub shares: u64,
    #[serde(rename = "cash")]
    pub cash_after: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pnl: Option<f64>,
}

impl TradeRecord {
    pub fn is_winner(&self) -> bool {
        self.pnl.is_some_and(|pnl| pnl > 0.0)
    }

    pub fn is_loser(&self) -> bool {
        self.pnl.is_some_and(|pnl| pnl < 0.0)
    }
}
