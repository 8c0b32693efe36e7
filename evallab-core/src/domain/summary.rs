//! Summary: aggregate outcome of one backtest run.

use serde::{Deserialize, Serialize};

use super::money::round_cents;
use super::trade::TradeRecord;

/// End-of-run statistics. Money and percentage fields are rounded to cents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub initial_cash: f64,
    pub final_value: f64,
    pub return_percent: f64,
    pub total_trades: usize,
    pub profitable_trades: usize,
    pub losing_trades: usize,
}

impl Summary {
    /// Build the summary from the unrounded final cash and the trade log.
    ///
    /// Trades with zero pnl and BUY entries count toward neither the
    /// profitable nor the losing tally.
    pub fn compute(initial_cash: f64, final_value: f64, trades: &[TradeRecord]) -> Self {
        let return_percent = (final_value - initial_cash) / initial_cash * 100.0;
        Self {
            initial_cash: round_cents(initial_cash),
            final_value: round_cents(final_value),
            return_percent: round_cents(return_percent),
            total_trades: trades.len(),
            profitable_trades: trades.iter().filter(|t| t.is_winner()).count(),
            losing_trades: trades.iter().filter(|t| t.is_loser()).count(),
        }
    }

    /// Summary of a run in which nothing happened.
    pub fn flat(initial_cash: f64) -> Self {
        Self::compute(initial_cash, initial_cash, &[])
    }
}
