//! Single-pass replay of an annotated bar series through one [`Account`].

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::account::{Account, Execution, Skip};
use crate::domain::{round_cents, EquityPoint, PriceBar, Summary, TradeAction, TradeRecord};

/// Everything one backtest run emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestReport {
    pub summary: Summary,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
}

/// Replay `bars` in the given order, starting with `initial_cash`.
///
/// The first bar is history only; trading starts at index 1 and every later
/// bar contributes exactly one equity point. A position still open after the
/// last bar is liquidated at the last close into the final value, without a
/// closing trade record and without touching the equity curve.
///
/// Closes must be finite and positive; validate with
/// [`crate::validate::validate_bars`] at the boundary. Fewer than two bars
/// yields empty logs and a zero-return summary.
pub fn run_backtest(bars: &[PriceBar], initial_cash: f64) -> BacktestReport {
    if bars.len() < 2 {
        return BacktestReport {
            summary: Summary::flat(initial_cash),
            trades: Vec::new(),
            equity_curve: Vec::new(),
        };
    }

    let mut account = Account::new(initial_cash);
    let mut trades = Vec::new();
    let mut equity_curve = Vec::with_capacity(bars.len() - 1);

    for bar in &bars[1..] {
        let price = bar.close;
        match account.apply(bar.signal, price) {
            Ok(execution) => {
                let record = trade_record(bar, execution, account.cash());
                debug!(
                    date = %record.date,
                    action = %record.action,
                    shares = record.shares,
                    price = record.price,
                    "executed trade"
                );
                trades.push(record);
            }
            Err(Skip::InsufficientCash) => {
                warn!(
                    date = %bar.date,
                    price,
                    cash = account.cash(),
                    "buy skipped: cash below one share"
                );
            }
            Err(Skip::NoTransition) => {}
        }

        equity_curve.push(EquityPoint {
            date: bar.date,
            equity: round_cents(account.equity(price)),
            close: round_cents(price),
        });
    }

    if let Some(last) = bars.last() {
        let proceeds = account.liquidate(last.close);
        if proceeds > 0.0 {
            debug!(date = %last.date, proceeds, "open position marked to final close");
        }
    }

    let summary = Summary::compute(initial_cash, account.cash(), &trades);
    let buys = trades.iter().filter(|t| t.action == TradeAction::Buy).count();
    info!(
        bars = bars.len(),
        buys,
        sells = trades.len() - buys,
        final_value = summary.final_value,
        return_percent = summary.return_percent,
        "backtest complete"
    );

    BacktestReport {
        summary,
        trades,
        equity_curve,
    }
}

fn trade_record(bar: &PriceBar, execution: Execution, cash_after: f64) -> TradeRecord {
    let (action, shares, price, pnl) = match execution {
        Execution::Bought { shares, price } => (TradeAction::Buy, shares, price, None),
        Execution::Sold { shares, price, pnl } => {
            (TradeAction::Sell, shares, price, Some(round_cents(pnl)))
        }
    };
    TradeRecord {
        date: bar.date,
        action,
        price: round_cents(price),
        shares,
        cash_after: round_cents(cash_after),
        pnl,
    }
}
