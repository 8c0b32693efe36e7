//! Run-scoped cash account with a single long-only position.
//!
//! The holding is a two-state machine. Transitions are driven by
//! `(signal, holding)` pairs; every pair that is not an explicit transition
//! leaves the account untouched, which is what makes pyramiding (BUY while
//! long) and shorting (SELL while flat) unrepresentable.

use crate::domain::Signal;

/// What the account currently holds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Holding {
    Flat,
    Long { shares: u64, entry_price: f64 },
}

/// A transition that changed the account.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Execution {
    Bought { shares: u64, price: f64 },
    Sold { shares: u64, price: f64, pnl: f64 },
}

/// Why a signal produced no execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Skip {
    /// HOLD, or a BUY/SELL that does not apply to the current holding.
    NoTransition,
    /// BUY while flat, but cash does not cover a single share.
    InsufficientCash,
}

/// Cash plus holding, owned by exactly one simulation run.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    cash: f64,
    holding: Holding,
}

impl Account {
    pub fn new(initial_cash: f64) -> Self {
        Self {
            cash: initial_cash,
            holding: Holding::Flat,
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn holding(&self) -> Holding {
        self.holding
    }

    pub fn shares(&self) -> u64 {
        match self.holding {
            Holding::Flat => 0,
            Holding::Long { shares, .. } => shares,
        }
    }

    pub fn entry_price(&self) -> Option<f64> {
        match self.holding {
            Holding::Flat => None,
            Holding::Long { entry_price, .. } => Some(entry_price),
        }
    }

    /// Cash plus the open position marked at `price`.
    pub fn equity(&self, price: f64) -> f64 {
        self.cash + self.shares() as f64 * price
    }

    /// Apply one bar's signal at `price`.
    pub fn apply(&mut self, signal: Signal, price: f64) -> Result<Execution, Skip> {
        match (signal, self.holding) {
            (Signal::Buy, Holding::Flat) => self.open_long(price),
            (Signal::Sell, Holding::Long { shares, entry_price }) => {
                Ok(self.close_long(shares, entry_price, price))
            }
            (Signal::Hold, _)
            | (Signal::Buy, Holding::Long { .. })
            | (Signal::Sell, Holding::Flat) => Err(Skip::NoTransition),
        }
    }

    /// Move any open position into cash at `price` without recording a trade.
    ///
    /// Returns the proceeds credited.
    pub fn liquidate(&mut self, price: f64) -> f64 {
        let proceeds = self.shares() as f64 * price;
        self.cash += proceeds;
        self.holding = Holding::Flat;
        proceeds
    }

    fn open_long(&mut self, price: f64) -> Result<Execution, Skip> {
        let shares = affordable_shares(self.cash, price);
        if shares == 0 {
            return Err(Skip::InsufficientCash);
        }
        self.cash -= shares as f64 * price;
        self.holding = Holding::Long {
            shares,
            entry_price: price,
        };
        Ok(Execution::Bought { shares, price })
    }

    fn close_long(&mut self, shares: u64, entry_price: f64, price: f64) -> Execution {
        let pnl = (price - entry_price) * shares as f64;
        let pnl = if pnl.is_nan() { 0.0 } else { pnl };
        self.cash += shares as f64 * price;
        self.holding = Holding::Flat;
        Execution::Sold { shares, price, pnl }
    }
}

/// Exact `floor(cash / price)` for positive operands.
///
/// The quotient is taken from the remainder (`cash % price` is an exact
/// fmod), not from `cash / price`, which can round up to the next integer
/// and buy a share the cash cannot cover.
fn affordable_shares(cash: f64, price: f64) -> u64 {
    let rem = cash % price;
    let div = (cash - rem) / price;
    let mut shares = div.floor();
    if div - shares > 0.5 {
        shares += 1.0;
    }
    if !shares.is_finite() || shares < 1.0 {
        return 0;
    }
    shares as u64
}
