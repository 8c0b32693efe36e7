//! Backtesting engine: run-scoped account state machine and the bar replay loop.

pub mod account;
pub mod backtest;

pub use account::{Account, Execution, Holding, Skip};
pub use backtest::{run_backtest, BacktestReport};
