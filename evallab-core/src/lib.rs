//! evallab core: domain types, single-position backtest engine, indicators,
//! and signal annotators.
//!
//! This crate is pure computation:
//! - Domain types (bars, signals, trade records, equity points, summary)
//! - Bar-by-bar replay through a flat/long account state machine
//! - Boundary validation for externally supplied series
//! - Simple moving averages and the two signal annotators built on them
//! - Latest-bar recommendation with a moving-average confidence score

pub mod advice;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod signals;
pub mod validate;

pub use advice::{advise, ConfidenceLevel, Recommendation};
pub use domain::{AnnotatedBar, EquityPoint, PriceBar, RawBar, Signal, Summary, TradeRecord};
pub use engine::{run_backtest, BacktestReport};
pub use validate::{validate_bars, validate_initial_cash, validate_raw_bars, ValidationError};
