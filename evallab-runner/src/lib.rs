//! evallab runner: evaluation orchestration on top of `evallab-core`.
//!
//! This crate provides:
//! - TOML evaluation config (signal source + starting cash)
//! - CSV bar loading with optional precomputed signal column
//! - Single-evaluation runner with dataset hashing and latest-bar advice
//! - Parallel comparison of several signal sources over the same bars
//! - JSON manifest and CSV trade log / equity curve export

pub mod compare;
pub mod config;
pub mod data_loader;
pub mod export;
pub mod runner;

pub use compare::{compare, crossover_grid, Comparison};
pub use config::{BacktestSection, ConfigError, EvalConfig, SignalConfig, DEFAULT_INITIAL_CASH};
pub use data_loader::{load_bars, load_bars_from_reader, LoadError, LoadedBars};
pub use export::{export_json, import_json, load_artifacts, save_artifacts};
pub use runner::{
    annotate, dataset_hash, evaluate, evaluate_signal, EvaluationResult, RunError, SCHEMA_VERSION,
};
