//! Evaluation runner: validates loaded bars, annotates them, replays the
//! annotated series through the engine and attaches a latest-bar
//! recommendation.
//!
//! Two entry points:
//! - `evaluate()`: one [`EvalConfig`] against pre-loaded bars. Used by the CLI.
//! - `evaluate_signal()`: a single [`SignalConfig`] with shared backtest
//!   settings. Used by `compare` to fan out over annotators.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use evallab_core::domain::{
    to_price_bars, AnnotatedBar, EquityPoint, RawBar, Summary, TradeRecord,
};
use evallab_core::indicators::MovingAverages;
use evallab_core::signals::AnnotatorError;
use evallab_core::{
    advise, run_backtest, validate_initial_cash, validate_raw_bars, Recommendation,
    ValidationError,
};

use crate::config::{BacktestSection, ConfigError, EvalConfig, SignalConfig};
use crate::data_loader::{LoadError, LoadedBars};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),
    #[error("annotator error: {0}")]
    Annotator(#[from] AnnotatorError),
    #[error("signal source 'precomputed' requires a signal column in the input data")]
    MissingSignals,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Complete result of a single evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub symbol: String,
    pub signal_source: String,
    pub bar_count: usize,
    pub start_date: String,
    pub end_date: String,
    pub dataset_hash: String,
    pub initial_cash: f64,
    pub summary: Summary,
    pub trades: Vec<TradeRecord>,
    pub equity_curve: Vec<EquityPoint>,
    #[serde(default)]
    pub recommendation: Option<Recommendation>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Run one evaluation as described by `config`.
pub fn evaluate(config: &EvalConfig, data: &LoadedBars) -> Result<EvaluationResult, RunError> {
    config.validate()?;
    evaluate_signal(&config.signal, &config.backtest, data)
}

/// Run one annotator configuration against `data`.
pub fn evaluate_signal(
    signal: &SignalConfig,
    backtest: &BacktestSection,
    data: &LoadedBars,
) -> Result<EvaluationResult, RunError> {
    validate_initial_cash(backtest.initial_cash)?;
    validate_raw_bars(&data.bars)?;

    let annotated = annotate(signal, data)?;
    let report = run_backtest(&to_price_bars(&annotated), backtest.initial_cash);

    let windows = signal.advice_windows();
    let averages = MovingAverages::compute(&data.bars, windows.short_window, windows.long_window);
    let recommendation = advise(&annotated, &averages);

    let symbol = backtest.symbol.clone().unwrap_or_else(|| "UNKNOWN".to_string());
    info!(
        symbol = %symbol,
        signal = signal.name(),
        bars = data.len(),
        final_value = report.summary.final_value,
        return_percent = report.summary.return_percent,
        "evaluation complete"
    );

    Ok(EvaluationResult {
        schema_version: SCHEMA_VERSION,
        symbol,
        signal_source: signal.name().to_string(),
        bar_count: data.len(),
        start_date: data.bars.first().map(|b| b.date.to_string()).unwrap_or_default(),
        end_date: data.bars.last().map(|b| b.date.to_string()).unwrap_or_default(),
        dataset_hash: dataset_hash(&data.bars),
        initial_cash: backtest.initial_cash,
        summary: report.summary,
        trades: report.trades,
        equity_curve: report.equity_curve,
        recommendation,
    })
}

/// Produce the annotated series for `signal`, either by running the
/// configured annotator or by pairing bars with the loaded signal column.
pub fn annotate(signal: &SignalConfig, data: &LoadedBars) -> Result<Vec<AnnotatedBar>, RunError> {
    match signal.build()? {
        Some(annotator) => Ok(annotator.annotate(&data.bars)),
        None => data.precomputed().ok_or(RunError::MissingSignals),
    }
}

/// Deterministic BLAKE3 hash over every bar field in series order.
///
/// Absent optional fields hash as a marker byte so `None` and `Some(0.0)`
/// differ.
pub fn dataset_hash(bars: &[RawBar]) -> String {
    let mut hasher = blake3::Hasher::new();
    for bar in bars {
        hasher.update(bar.date.to_string().as_bytes());
        for field in [bar.open, bar.high, bar.low] {
            hash_optional(&mut hasher, field.map(f64::to_le_bytes));
        }
        hasher.update(&bar.close.to_le_bytes());
        hash_optional(&mut hasher, bar.volume.map(u64::to_le_bytes));
    }
    hasher.finalize().to_hex().to_string()
}

fn hash_optional(hasher: &mut blake3::Hasher, bytes: Option<[u8; 8]>) {
    match bytes {
        Some(bytes) => {
            hasher.update(&[1]);
            hasher.update(&bytes);
        }
        None => {
            hasher.update(&[0]);
        }
    }
}
