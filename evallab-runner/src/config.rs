//! TOML evaluation configuration.
//!
//! ```toml
//! [backtest]
//! symbol = "AAPL"
//! initial_cash = 10000.0
//!
//! [signal]
//! type = "ma_crossover"
//! short_window = 10
//! long_window = 50
//! ```
//!
//! Every section and field is optional; omitted values fall back to a 10/50
//! crossover with 10 000 starting cash.

use std::path::{Path, PathBuf};

use evallab_core::signals::{
    AnnotatorError, MaCrossover, MaCrossoverParams, QLearner, QLearningParams, SignalAnnotator,
};
use evallab_core::{validate_initial_cash, ValidationError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_INITIAL_CASH: f64 = 10_000.0;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid signal config: {0}")]
    Annotator(#[from] AnnotatorError),
    #[error("invalid backtest config: {0}")]
    Validation(#[from] ValidationError),
}

/// Full configuration for one evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    pub backtest: BacktestSection,
    pub signal: SignalConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    /// Label carried into results and artifact names.
    pub symbol: Option<String>,
    pub initial_cash: f64,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            symbol: None,
            initial_cash: DEFAULT_INITIAL_CASH,
        }
    }
}

/// Which annotator produces the signal column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalConfig {
    MaCrossover(MaCrossoverParams),
    QLearning(QLearningParams),
    /// Use the `signal` column already present in the input data.
    Precomputed,
}

impl Default for SignalConfig {
    fn default() -> Self {
        SignalConfig::MaCrossover(MaCrossoverParams::default())
    }
}

impl SignalConfig {
    pub fn name(&self) -> &'static str {
        match self {
            SignalConfig::MaCrossover(_) => "ma_crossover",
            SignalConfig::QLearning(_) => "q_learning",
            SignalConfig::Precomputed => "precomputed",
        }
    }

    /// Build the configured annotator; `None` for precomputed signals.
    pub fn build(&self) -> Result<Option<Box<dyn SignalAnnotator>>, AnnotatorError> {
        let annotator: Box<dyn SignalAnnotator> = match self {
            SignalConfig::MaCrossover(params) => Box::new(MaCrossover::new(*params)?),
            SignalConfig::QLearning(params) => Box::new(QLearner::new(*params)?),
            SignalConfig::Precomputed => return Ok(None),
        };
        Ok(Some(annotator))
    }

    /// SMA windows used for the latest-bar recommendation.
    pub fn advice_windows(&self) -> MaCrossoverParams {
        match self {
            SignalConfig::MaCrossover(params) => *params,
            SignalConfig::QLearning(params) => params.windows(),
            SignalConfig::Precomputed => MaCrossoverParams::default(),
        }
    }

    pub fn validate(&self) -> Result<(), AnnotatorError> {
        match self {
            SignalConfig::MaCrossover(params) => params.validate(),
            SignalConfig::QLearning(params) => params.validate(),
            SignalConfig::Precomputed => Ok(()),
        }
    }
}

impl EvalConfig {
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: EvalConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_initial_cash(self.backtest.initial_cash)?;
        self.signal.validate()?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
