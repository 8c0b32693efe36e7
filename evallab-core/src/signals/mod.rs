//! Signal annotation: turns raw bars into the signal-bearing series the
//! engine replays.
//!
//! Annotators are interchangeable: the engine only sees the resulting
//! `signal` per bar and has no dependency on how it was derived. Any
//! randomness an annotator uses must come from an explicit seed so that the
//! same input always produces the same annotation.

pub mod ma_crossover;
pub mod q_learning;

pub use ma_crossover::{MaCrossover, MaCrossoverParams};
pub use q_learning::{QLearner, QLearningParams, QTable};

use thiserror::Error;

use crate::domain::{AnnotatedBar, RawBar};

/// Invalid annotator parameters.
#[derive(Debug, Error, PartialEq)]
pub enum AnnotatorError {
    #[error("invalid windows: short={short}, long={long} (need 1 <= short < long)")]
    InvalidWindows { short: usize, long: usize },
    #[error("invalid {name}={value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Produces a per-bar signal for an ordered bar series.
///
/// # Contract
/// The output has the same length and order as `bars`, and `output[i].bar`
/// equals `bars[i]`.
pub trait SignalAnnotator: Send + Sync {
    /// Human-readable name (e.g., "ma_crossover").
    fn name(&self) -> &str;

    fn annotate(&self, bars: &[RawBar]) -> Vec<AnnotatedBar>;
}
