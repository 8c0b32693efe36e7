//! Moving average crossover annotator.
//!
//! Each bar is classified by where the short SMA sits relative to the long
//! SMA on that bar: above is Buy, below is Sell, equal is Hold. This is a
//! regime label rather than a one-shot cross event; the engine's
//! flat/long state machine turns the regime into at most one entry and one
//! exit per cross.

use serde::{Deserialize, Serialize};

use super::{AnnotatorError, SignalAnnotator};
use crate::domain::{round_cents, AnnotatedBar, RawBar, Signal};
use crate::indicators::MovingAverages;

/// Window lengths for [`MaCrossover`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaCrossoverParams {
    pub short_window: usize,
    pub long_window: usize,
}

impl Default for MaCrossoverParams {
    fn default() -> Self {
        Self {
            short_window: 10,
            long_window: 50,
        }
    }
}

impl MaCrossoverParams {
    pub fn validate(&self) -> Result<(), AnnotatorError> {
        if self.short_window == 0 || self.long_window <= self.short_window {
            return Err(AnnotatorError::InvalidWindows {
                short: self.short_window,
                long: self.long_window,
            });
        }
        Ok(())
    }

    pub fn moving_averages(&self, bars: &[RawBar]) -> MovingAverages {
        MovingAverages::compute(bars, self.short_window, self.long_window)
    }
}

#[derive(Debug, Clone)]
pub struct MaCrossover {
    params: MaCrossoverParams,
}

impl MaCrossover {
    pub fn new(params: MaCrossoverParams) -> Result<Self, AnnotatorError> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> MaCrossoverParams {
        self.params
    }
}

impl Default for MaCrossover {
    fn default() -> Self {
        Self {
            params: MaCrossoverParams::default(),
        }
    }
}

/// Classify a short/long pair.
pub fn crossover_signal(short: f64, long: f64) -> Signal {
    if short > long {
        Signal::Buy
    } else if short < long {
        Signal::Sell
    } else {
        Signal::Hold
    }
}

impl SignalAnnotator for MaCrossover {
    fn name(&self) -> &str {
        "ma_crossover"
    }

    fn annotate(&self, bars: &[RawBar]) -> Vec<AnnotatedBar> {
        let mas = self.params.moving_averages(bars);
        bars.iter()
            .zip(mas.short.iter().zip(&mas.long))
            .map(|(bar, (&short, &long))| AnnotatedBar {
                bar: bar.clone(),
                signal: crossover_signal(short, long),
                strength: Some(round_cents((short - long).abs())),
            })
            .collect()
    }
}
