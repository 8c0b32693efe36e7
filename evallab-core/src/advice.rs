//! Latest-bar recommendation with a moving-average confidence score.
//!
//! The recommendation is structured data only: the action of the final
//! annotated bar together with the SMA pair and a 0-100 confidence derived
//! from how far apart the averages are.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{AnnotatedBar, Signal};
use crate::indicators::MovingAverages;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

impl ConfidenceLevel {
    pub fn from_score(score: u8) -> Self {
        match score {
            0..=4 => ConfidenceLevel::Low,
            5..=9 => ConfidenceLevel::Medium,
            _ => ConfidenceLevel::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub date: NaiveDate,
    pub action: Signal,
    pub short_ma: f64,
    pub long_ma: f64,
    /// `|short - long| / short` as a whole percentage, capped at 100.
    pub confidence: u8,
    pub level: ConfidenceLevel,
}

/// Percentage gap between the averages relative to the short one.
pub fn confidence_score(short_ma: f64, long_ma: f64) -> u8 {
    if short_ma == 0.0 {
        return 0;
    }
    let ratio = ((short_ma - long_ma).abs() / short_ma.abs() * 100.0).min(100.0);
    if ratio.is_nan() {
        return 0;
    }
    ratio.round() as u8
}

/// Recommendation for the last bar of an annotated series.
///
/// `averages` must be aligned with `annotated`. Returns `None` for an empty
/// series.
pub fn advise(annotated: &[AnnotatedBar], averages: &MovingAverages) -> Option<Recommendation> {
    let last_index = annotated.len().checked_sub(1)?;
    let latest = &annotated[last_index];
    let short_ma = *averages.short.get(last_index)?;
    let long_ma = *averages.long.get(last_index)?;
    let confidence = confidence_score(short_ma, long_ma);

    Some(Recommendation {
        date: latest.bar.date,
        action: latest.signal,
        short_ma,
        long_ma,
        confidence,
        level: ConfidenceLevel::from_score(confidence),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::make_bars;
    use crate::signals::{MaCrossover, MaCrossoverParams, SignalAnnotator};

    #[test]
    fn score_is_relative_gap_percent() {
        assert_eq!(confidence_score(100.0, 96.0), 4);
        assert_eq!(confidence_score(100.0, 107.4), 7);
        assert_eq!(confidence_score(10.0, 40.0), 100);
        assert_eq!(confidence_score(0.0, 5.0), 0);
    }

    #[test]
    fn levels_follow_thresholds() {
        assert_eq!(ConfidenceLevel::from_score(4), ConfidenceLevel::Low);
        assert_eq!(ConfidenceLevel::from_score(5), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(9), ConfidenceLevel::Medium);
        assert_eq!(ConfidenceLevel::from_score(10), ConfidenceLevel::High);
    }

    #[test]
    fn advises_on_latest_bar() {
        let params = MaCrossoverParams {
            short_window: 2,
            long_window: 4,
        };
        let bars = make_bars(&[10.0, 12.0, 14.0, 16.0]);
        let annotated = MaCrossover::new(params).unwrap().annotate(&bars);
        let averages = params.moving_averages(&bars);

        let rec = advise(&annotated, &averages).unwrap();
        assert_eq!(rec.date, bars[3].date);
        assert_eq!(rec.action, Signal::Buy);
        assert_eq!(rec.short_ma, 15.0);
        assert_eq!(rec.long_ma, 13.0);
        // 2 / 15 = 13.3%
        assert_eq!(rec.confidence, 13);
        assert_eq!(rec.level, ConfidenceLevel::High);
    }

    #[test]
    fn empty_series_has_no_advice() {
        let averages = MovingAverages::compute(&[], 2, 4);
        assert_eq!(advise(&[], &averages), None);
    }
}
