//! Side-by-side evaluation of several signal sources over the same bars.
//!
//! Each evaluation owns its own account and annotator, so configurations run
//! in parallel on the rayon pool with no shared state. Results come back in
//! configuration order regardless of scheduling.

use evallab_core::signals::MaCrossoverParams;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::{BacktestSection, SignalConfig};
use crate::data_loader::LoadedBars;
use crate::runner::{evaluate_signal, EvaluationResult, RunError};

/// Results of one comparison, index-aligned with the input configurations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    pub results: Vec<EvaluationResult>,
}

impl Comparison {
    /// Highest return; ties go to the earlier configuration.
    pub fn best_by_return(&self) -> Option<&EvaluationResult> {
        self.results.iter().reduce(|best, candidate| {
            if candidate.summary.return_percent > best.summary.return_percent {
                candidate
            } else {
                best
            }
        })
    }

    /// Results sorted by descending return, stable for ties.
    pub fn ranked(&self) -> Vec<&EvaluationResult> {
        let mut ranked: Vec<&EvaluationResult> = self.results.iter().collect();
        ranked.sort_by(|a, b| {
            b.summary
                .return_percent
                .total_cmp(&a.summary.return_percent)
        });
        ranked
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Evaluate every configuration in `signals` against `data`.
///
/// The first failing configuration aborts the comparison.
pub fn compare(
    signals: &[SignalConfig],
    backtest: &BacktestSection,
    data: &LoadedBars,
) -> Result<Comparison, RunError> {
    let results = signals
        .par_iter()
        .map(|signal| evaluate_signal(signal, backtest, data))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Comparison { results })
}

/// Every valid `short < long` crossover pair from the two window lists.
pub fn crossover_grid(short_windows: &[usize], long_windows: &[usize]) -> Vec<SignalConfig> {
    short_windows
        .iter()
        .flat_map(|&short| long_windows.iter().map(move |&long| (short, long)))
        .filter(|&(short, long)| short >= 1 && short < long)
        .map(|(short_window, long_window)| {
            SignalConfig::MaCrossover(MaCrossoverParams {
                short_window,
                long_window,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use evallab_core::domain::RawBar;
    use evallab_core::signals::QLearningParams;

    fn data(closes: &[f64]) -> LoadedBars {
        let start = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap();
        LoadedBars {
            bars: closes
                .iter()
                .enumerate()
                .map(|(i, &c)| RawBar::from_close(start + chrono::Duration::days(i as i64), c))
                .collect(),
            signals: None,
        }
    }

    fn wave(n: usize) -> Vec<f64> {
        (0..n)
            .map(|i| 100.0 + 10.0 * (i as f64 / 6.0).sin())
            .collect()
    }

    #[test]
    fn results_follow_configuration_order() {
        let signals = vec![
            SignalConfig::QLearning(QLearningParams {
                episodes: 3,
                ..QLearningParams::default()
            }),
            SignalConfig::MaCrossover(MaCrossoverParams {
                short_window: 3,
                long_window: 8,
            }),
        ];
        let cmp = compare(&signals, &BacktestSection::default(), &data(&wave(80))).unwrap();
        assert_eq!(cmp.len(), 2);
        assert_eq!(cmp.results[0].signal_source, "q_learning");
        assert_eq!(cmp.results[1].signal_source, "ma_crossover");
        assert_eq!(cmp.results[0].dataset_hash, cmp.results[1].dataset_hash);
    }

    #[test]
    fn parallel_matches_sequential() {
        let bars = data(&wave(120));
        let backtest = BacktestSection::default();
        let signals = crossover_grid(&[2, 5, 10], &[8, 20, 40]);
        let cmp = compare(&signals, &backtest, &bars).unwrap();
        for (signal, result) in signals.iter().zip(&cmp.results) {
            assert_eq!(&evaluate_signal(signal, &backtest, &bars).unwrap(), result);
        }
    }

    #[test]
    fn precomputed_without_signals_aborts() {
        let signals = vec![SignalConfig::default(), SignalConfig::Precomputed];
        let err = compare(&signals, &BacktestSection::default(), &data(&wave(10))).unwrap_err();
        assert!(matches!(err, RunError::MissingSignals));
    }

    #[test]
    fn best_and_ranked() {
        let cmp = compare(
            &crossover_grid(&[2, 3], &[5, 9]),
            &BacktestSection::default(),
            &data(&wave(90)),
        )
        .unwrap();
        let best = cmp.best_by_return().unwrap();
        let ranked = cmp.ranked();
        assert_eq!(ranked[0].summary.return_percent, best.summary.return_percent);
        assert!(ranked
            .windows(2)
            .all(|w| w[0].summary.return_percent >= w[1].summary.return_percent));
    }

    #[test]
    fn empty_comparison_has_no_best() {
        let cmp = compare(&[], &BacktestSection::default(), &data(&wave(5))).unwrap();
        assert!(cmp.is_empty());
        assert!(cmp.best_by_return().is_none());
    }

    #[test]
    fn grid_skips_invalid_pairs() {
        let grid = crossover_grid(&[0, 5, 20], &[10, 20]);
        let pairs: Vec<(usize, usize)> = grid
            .iter()
            .map(|s| match s {
                SignalConfig::MaCrossover(p) => (p.short_window, p.long_window),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(pairs, vec![(5, 10), (5, 20)]);
    }
}
