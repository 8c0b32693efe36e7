//! Property tests for the load -> evaluate -> export pipeline.
//!
//! 1. Loading a signal file and evaluating it equals replaying the same
//!    series through the engine directly
//! 2. The trade log has one row per trade plus a header
//! 3. Comparison results are index-aligned with sequential evaluation

use chrono::NaiveDate;
use evallab_core::domain::{PriceBar, Signal};
use evallab_core::run_backtest;
use evallab_core::signals::MaCrossoverParams;
use evallab_runner::export::{export_equity_csv, export_trades_csv};
use evallab_runner::{
    compare, evaluate_signal, load_bars_from_reader, BacktestSection, SignalConfig,
};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_rows() -> impl Strategy<Value = Vec<(f64, Signal)>> {
    let price = (0.5..500.0_f64).prop_map(|p| (p * 100.0).round() / 100.0);
    let signal = prop_oneof![Just(Signal::Buy), Just(Signal::Sell), Just(Signal::Hold)];
    prop::collection::vec((price, signal), 1..50)
}

fn day(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2021, 6, 1).unwrap() + chrono::Duration::days(i as i64)
}

fn to_csv(rows: &[(f64, Signal)]) -> String {
    let mut text = String::from("date,close,signal\n");
    for (i, (close, signal)) in rows.iter().enumerate() {
        text.push_str(&format!("{},{},{}\n", day(i), close, signal.code()));
    }
    text
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn loaded_signals_replay_like_the_engine(rows in arb_rows(), cash in 1.0..50_000.0_f64) {
        let loaded = load_bars_from_reader(to_csv(&rows).as_bytes()).unwrap();
        let backtest = BacktestSection { symbol: None, initial_cash: cash };
        let result = evaluate_signal(&SignalConfig::Precomputed, &backtest, &loaded).unwrap();

        let bars: Vec<PriceBar> = rows
            .iter()
            .enumerate()
            .map(|(i, &(close, signal))| PriceBar::new(day(i), close, signal))
            .collect();
        let direct = run_backtest(&bars, cash);

        prop_assert_eq!(&result.summary, &direct.summary);
        prop_assert_eq!(&result.trades, &direct.trades);
        prop_assert_eq!(&result.equity_curve, &direct.equity_curve);
    }

    #[test]
    fn csv_exports_have_one_row_per_record(rows in arb_rows()) {
        let loaded = load_bars_from_reader(to_csv(&rows).as_bytes()).unwrap();
        let result = evaluate_signal(
            &SignalConfig::Precomputed,
            &BacktestSection::default(),
            &loaded,
        )
        .unwrap();

        let trades = export_trades_csv(&result.trades).unwrap();
        prop_assert_eq!(trades.lines().count(), result.trades.len() + 1);
        let equity = export_equity_csv(&result.equity_curve).unwrap();
        prop_assert_eq!(equity.lines().count(), result.equity_curve.len() + 1);
    }

    #[test]
    fn comparison_is_order_preserving(rows in arb_rows(), short in 1usize..6, extra in 1usize..10) {
        let loaded = load_bars_from_reader(to_csv(&rows).as_bytes()).unwrap();
        let backtest = BacktestSection::default();
        let signals = vec![
            SignalConfig::Precomputed,
            SignalConfig::MaCrossover(MaCrossoverParams {
                short_window: short,
                long_window: short + extra,
            }),
        ];
        let cmp = compare(&signals, &backtest, &loaded).unwrap();
        for (signal, result) in signals.iter().zip(&cmp.results) {
            let sequential = evaluate_signal(signal, &backtest, &loaded).unwrap();
            prop_assert_eq!(&sequential, result);
        }
    }
}
