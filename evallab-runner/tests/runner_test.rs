//! End-to-end: CSV on disk -> config -> evaluation -> artifacts on disk.

use std::fs;
use std::path::Path;

use evallab_core::domain::Signal;
use evallab_runner::export::{EQUITY_CURVE_FILE, MANIFEST_FILE, TRADE_LOG_FILE};
use evallab_runner::{
    compare, evaluate, load_artifacts, load_bars, save_artifacts, EvalConfig, RunError,
    SignalConfig,
};

fn write(dir: &Path, name: &str, text: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    fs::write(&path, text).unwrap();
    path
}

fn oscillating_csv(n: usize) -> String {
    let mut text = String::from("Date,Open,High,Low,Close,Volume\n");
    for i in 0..n {
        let close = 100.0 + 8.0 * (i as f64 / 5.0).sin() + i as f64 * 0.1;
        let day = chrono::NaiveDate::from_ymd_opt(2022, 1, 1).unwrap()
            + chrono::Duration::days(i as i64);
        text.push_str(&format!(
            "{day} 00:00:00-05:00,{o:.2},{h:.2},{l:.2},{close:.2},{v}\n",
            o = close - 0.5,
            h = close + 1.0,
            l = close - 1.0,
            v = 1_000 + i
        ));
    }
    text
}

#[test]
fn precomputed_signal_file_matches_worked_example() {
    let dir = tempfile::tempdir().unwrap();
    let data = write(
        dir.path(),
        "bars.csv",
        "date,close,signal\n2024-01-01,10,0\n2024-01-02,10,1\n2024-01-03,12,0\n2024-01-04,15,-1\n",
    );
    let config = write(
        dir.path(),
        "eval.toml",
        "[backtest]\nsymbol = \"DEMO\"\ninitial_cash = 100.0\n\n[signal]\ntype = \"precomputed\"\n",
    );

    let config = EvalConfig::from_file(&config).unwrap();
    let bars = load_bars(&data).unwrap();
    let result = evaluate(&config, &bars).unwrap();

    assert_eq!(result.summary.initial_cash, 100.0);
    assert_eq!(result.summary.final_value, 150.0);
    assert_eq!(result.summary.return_percent, 50.0);
    assert_eq!(result.summary.total_trades, 2);
    assert_eq!(result.summary.profitable_trades, 1);
    assert_eq!(result.summary.losing_trades, 0);
    let equities: Vec<f64> = result.equity_curve.iter().map(|p| p.equity).collect();
    assert_eq!(equities, vec![100.0, 120.0, 150.0]);
    assert_eq!(result.recommendation.as_ref().unwrap().action, Signal::Sell);

    let run_dir = save_artifacts(&result, dir.path()).unwrap();
    let trade_log = fs::read_to_string(run_dir.join(TRADE_LOG_FILE)).unwrap();
    assert_eq!(
        trade_log,
        "date,action,price,shares,cash,pnl\n\
         2024-01-02,BUY,10.00,10,0.00,0.00\n\
         2024-01-04,SELL,15.00,10,150.00,50.00\n"
    );
    let equity = fs::read_to_string(run_dir.join(EQUITY_CURVE_FILE)).unwrap();
    assert_eq!(equity.lines().count(), 4);
    assert!(run_dir.join(MANIFEST_FILE).exists());
    assert_eq!(load_artifacts(&run_dir).unwrap(), result);
}

#[test]
fn crossover_run_over_yahoo_style_export() {
    let dir = tempfile::tempdir().unwrap();
    let data = write(dir.path(), "spy.csv", &oscillating_csv(150));
    let bars = load_bars(&data).unwrap();
    assert_eq!(bars.len(), 150);
    assert!(bars.signals.is_none());

    let config = EvalConfig::from_toml(
        "[signal]\ntype = \"ma_crossover\"\nshort_window = 5\nlong_window = 20\n",
    )
    .unwrap();
    let result = evaluate(&config, &bars).unwrap();

    assert_eq!(result.equity_curve.len(), 149);
    assert_eq!(result.start_date, "2022-01-01");
    assert!(result.summary.total_trades > 0);
    let actions: Vec<_> = result.trades.iter().map(|t| t.action.to_string()).collect();
    for pair in actions.windows(2) {
        assert_ne!(pair[0], pair[1], "trades must alternate BUY/SELL");
    }
    assert_eq!(result.trades.first().map(|t| t.action.to_string()).as_deref(), Some("BUY"));

    let rec = result.recommendation.unwrap();
    assert!(rec.confidence <= 100);
    assert_eq!(rec.date.to_string(), result.end_date);
}

#[test]
fn q_learning_is_reproducible_across_loads() {
    let dir = tempfile::tempdir().unwrap();
    let data = write(dir.path(), "bars.csv", &oscillating_csv(90));
    let config = EvalConfig::from_toml(
        "[signal]\ntype = \"q_learning\"\nepisodes = 4\nseed = 11\nshort_window = 3\nlong_window = 12\n",
    )
    .unwrap();

    let first = evaluate(&config, &load_bars(&data).unwrap()).unwrap();
    let second = evaluate(&config, &load_bars(&data).unwrap()).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.signal_source, "q_learning");
}

#[test]
fn compare_shares_dataset_hash() {
    let dir = tempfile::tempdir().unwrap();
    let data = write(dir.path(), "bars.csv", &oscillating_csv(100));
    let bars = load_bars(&data).unwrap();
    let config = EvalConfig::default();
    let signals = vec![
        SignalConfig::default(),
        SignalConfig::QLearning(Default::default()),
    ];

    let cmp = compare(&signals, &config.backtest, &bars).unwrap();
    assert_eq!(cmp.len(), 2);
    assert_eq!(cmp.results[0].dataset_hash, cmp.results[1].dataset_hash);
    assert!(cmp.best_by_return().is_some());
}

#[test]
fn precomputed_config_without_signal_column_fails() {
    let dir = tempfile::tempdir().unwrap();
    let data = write(dir.path(), "bars.csv", "date,close\n2024-01-01,10\n2024-01-02,11\n");
    let config = EvalConfig::from_toml("[signal]\ntype = \"precomputed\"\n").unwrap();
    let err = evaluate(&config, &load_bars(&data).unwrap()).unwrap_err();
    assert!(matches!(err, RunError::MissingSignals));
}

#[test]
fn header_only_file_is_rejected_as_empty() {
    let dir = tempfile::tempdir().unwrap();
    let data = write(dir.path(), "bars.csv", "date,close\n");
    let err = evaluate(&EvalConfig::default(), &load_bars(&data).unwrap()).unwrap_err();
    assert!(err.to_string().contains("empty"));
}
