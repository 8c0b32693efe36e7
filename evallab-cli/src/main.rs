//! evallab CLI: evaluate trading signals against historical bars.
//!
//! Commands:
//! - `run`: annotate a bar file with a signal source and backtest it
//! - `backtest`: replay a bar file that already carries a `signal` column
//! - `compare`: evaluate several signal sources over the same bars in parallel
//! - `advise`: print the recommendation for the most recent bar

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use evallab_core::indicators::MovingAverages;
use evallab_core::signals::{MaCrossoverParams, QLearningParams};
use evallab_core::{advise, Recommendation};
use evallab_runner::{
    annotate, compare, crossover_grid, evaluate, load_bars, save_artifacts, BacktestSection,
    EvalConfig, EvaluationResult, SignalConfig,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "evallab", about = "evallab CLI: single-position signal backtester")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "snake_case")]
enum Strategy {
    MaCrossover,
    QLearning,
    Precomputed,
}

impl Strategy {
    fn default_config(self) -> SignalConfig {
        match self {
            Strategy::MaCrossover => SignalConfig::MaCrossover(MaCrossoverParams::default()),
            Strategy::QLearning => SignalConfig::QLearning(QLearningParams::default()),
            Strategy::Precomputed => SignalConfig::Precomputed,
        }
    }
}

/// Options shared by every command that evaluates one signal source.
#[derive(clap::Args)]
struct EvalArgs {
    /// CSV file with at least `date` and `close` columns.
    #[arg(long)]
    data: PathBuf,

    /// Path to a TOML config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Signal source; overrides the config's `[signal]` type.
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Starting cash; overrides the config.
    #[arg(long)]
    initial_cash: Option<f64>,

    /// Symbol label for results and artifact names.
    #[arg(long)]
    symbol: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Annotate bars with a signal source and backtest the result.
    Run {
        #[command(flatten)]
        eval: EvalArgs,

        /// Write manifest.json, trade_log.csv and equity_curve.csv here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full result as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Backtest a bar file that already carries a `signal` column.
    Backtest {
        /// CSV file with `date`, `close` and `signal` columns.
        #[arg(long)]
        data: PathBuf,

        /// Starting cash.
        #[arg(long, default_value_t = evallab_runner::DEFAULT_INITIAL_CASH)]
        initial_cash: f64,

        /// Symbol label for results and artifact names.
        #[arg(long)]
        symbol: Option<String>,

        /// Write manifest.json, trade_log.csv and equity_curve.csv here.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Print the full result as JSON instead of a summary.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Evaluate several signal sources over the same bars.
    Compare {
        /// CSV file with at least `date` and `close` columns.
        #[arg(long)]
        data: PathBuf,

        /// TOML config files, one per signal source. Only `[signal]` is read;
        /// cash and symbol come from the flags below.
        #[arg(long = "config")]
        configs: Vec<PathBuf>,

        /// Signal sources with default parameters.
        #[arg(long = "strategy", value_enum)]
        strategies: Vec<Strategy>,

        /// Short windows for a crossover grid (comma separated).
        #[arg(long, value_delimiter = ',')]
        short_windows: Vec<usize>,

        /// Long windows for a crossover grid (comma separated).
        #[arg(long, value_delimiter = ',')]
        long_windows: Vec<usize>,

        /// Starting cash.
        #[arg(long, default_value_t = evallab_runner::DEFAULT_INITIAL_CASH)]
        initial_cash: f64,

        /// Symbol label for results.
        #[arg(long)]
        symbol: Option<String>,

        /// Print all results as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Print the recommendation for the most recent bar.
    Advise {
        #[command(flatten)]
        eval: EvalArgs,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            eval,
            output_dir,
            json,
        } => run_cmd(&eval, output_dir.as_deref(), json),
        Commands::Backtest {
            data,
            initial_cash,
            symbol,
            output_dir,
            json,
        } => {
            let eval = EvalArgs {
                data,
                config: None,
                strategy: Some(Strategy::Precomputed),
                initial_cash: Some(initial_cash),
                symbol,
            };
            run_cmd(&eval, output_dir.as_deref(), json)
        }
        Commands::Compare {
            data,
            configs,
            strategies,
            short_windows,
            long_windows,
            initial_cash,
            symbol,
            json,
        } => compare_cmd(
            &data,
            &configs,
            &strategies,
            &short_windows,
            &long_windows,
            initial_cash,
            symbol,
            json,
        ),
        Commands::Advise { eval } => advise_cmd(&eval),
    }
}

/// Log to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge the config file (if any) with command-line overrides.
fn resolve_config(args: &EvalArgs) -> Result<EvalConfig> {
    let mut config = match &args.config {
        Some(path) => EvalConfig::from_file(path)?,
        None => EvalConfig::default(),
    };
    if let Some(strategy) = args.strategy {
        if config.signal.name() != strategy.default_config().name() {
            config.signal = strategy.default_config();
        }
    }
    if let Some(cash) = args.initial_cash {
        config.backtest.initial_cash = cash;
    }
    if args.symbol.is_some() {
        config.backtest.symbol = args.symbol.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run_cmd(args: &EvalArgs, output_dir: Option<&Path>, json: bool) -> Result<()> {
    let config = resolve_config(args)?;
    let bars = load_bars(&args.data)?;
    info!(
        path = %args.data.display(),
        bars = bars.len(),
        signal = config.signal.name(),
        "running evaluation"
    );

    let result = evaluate(&config, &bars)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_summary(&result);
    }

    if let Some(dir) = output_dir {
        let run_dir = save_artifacts(&result, dir)?;
        info!(dir = %run_dir.display(), "artifacts saved");
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn compare_cmd(
    data: &Path,
    config_paths: &[PathBuf],
    strategies: &[Strategy],
    short_windows: &[usize],
    long_windows: &[usize],
    initial_cash: f64,
    symbol: Option<String>,
    json: bool,
) -> Result<()> {
    let mut config = EvalConfig::default();
    config.backtest.initial_cash = initial_cash;
    config.backtest.symbol = symbol;
    config.validate()?;

    let mut signals = Vec::new();
    for path in config_paths {
        signals.push(signal_from_config(path, &config.backtest)?);
    }
    signals.extend(strategies.iter().map(|s| s.default_config()));
    signals.extend(crossover_grid(short_windows, long_windows));
    if signals.is_empty() {
        bail!("nothing to compare: pass --config, --strategy or --short-windows/--long-windows");
    }

    let bars = load_bars(data)?;
    let comparison = compare(&signals, &config.backtest, &bars)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&comparison)?);
        return Ok(());
    }

    println!();
    println!("=== Comparison ({} bars) ===", bars.len());
    println!(
        "{:<4} {:<14} {:>14} {:>10} {:>7} {:>6} {:>6}",
        "#", "Signal", "Final Value", "Return %", "Trades", "Wins", "Losses"
    );
    for (rank, result) in comparison.ranked().iter().enumerate() {
        let s = &result.summary;
        println!(
            "{:<4} {:<14} {:>14.2} {:>10.2} {:>7} {:>6} {:>6}",
            rank + 1,
            result.signal_source,
            s.final_value,
            s.return_percent,
            s.total_trades,
            s.profitable_trades,
            s.losing_trades
        );
    }
    Ok(())
}

/// Read the `[signal]` section of a compare config; every signal shares
/// the `shared` backtest settings.
fn signal_from_config(path: &Path, shared: &BacktestSection) -> Result<SignalConfig> {
    let config = EvalConfig::from_file(path)
        .with_context(|| format!("failed to load {}", path.display()))?;
    if config.backtest != BacktestSection::default() && config.backtest != *shared {
        warn!(
            path = %path.display(),
            "ignoring [backtest] section; compare uses --initial-cash and --symbol"
        );
    }
    Ok(config.signal)
}

fn advise_cmd(args: &EvalArgs) -> Result<()> {
    let config = resolve_config(args)?;
    let bars = load_bars(&args.data)?;
    evallab_core::validate_raw_bars(&bars.bars)?;

    let annotated = annotate(&config.signal, &bars)?;
    let windows = config.signal.advice_windows();
    let averages = MovingAverages::compute(&bars.bars, windows.short_window, windows.long_window);
    let Some(recommendation) = advise(&annotated, &averages) else {
        bail!("no bars to advise on");
    };

    print_recommendation(&recommendation);
    Ok(())
}

fn print_summary(result: &EvaluationResult) {
    let s = &result.summary;
    println!();
    println!("=== Evaluation Result ===");
    println!("Symbol:         {}", result.symbol);
    println!("Signal:         {}", result.signal_source);
    println!(
        "Period:         {} to {}",
        result.start_date, result.end_date
    );
    println!("Bars:           {}", result.bar_count);
    println!("Dataset Hash:   {}", result.dataset_hash);
    println!();
    println!("--- Performance ---");
    println!("Initial Cash:   {:.2}", s.initial_cash);
    println!("Final Value:    {:.2}", s.final_value);
    println!("Return:         {:.2}%", s.return_percent);
    println!("Trades:         {}", s.total_trades);
    println!("Profitable:     {}", s.profitable_trades);
    println!("Losing:         {}", s.losing_trades);
    if let Some(rec) = &result.recommendation {
        println!();
        print_recommendation(rec);
    }
}

fn print_recommendation(rec: &Recommendation) {
    println!("--- Recommendation ({}) ---", rec.date);
    println!("Action:         {}", rec.action);
    println!("Short MA:       {:.2}", rec.short_ma);
    println!("Long MA:        {:.2}", rec.long_ma);
    println!("Confidence:     {}% ({:?})", rec.confidence, rec.level);
}
