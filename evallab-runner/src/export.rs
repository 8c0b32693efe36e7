//! Artifact export: JSON manifest plus CSV trade log and equity curve.
//!
//! The manifest carries `schema_version`; manifests written by a newer
//! version are rejected on import.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use evallab_core::domain::{EquityPoint, TradeAction, TradeRecord};

use crate::runner::{EvaluationResult, SCHEMA_VERSION};

pub const MANIFEST_FILE: &str = "manifest.json";
pub const TRADE_LOG_FILE: &str = "trade_log.csv";
pub const EQUITY_CURVE_FILE: &str = "equity_curve.csv";

// ─── JSON export ────────────────────────────────────────────────────

/// Serialize an `EvaluationResult` to pretty JSON.
pub fn export_json(result: &EvaluationResult) -> Result<String> {
    serde_json::to_string_pretty(result).context("failed to serialize EvaluationResult to JSON")
}

/// Deserialize an `EvaluationResult`, rejecting newer schema versions.
pub fn import_json(json: &str) -> Result<EvaluationResult> {
    let result: EvaluationResult =
        serde_json::from_str(json).context("failed to deserialize EvaluationResult from JSON")?;
    if result.schema_version > SCHEMA_VERSION {
        bail!(
            "unsupported schema version {} (max supported: {})",
            result.schema_version,
            SCHEMA_VERSION
        );
    }
    Ok(result)
}

// ─── CSV export ─────────────────────────────────────────────────────

/// Trade log as CSV: `date, action, price, shares, cash, pnl`.
///
/// BUY rows carry no realized pnl and are written as 0.
pub fn export_trades_csv(trades: &[TradeRecord]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "action", "price", "shares", "cash", "pnl"])?;
    for t in trades {
        let pnl = match t.action {
            TradeAction::Buy => 0.0,
            TradeAction::Sell => t.pnl.unwrap_or(0.0),
        };
        wtr.write_record([
            &t.date.to_string(),
            &t.action.to_string(),
            &format!("{:.2}", t.price),
            &t.shares.to_string(),
            &format!("{:.2}", t.cash_after),
            &format!("{:.2}", pnl),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Equity curve as CSV: `date, equity, close`.
pub fn export_equity_csv(equity_curve: &[EquityPoint]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["date", "equity", "close"])?;
    for point in equity_curve {
        wtr.write_record([
            &point.date.to_string(),
            &format!("{:.2}", point.equity),
            &format!("{:.2}", point.close),
        ])?;
    }
    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

/// Write the trade log to `path`.
pub fn save_trade_log(trades: &[TradeRecord], path: &Path) -> Result<()> {
    let csv = export_trades_csv(trades)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

/// Write the equity curve to `path`.
pub fn save_equity_curve(equity_curve: &[EquityPoint], path: &Path) -> Result<()> {
    let csv = export_equity_csv(equity_curve)?;
    std::fs::write(path, csv).with_context(|| format!("failed to write {}", path.display()))
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the full artifact set for one evaluation.
///
/// Creates `{symbol}_{signal_source}_{timestamp}/` under `output_dir` with
/// `manifest.json`, `trade_log.csv` and `equity_curve.csv`, and returns the
/// created directory.
pub fn save_artifacts(result: &EvaluationResult, output_dir: &Path) -> Result<PathBuf> {
    let dirname = format!(
        "{}_{}_{}",
        path_component(&result.symbol),
        path_component(&result.signal_source),
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let json = export_json(result)?;
    let manifest = run_dir.join(MANIFEST_FILE);
    std::fs::write(&manifest, json)
        .with_context(|| format!("failed to write {}", manifest.display()))?;
    save_trade_log(&result.trades, &run_dir.join(TRADE_LOG_FILE))?;
    save_equity_curve(&result.equity_curve, &run_dir.join(EQUITY_CURVE_FILE))?;

    Ok(run_dir)
}

/// Restrict a label to `[A-Za-z0-9._-]` so it stays a single path component.
fn path_component(label: &str) -> String {
    label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Load an `EvaluationResult` from an artifact directory's manifest.
pub fn load_artifacts(dir: &Path) -> Result<EvaluationResult> {
    let manifest_path = dir.join(MANIFEST_FILE);
    let json = std::fs::read_to_string(&manifest_path)
        .with_context(|| format!("failed to read {}", manifest_path.display()))?;
    import_json(&json)
}
