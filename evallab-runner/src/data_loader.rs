//! Bar loading from delimited files.
//!
//! Accepts the tabular shape market-data exports use: a header row with at
//! least `date` and `close`, optionally `open`, `high`, `low`, `volume` and a
//! precomputed `signal` column. Header names are matched case-insensitively;
//! unknown columns are ignored. Dates keep only their `YYYY-MM-DD` prefix.

use std::io::Read;
use std::path::{Path, PathBuf};

use evallab_core::domain::{parse_calendar_date, AnnotatedBar, RawBar, Signal};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

/// Errors from the data loading layer.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error("line {line}: {reason}")]
    Row { line: u64, reason: String },
}

/// Bars as loaded, with the signal column kept separate when present.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedBars {
    pub bars: Vec<RawBar>,
    /// One signal per bar if the file carried a `signal` column.
    pub signals: Option<Vec<Signal>>,
}

impl LoadedBars {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Pair bars with their precomputed signals, if the file had any.
    pub fn precomputed(&self) -> Option<Vec<AnnotatedBar>> {
        let signals = self.signals.as_ref()?;
        Some(
            self.bars
                .iter()
                .zip(signals)
                .map(|(bar, &signal)| AnnotatedBar {
                    bar: bar.clone(),
                    signal,
                    strength: None,
                })
                .collect(),
        )
    }
}

#[derive(Debug, Deserialize)]
struct CsvRow {
    date: String,
    close: f64,
    #[serde(default)]
    open: Option<f64>,
    #[serde(default)]
    high: Option<f64>,
    #[serde(default)]
    low: Option<f64>,
    #[serde(default)]
    volume: Option<f64>,
    #[serde(default)]
    signal: Option<f64>,
}

/// Load bars from a CSV file on disk.
pub fn load_bars(path: &Path) -> Result<LoadedBars, LoadError> {
    let file = std::fs::File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let loaded = load_bars_from_reader(file)?;
    debug!(path = %path.display(), bars = loaded.len(), "loaded bars");
    Ok(loaded)
}

/// Load bars from any CSV source.
pub fn load_bars_from_reader<R: Read>(reader: R) -> Result<LoadedBars, LoadError> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: csv::StringRecord = rdr
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    for required in ["date", "close"] {
        if !headers.iter().any(|h| h == required) {
            return Err(LoadError::MissingColumn(required));
        }
    }
    let has_signal = headers.iter().any(|h| h == "signal");

    let mut bars = Vec::new();
    let mut signals = Vec::new();
    for record in rdr.records() {
        let record = record?;
        let line = record.position().map(|p| p.line()).unwrap_or(0);
        let row: CsvRow = record
            .deserialize(Some(&headers))
            .map_err(|e| row_error(line, e.to_string()))?;

        let date = parse_calendar_date(&row.date).map_err(|e| row_error(line, e.to_string()))?;
        bars.push(RawBar {
            date,
            open: row.open,
            high: row.high,
            low: row.low,
            close: row.close,
            volume: row.volume.and_then(volume_from_float),
        });

        if has_signal {
            let code = row
                .signal
                .ok_or_else(|| row_error(line, "empty signal".into()))?;
            signals.push(signal_from_float(code).map_err(|reason| row_error(line, reason))?);
        }
    }

    Ok(LoadedBars {
        bars,
        signals: has_signal.then_some(signals),
    })
}

fn row_error(line: u64, reason: String) -> LoadError {
    LoadError::Row { line, reason }
}

/// Spreadsheet exports often write integer columns as `1.0`.
fn signal_from_float(code: f64) -> Result<Signal, String> {
    if !code.is_finite() || code.fract() != 0.0 {
        return Err(format!("invalid signal {code}: expected 1, -1 or 0"));
    }
    Signal::try_from(code as i64).map_err(|e| e.to_string())
}

fn volume_from_float(volume: f64) -> Option<u64> {
    (volume.is_finite() && volume >= 0.0).then(|| volume.round() as u64)
}
