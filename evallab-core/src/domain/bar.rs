//! Bars: raw OHLCV input and the signal-annotated series the engine replays.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use super::signal::Signal;

/// Errors raised while interpreting bar fields.
#[derive(Debug, Error, PartialEq)]
pub enum BarError {
    #[error("invalid date '{0}': expected a YYYY-MM-DD prefix")]
    InvalidDate(String),
    #[error("invalid signal {0}: expected 1, -1 or 0")]
    InvalidSignal(i64),
}

/// Parse an ISO-8601 date or timestamp, keeping only the calendar date.
///
/// `2024-03-15`, `2024-03-15 00:00:00-04:00` and `2024-03-15T09:30:00Z` all
/// resolve to 2024-03-15. Any time-of-day component is discarded.
pub fn parse_calendar_date(raw: &str) -> Result<NaiveDate, BarError> {
    let trimmed = raw.trim();
    let prefix = trimmed
        .get(..10)
        .ok_or_else(|| BarError::InvalidDate(raw.to_string()))?;
    NaiveDate::parse_from_str(prefix, "%Y-%m-%d")
        .map_err(|_| BarError::InvalidDate(raw.to_string()))
}

/// Serde adapter for [`parse_calendar_date`].
pub fn deserialize_calendar_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_calendar_date(&raw).map_err(serde::de::Error::custom)
}

/// Daily OHLCV bar as delivered by an upstream data source.
///
/// Only `date` and `close` are required by anything in this crate; the other
/// fields are carried through when the source provides them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawBar {
    #[serde(deserialize_with = "deserialize_calendar_date")]
    pub date: NaiveDate,
    #[serde(default)]
    pub open: Option<f64>,
    #[serde(default)]
    pub high: Option<f64>,
    #[serde(default)]
    pub low: Option<f64>,
    pub close: f64,
    #[serde(default)]
    pub volume: Option<u64>,
}

impl RawBar {
    pub fn from_close(date: NaiveDate, close: f64) -> Self {
        Self {
            date,
            open: None,
            high: None,
            low: None,
            close,
            volume: None,
        }
    }
}

/// A bar annotated with a trading signal: the unit the backtest engine consumes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    #[serde(deserialize_with = "deserialize_calendar_date")]
    pub date: NaiveDate,
    pub close: f64,
    pub signal: Signal,
}

impl PriceBar {
    pub fn new(date: NaiveDate, close: f64, signal: Signal) -> Self {
        Self {
            date,
            close,
            signal,
        }
    }

    /// Whether the close is usable as a fill price.
    pub fn has_valid_close(&self) -> bool {
        self.close.is_finite() && self.close > 0.0
    }
}

/// Output of a signal annotator: the source bar plus its signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnnotatedBar {
    #[serde(flatten)]
    pub bar: RawBar,
    pub signal: Signal,
    /// Optional conviction score; the crossover annotator reports the MA gap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strength: Option<f64>,
}

impl AnnotatedBar {
    pub fn to_price_bar(&self) -> PriceBar {
        PriceBar::new(self.bar.date, self.bar.close, self.signal)
    }
}

/// Project an annotated series onto the engine's input shape, preserving order.
pub fn to_price_bars(annotated: &[AnnotatedBar]) -> Vec<PriceBar> {
    annotated.iter().map(AnnotatedBar::to_price_bar).collect()
}
