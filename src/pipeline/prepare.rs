//! Turning raw `{date, value}` rows into a clean, ordered series.

use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};

/// Date cell of a raw input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawDate {
    Timestamp(DateTime<Utc>),
    Text(String),
}

/// Value cell of a raw input row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Number(f64),
    Text(String),
    Missing,
}

/// One input row as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRow {
    pub date: RawDate,
    pub value: RawValue,
}

impl RawRow {
    /// Create a row from anything convertible into its cells.
    pub fn new(date: impl Into<RawDate>, value: impl Into<RawValue>) -> Self {
        Self {
            date: date.into(),
            value: value.into(),
        }
    }
}

impl From<DateTime<Utc>> for RawDate {
    fn from(ts: DateTime<Utc>) -> Self {
        RawDate::Timestamp(ts)
    }
}

impl From<&str> for RawDate {
    fn from(text: &str) -> Self {
        RawDate::Text(text.to_string())
    }
}

impl From<String> for RawDate {
    fn from(text: String) -> Self {
        RawDate::Text(text)
    }
}

impl From<f64> for RawValue {
    fn from(v: f64) -> Self {
        RawValue::Number(v)
    }
}

impl From<Option<f64>> for RawValue {
    fn from(v: Option<f64>) -> Self {
        v.map_or(RawValue::Missing, RawValue::Number)
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        RawValue::Text(text.to_string())
    }
}

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

const MISSING_MARKERS: [&str; 6] = ["", "na", "n/a", "nan", "null", "none"];

/// Parse a textual date. Naive dates and times are taken as UTC.
pub fn parse_date(text: &str) -> std::result::Result<DateTime<Utc>, String> {
    let text = text.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok(ts.with_timezone(&Utc));
    }
    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(naive.and_utc());
        }
    }
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
        }
    }
    // Year-month, anchored at the first of the month.
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{text}-01"), "%Y-%m-%d") {
        return Ok(date.and_time(chrono::NaiveTime::MIN).and_utc());
    }

    Err("unrecognised date format".to_string())
}

fn parse_value(row: usize, raw: &RawValue) -> Result<Option<f64>> {
    match raw {
        RawValue::Number(v) => Ok(Some(*v)),
        RawValue::Missing => Ok(None),
        RawValue::Text(text) => {
            let trimmed = text.trim();
            if MISSING_MARKERS
                .iter()
                .any(|m| trimmed.eq_ignore_ascii_case(m))
            {
                return Ok(None);
            }
            trimmed
                .parse::<f64>()
                .map(Some)
                .map_err(|e| ForecastError::Parse {
                    row,
                    field: "value",
                    value: text.clone(),
                    reason: e.to_string(),
                })
        }
    }
}

/// Validate and normalise raw rows into a [`TimeSeries`].
///
/// Every date must parse; rows are then stably sorted by timestamp, rows
/// whose value is missing or non-finite are dropped, and any timestamp that
/// still appears twice is rejected. Row numbers in errors are zero-based
/// positions in `rows`.
pub fn prepare_series(rows: &[RawRow]) -> Result<TimeSeries> {
    let mut parsed = Vec::with_capacity(rows.len());
    for (row, raw) in rows.iter().enumerate() {
        let timestamp = match &raw.date {
            RawDate::Timestamp(ts) => *ts,
            RawDate::Text(text) => parse_date(text).map_err(|reason| ForecastError::Parse {
                row,
                field: "date",
                value: text.clone(),
                reason,
            })?,
        };
        let value = parse_value(row, &raw.value)?;
        parsed.push((row, timestamp, value));
    }

    parsed.sort_by_key(|(_, ts, _)| *ts);

    let before = parsed.len();
    parsed.retain(|(_, _, value)| value.is_some_and(f64::is_finite));
    let dropped = before - parsed.len();
    if dropped > 0 {
        tracing::debug!(dropped, kept = parsed.len(), "dropped rows without a finite value");
    }

    if let Some(pair) = parsed.windows(2).find(|pair| pair[0].1 == pair[1].1) {
        let (row, timestamp, _) = pair[1];
        return Err(ForecastError::DuplicateTimestamp {
            row,
            timestamp: timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        });
    }

    if parsed.is_empty() {
        return Err(ForecastError::EmptySeries);
    }

    let (timestamps, values) = parsed
        .into_iter()
        .map(|(_, ts, value)| (ts, value.unwrap_or(f64::NAN)))
        .unzip();
    TimeSeries::new(timestamps, values)
}
