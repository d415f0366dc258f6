//! TimeSeries data structure for representing temporal data.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A univariate time series with strictly increasing timestamps.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct TimeSeries {
    timestamps: Vec<DateTime<Utc>>,
    values: Vec<f64>,
}

impl TimeSeries {
    /// Create a new univariate series.
    ///
    /// Timestamps must be strictly increasing and match the number of values.
    pub fn new(timestamps: Vec<DateTime<Utc>>, values: Vec<f64>) -> Result<Self> {
        if timestamps.len() != values.len() {
            return Err(ForecastError::DimensionMismatch {
                expected: timestamps.len(),
                got: values.len(),
            });
        }

        for i in 1..timestamps.len() {
            if timestamps[i] <= timestamps[i - 1] {
                return Err(ForecastError::TimestampError(
                    "timestamps must be strictly increasing".to_string(),
                ));
            }
        }

        Ok(Self { timestamps, values })
    }

    /// Get the number of observations.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if the series is empty.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Get timestamps.
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Get values.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Timestamp of the latest observation.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamps.last().copied()
    }

    /// Iterate over `(timestamp, value)` pairs in chronological order.
    pub fn iter(&self) -> impl Iterator<Item = (DateTime<Utc>, f64)> + '_ {
        self.timestamps
            .iter()
            .copied()
            .zip(self.values.iter().copied())
    }

    /// Extract the observations in `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Result<TimeSeries> {
        if start > end {
            return Err(ForecastError::InvalidParameter(
                "start must be <= end".to_string(),
            ));
        }
        if end > self.len() {
            return Err(ForecastError::IndexOutOfBounds {
                index: end,
                size: self.len(),
            });
        }

        Ok(TimeSeries {
            timestamps: self.timestamps[start..end].to_vec(),
            values: self.values[start..end].to_vec(),
        })
    }

    /// Check if series has missing values (NaN or Inf).
    pub fn has_missing_values(&self) -> bool {
        self.values.iter().any(|v| !v.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn make_daily_timestamps(n: usize) -> Vec<DateTime<Utc>> {
        let base = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n).map(|i| base + Duration::days(i as i64)).collect()
    }

    #[test]
    fn time_series_constructs_univariate_data() {
        let timestamps = make_daily_timestamps(5);
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];

        let ts = TimeSeries::new(timestamps.clone(), values.clone()).unwrap();

        assert_eq!(ts.len(), 5);
        assert!(!ts.is_empty());
        assert_eq!(ts.values(), &values);
        assert_eq!(ts.timestamps(), &timestamps);
        assert_eq!(ts.last_timestamp(), Some(timestamps[4]));
    }

    #[test]
    fn time_series_allows_empty() {
        let ts = TimeSeries::new(vec![], vec![]).unwrap();
        assert!(ts.is_empty());
        assert_eq!(ts.last_timestamp(), None);
        assert_eq!(ts, TimeSeries::default());
    }

    #[test]
    fn time_series_rejects_length_mismatch() {
        let result = TimeSeries::new(make_daily_timestamps(3), vec![1.0, 2.0]);
        assert!(matches!(
            result,
            Err(ForecastError::DimensionMismatch {
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn time_series_rejects_non_increasing_timestamps() {
        let timestamps = vec![
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 2, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
        ];
        let result = TimeSeries::new(timestamps, vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));

        let timestamps = vec![
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 1, 0, 0).unwrap(),
        ];
        let result = TimeSeries::new(timestamps, vec![1.0, 2.0, 3.0]);
        assert!(matches!(result, Err(ForecastError::TimestampError(_))));
    }

    #[test]
    fn time_series_slice_keeps_order() {
        let timestamps = make_daily_timestamps(6);
        let ts = TimeSeries::new(timestamps.clone(), vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();

        let head = ts.slice(0, 4).unwrap();
        let tail = ts.slice(4, 6).unwrap();

        assert_eq!(head.values(), &[0.0, 1.0, 2.0, 3.0]);
        assert_eq!(tail.values(), &[4.0, 5.0]);
        assert_eq!(tail.timestamps(), &timestamps[4..]);

        assert!(ts.slice(4, 2).is_err());
        assert!(matches!(
            ts.slice(0, 7),
            Err(ForecastError::IndexOutOfBounds { index: 7, size: 6 })
        ));
    }

    #[test]
    fn time_series_detects_missing_values() {
        let values = vec![1.0, f64::NAN, 3.0];
        let ts = TimeSeries::new(make_daily_timestamps(3), values).unwrap();
        assert!(ts.has_missing_values());

        let ts = TimeSeries::new(make_daily_timestamps(3), vec![1.0, 2.0, 3.0]).unwrap();
        assert!(!ts.has_missing_values());
        assert_eq!(ts.iter().nth(1).map(|(_, v)| v), Some(2.0));
    }
}
