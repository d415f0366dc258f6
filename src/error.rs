//! Error types for the sarima-forecast library.

use thiserror::Error;

/// Result type alias for forecast operations.
pub type Result<T> = std::result::Result<T, ForecastError>;

/// Errors that can occur while preparing data, fitting models or forecasting.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ForecastError {
    /// A date or value in the raw input could not be parsed.
    #[error("row {row}: cannot parse {field} {value:?}: {reason}")]
    Parse {
        row: usize,
        field: &'static str,
        value: String,
        reason: String,
    },

    /// No valid observations remain after cleaning.
    #[error("series is empty after dropping missing values")]
    EmptySeries,

    /// No candidate order could be fitted during order search.
    #[error("order search failed: {0}")]
    OrderSearch(String),

    /// The selected order could not be fitted to the series.
    #[error("fitting {order} failed: {reason}")]
    Fit { order: String, reason: String },

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Timestamp-related error.
    #[error("timestamp error: {0}")]
    TimestampError(String),

    /// Two observations share a timestamp.
    #[error("row {row}: duplicate timestamp {timestamp}")]
    DuplicateTimestamp { row: usize, timestamp: String },

    /// Model has not been fitted yet.
    #[error("model must be fitted before prediction")]
    FitRequired,

    /// Missing values detected when not allowed.
    #[error("missing values detected in data")]
    MissingValues,

    /// Index out of bounds.
    #[error("index out of bounds: {index} (size: {size})")]
    IndexOutOfBounds { index: usize, size: usize },

    /// Frequency inference failed.
    #[error("could not infer frequency: {0}")]
    FrequencyInference(String),

    /// Computation error (e.g., numerical issues).
    #[error("computation error: {0}")]
    ComputationError(String),

    /// Writing the forecast table failed.
    #[error("export error: {0}")]
    Export(String),
}

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::Export(err.to_string())
    }
}

impl From<std::io::Error> for ForecastError {
    fn from(err: std::io::Error) -> Self {
        ForecastError::Export(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages_are_descriptive() {
        let err = ForecastError::EmptySeries;
        assert_eq!(
            err.to_string(),
            "series is empty after dropping missing values"
        );

        let err = ForecastError::Parse {
            row: 3,
            field: "date",
            value: "yesterday".to_string(),
            reason: "unrecognised date format".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "row 3: cannot parse date \"yesterday\": unrecognised date format"
        );

        let err = ForecastError::Fit {
            order: "ARIMA(1,1,1)".to_string(),
            reason: "non-finite objective".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "fitting ARIMA(1,1,1) failed: non-finite objective"
        );

        let err = ForecastError::InsufficientData { needed: 10, got: 5 };
        assert_eq!(
            err.to_string(),
            "insufficient data: need at least 10, got 5"
        );

        let err = ForecastError::DuplicateTimestamp {
            row: 7,
            timestamp: "2024-01-01T00:00:00Z".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "row 7: duplicate timestamp 2024-01-01T00:00:00Z"
        );
    }

    #[test]
    fn errors_are_clonable_and_comparable() {
        let err1 = ForecastError::OrderSearch("no candidate converged".to_string());
        let err2 = err1.clone();
        assert_eq!(err1, err2);
    }

    #[test]
    fn io_errors_become_export_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: ForecastError = io.into();
        assert!(matches!(err, ForecastError::Export(_)));
    }
}
