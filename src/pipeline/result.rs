//! Output record of one pipeline run and its CSV export.

use std::io;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{Forecast, Frequency};
use crate::error::{ForecastError, Result};
use crate::models::arima::{ModelSummary, OrderSpec};
use crate::utils::EvaluationMetrics;

/// Header of the exported forecast table.
pub const CSV_HEADER: [&str; 4] = ["timestamp", "point_forecast", "lower_bound", "upper_bound"];

/// One future step of the delivered forecast.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForecastRow {
    pub timestamp: DateTime<Utc>,
    pub point_forecast: f64,
    pub lower_bound: f64,
    pub upper_bound: f64,
}

/// Everything a pipeline run produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultRecord {
    /// Order chosen on the training part.
    pub order: OrderSpec,
    /// Fit report of the full-data model.
    pub summary: ModelSummary,
    /// Full-data residuals, aligned with the prepared series.
    pub residuals: Vec<f64>,
    /// Holdout accuracy; `None` when the holdout was empty.
    pub metrics: Option<EvaluationMetrics>,
    /// Point forecasts of the train-only model over the holdout.
    pub holdout_predictions: Vec<f64>,
    pub forecast: Vec<ForecastRow>,
    pub train_len: usize,
    pub test_len: usize,
    /// Sampling interval used to extend the index.
    pub frequency: Frequency,
    pub confidence_level: f64,
}

/// Inputs gathered by the pipeline stages.
#[derive(Debug, Clone)]
pub struct ResultParts {
    pub order: OrderSpec,
    pub summary: ModelSummary,
    pub residuals: Vec<f64>,
    pub metrics: Option<EvaluationMetrics>,
    pub holdout_predictions: Vec<f64>,
    pub forecast: Forecast,
    pub future_timestamps: Vec<DateTime<Utc>>,
    pub train_len: usize,
    pub test_len: usize,
    pub frequency: Frequency,
}

impl ResultRecord {
    /// Package stage outputs. Fails only when the forecast lacks intervals or
    /// its length disagrees with the future index.
    pub fn assemble(parts: ResultParts) -> Result<Self> {
        let confidence_level = parts.forecast.level().ok_or_else(|| {
            ForecastError::ComputationError("forecast has no confidence level".to_string())
        })?;
        if parts.future_timestamps.len() != parts.forecast.horizon() {
            return Err(ForecastError::DimensionMismatch {
                expected: parts.forecast.horizon(),
                got: parts.future_timestamps.len(),
            });
        }

        let (point, lower, upper) = parts.forecast.into_parts()?;
        let forecast = parts
            .future_timestamps
            .into_iter()
            .zip(point)
            .zip(lower.into_iter().zip(upper))
            .map(|((timestamp, point_forecast), (lower_bound, upper_bound))| ForecastRow {
                timestamp,
                point_forecast,
                lower_bound,
                upper_bound,
            })
            .collect();

        Ok(Self {
            order: parts.order,
            summary: parts.summary,
            residuals: parts.residuals,
            metrics: parts.metrics,
            holdout_predictions: parts.holdout_predictions,
            forecast,
            train_len: parts.train_len,
            test_len: parts.test_len,
            frequency: parts.frequency,
            confidence_level,
        })
    }

    /// AIC of the full-data fit.
    pub fn aic(&self) -> f64 {
        self.summary.aic
    }

    /// Flat `{timestamp, point_forecast, lower_bound, upper_bound}` rows.
    pub fn forecast_table(&self) -> &[ForecastRow] {
        &self.forecast
    }

    /// Future timestamps in ascending order.
    pub fn future_timestamps(&self) -> Vec<DateTime<Utc>> {
        self.forecast.iter().map(|row| row.timestamp).collect()
    }

    /// Write the forecast table as CSV with a header row and RFC 3339 UTC timestamps.
    pub fn write_csv<W: io::Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(CSV_HEADER)?;

        for row in &self.forecast {
            writer.write_record([
                row.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
                row.point_forecast.to_string(),
                row.lower_bound.to_string(),
                row.upper_bound.to_string(),
            ])?;
        }

        writer.flush()?;
        Ok(())
    }

    /// The CSV export as a string.
    pub fn to_csv_string(&self) -> Result<String> {
        let mut buffer = Vec::new();
        self.write_csv(&mut buffer)?;
        String::from_utf8(buffer).map_err(|e| ForecastError::Export(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::LjungBoxResult;
    use chrono::{Duration, TimeZone};

    fn summary() -> ModelSummary {
        ModelSummary {
            order: OrderSpec::arima(0, 1, 0),
            nobs: 10,
            n_effective: 9,
            log_likelihood: -12.0,
            aic: 26.0,
            bic: 26.2,
            sigma2: 1.5,
            mean: None,
            ar: vec![],
            ma: vec![],
            seasonal_ar: vec![],
            seasonal_ma: vec![],
            iterations: 0,
            converged: true,
            ljung_box: LjungBoxResult {
                statistic: 1.0,
                p_value: 0.9,
                lags: 1,
                df: 1,
            },
        }
    }

    fn parts(horizon: usize) -> ResultParts {
        let start = Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap();
        let point: Vec<f64> = (0..horizon).map(|i| 10.0 + i as f64).collect();
        let lower = point.iter().map(|p| p - 1.5).collect();
        let upper = point.iter().map(|p| p + 1.5).collect();
        ResultParts {
            order: OrderSpec::arima(0, 1, 0),
            summary: summary(),
            residuals: vec![0.0; 10],
            metrics: None,
            holdout_predictions: vec![],
            forecast: Forecast::from_values_with_intervals(point, lower, upper, 0.95).unwrap(),
            future_timestamps: (0..horizon)
                .map(|i| start + Duration::days(i as i64))
                .collect(),
            train_len: 10,
            test_len: 0,
            frequency: Frequency::daily(),
        }
    }

    #[test]
    fn assembles_rows_in_order() {
        let record = ResultRecord::assemble(parts(3)).unwrap();
        let table = record.forecast_table();
        assert_eq!(table.len(), 3);
        assert_eq!(table[2].point_forecast, 12.0);
        assert_eq!(table[2].lower_bound, 10.5);
        assert_eq!(record.confidence_level, 0.95);
        assert_eq!(record.aic(), 26.0);
        assert!(record.metrics.is_none());
        assert_eq!(record.future_timestamps()[0], table[0].timestamp);
    }

    #[test]
    fn rejects_mismatched_index() {
        let mut p = parts(3);
        p.future_timestamps.pop();
        assert!(matches!(
            ResultRecord::assemble(p),
            Err(ForecastError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn rejects_forecast_without_intervals() {
        let mut p = parts(2);
        p.forecast = Forecast::from_values(vec![1.0, 2.0]);
        assert!(ResultRecord::assemble(p).is_err());
    }

    #[test]
    fn csv_export() {
        let record = ResultRecord::assemble(parts(2)).unwrap();
        let csv = record.to_csv_string().unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "timestamp,point_forecast,lower_bound,upper_bound");
        assert_eq!(lines[1], "2024-01-11T00:00:00Z,10,8.5,11.5");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn json_shape() {
        let record = ResultRecord::assemble(parts(1)).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["metrics"].is_null());
        assert_eq!(json["forecast"][0]["timestamp"], "2024-01-11T00:00:00Z");
        assert_eq!(json["frequency"], "1D");
        assert_eq!(json["order"]["order"]["d"], 1);
    }
}
