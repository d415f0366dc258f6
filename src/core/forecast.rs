//! Forecast result structure for holding predictions.

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// A forecast result containing point predictions and optional intervals.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Forecast {
    /// Point predictions, one per step.
    point: Vec<f64>,
    /// Lower prediction interval bounds (optional).
    lower: Option<Vec<f64>>,
    /// Upper prediction interval bounds (optional).
    upper: Option<Vec<f64>>,
    /// Nominal coverage of the interval, e.g. 0.95.
    level: Option<f64>,
}

impl Forecast {
    /// Create an empty forecast.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a forecast from point predictions.
    pub fn from_values(values: Vec<f64>) -> Self {
        Self {
            point: values,
            ..Self::default()
        }
    }

    /// Create a forecast with prediction intervals.
    pub fn from_values_with_intervals(
        values: Vec<f64>,
        lower: Vec<f64>,
        upper: Vec<f64>,
        level: f64,
    ) -> Result<Self> {
        for bound in [&lower, &upper] {
            if bound.len() != values.len() {
                return Err(ForecastError::DimensionMismatch {
                    expected: values.len(),
                    got: bound.len(),
                });
            }
        }

        Ok(Self {
            point: values,
            lower: Some(lower),
            upper: Some(upper),
            level: Some(level),
        })
    }

    /// Get the forecast horizon (number of steps).
    pub fn horizon(&self) -> usize {
        self.point.len()
    }

    /// Check if forecast is empty.
    pub fn is_empty(&self) -> bool {
        self.point.is_empty()
    }

    /// Point predictions.
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Check if both interval bounds are available.
    pub fn has_intervals(&self) -> bool {
        self.lower.is_some() && self.upper.is_some()
    }

    /// Lower interval bounds.
    pub fn lower(&self) -> Option<&[f64]> {
        self.lower.as_deref()
    }

    /// Upper interval bounds.
    pub fn upper(&self) -> Option<&[f64]> {
        self.upper.as_deref()
    }

    /// Interval coverage level, when intervals are present.
    pub fn level(&self) -> Option<f64> {
        self.level
    }

    /// Consume the forecast, returning `(point, lower, upper)`.
    ///
    /// Fails with [`ForecastError::ComputationError`] when no intervals exist.
    pub fn into_parts(self) -> Result<(Vec<f64>, Vec<f64>, Vec<f64>)> {
        match (self.lower, self.upper) {
            (Some(lower), Some(upper)) => Ok((self.point, lower, upper)),
            _ => Err(ForecastError::ComputationError(
                "forecast has no prediction intervals".to_string(),
            )),
        }
    }
}
