//! Accuracy metrics for holdout evaluation.

use crate::error::{ForecastError, Result};
use serde::Serialize;

/// Non-fatal conditions met while computing metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MetricWarning {
    /// Actual values of exactly zero were left out of the MAPE mean.
    ZeroActuals { excluded: usize },
}

/// Accuracy of holdout predictions against the withheld actuals.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Squared Error
    pub rmse: f64,
    /// Mean Absolute Percentage Error over non-zero actuals (None if every actual is zero)
    pub mape: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<MetricWarning>,
}

impl EvaluationMetrics {
    /// Whether any degenerate-metric condition was met.
    pub fn is_degenerate(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Compute MAE, RMSE and MAPE between actual and predicted values.
///
/// Zero actuals cannot be expressed as a percentage error; they are excluded
/// from the MAPE mean and reported through [`MetricWarning::ZeroActuals`].
pub fn evaluate(actual: &[f64], predicted: &[f64]) -> Result<EvaluationMetrics> {
    if actual.len() != predicted.len() {
        return Err(ForecastError::DimensionMismatch {
            expected: actual.len(),
            got: predicted.len(),
        });
    }
    if actual.is_empty() {
        return Err(ForecastError::InsufficientData { needed: 1, got: 0 });
    }
    if actual.iter().chain(predicted).any(|v| !v.is_finite()) {
        return Err(ForecastError::ComputationError(
            "metrics require finite actual and predicted values".to_string(),
        ));
    }

    let (mape, excluded) = guarded_mape(actual, predicted);
    let mut warnings = Vec::new();
    if excluded > 0 {
        tracing::warn!(
            excluded,
            total = actual.len(),
            "zero actual values excluded from MAPE"
        );
        warnings.push(MetricWarning::ZeroActuals { excluded });
    }

    Ok(EvaluationMetrics {
        mae: mae(actual, predicted),
        rmse: rmse(actual, predicted),
        mape,
        warnings,
    })
}

/// MAPE over the points whose actual value is non-zero, plus the count skipped.
fn guarded_mape(actual: &[f64], predicted: &[f64]) -> (Option<f64>, usize) {
    let (sum, used) = actual
        .iter()
        .zip(predicted)
        .filter(|(a, _)| **a != 0.0)
        .fold((0.0, 0usize), |(sum, used), (a, p)| {
            (sum + ((a - p) / a).abs(), used + 1)
        });

    let excluded = actual.len() - used;
    if used == 0 {
        (None, excluded)
    } else {
        (Some(100.0 * sum / used as f64), excluded)
    }
}

/// Calculate MAE between two slices.
pub fn mae(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).abs())
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate MSE between two slices.
pub fn mse(actual: &[f64], predicted: &[f64]) -> f64 {
    if actual.len() != predicted.len() || actual.is_empty() {
        return f64::NAN;
    }
    actual
        .iter()
        .zip(predicted)
        .map(|(a, p)| (a - p).powi(2))
        .sum::<f64>()
        / actual.len() as f64
}

/// Calculate RMSE between two slices.
pub fn rmse(actual: &[f64], predicted: &[f64]) -> f64 {
    mse(actual, predicted).sqrt()
}
