//! Traits at the seams between the pipeline and the model-fitting capability.

use crate::core::{Forecast, TimeSeries};
use crate::error::Result;
use crate::models::arima::{ModelSummary, OrderSpec};

/// Common interface for fitted forecasting models.
pub trait Forecaster {
    /// Fit the model to the time series data.
    fn fit(&mut self, series: &TimeSeries) -> Result<()>;

    /// Generate point predictions for the specified horizon.
    fn predict(&self, horizon: usize) -> Result<Forecast>;

    /// Generate predictions with confidence intervals.
    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        let _ = level;
        self.predict(horizon)
    }

    /// Get the fitted values (in-sample predictions).
    fn fitted_values(&self) -> Option<&[f64]>;

    /// Get the residuals (actual - fitted).
    fn residuals(&self) -> Option<&[f64]>;

    /// Get the model name.
    fn name(&self) -> &str;

    /// Check if the model has been fitted.
    fn is_fitted(&self) -> bool {
        self.fitted_values().is_some()
    }
}

/// A fitted ARIMA-family model handle.
///
/// Created by [`ArimaBackend::fit`], consumed by forecasting and result
/// assembly, then dropped at the end of the run.
pub trait FittedArima: Forecaster {
    /// The order this model was fitted with.
    fn order(&self) -> OrderSpec;

    /// Coefficients, likelihood and information criteria of the fit.
    fn summary(&self) -> Result<ModelSummary>;
}

/// Order search and estimation capability driven by the pipeline.
///
/// Any implementation honouring these contracts can back the pipeline:
/// `select_order` never fails because a single candidate failed, and `fit`
/// never substitutes a different order.
pub trait ArimaBackend {
    type Model: FittedArima;

    /// Choose the best order for `train`. `seasonal_period` is `Some(m)`
    /// exactly when seasonal terms must be searched, and the returned
    /// [`OrderSpec::seasonal`] is then always populated.
    fn select_order(&self, train: &TimeSeries, seasonal_period: Option<usize>) -> Result<OrderSpec>;

    /// Fit exactly `order` to `series`.
    fn fit(&self, series: &TimeSeries, order: &OrderSpec) -> Result<Self::Model>;
}
