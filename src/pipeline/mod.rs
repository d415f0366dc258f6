//! End-to-end forecasting pipeline.
//!
//! One [`Pipeline::run`] call prepares the raw rows, splits them
//! chronologically, selects an order on the training part, fits that order
//! twice (train-only for holdout evaluation, full data for the delivered
//! forecast), extends the time index and packages everything into a
//! [`ResultRecord`]. Each run owns all of its state.

mod prepare;
mod result;
mod split;

pub use prepare::{parse_date, prepare_series, RawDate, RawRow, RawValue};
pub use result::{ForecastRow, ResultParts, ResultRecord, CSV_HEADER};
pub use split::{split, split_index, SplitResult};

use serde::{Deserialize, Serialize};

use crate::core::{Frequency, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::{AutoARIMAConfig, AutoArimaBackend, ModelSummary, OrderSpec};
use crate::models::{ArimaBackend, FittedArima, Forecaster};
use crate::utils::evaluate;

/// Structured request for one pipeline run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineInput {
    pub rows: Vec<RawRow>,
    /// Share of the series used for training, in (0, 1].
    pub train_ratio: f64,
    /// Number of future steps to forecast, at least 1.
    pub forecast_periods: usize,
    pub seasonal: bool,
    /// Periods per seasonal cycle; required (and at least 2) when `seasonal`.
    pub seasonal_period: Option<usize>,
}

impl PipelineInput {
    /// Non-seasonal request.
    pub fn new(rows: Vec<RawRow>, train_ratio: f64, forecast_periods: usize) -> Self {
        Self {
            rows,
            train_ratio,
            forecast_periods,
            seasonal: false,
            seasonal_period: None,
        }
    }

    /// Enable seasonal terms with `period` observations per cycle.
    pub fn with_seasonality(mut self, period: usize) -> Self {
        self.seasonal = true;
        self.seasonal_period = Some(period);
        self
    }

    /// Check the request and return the seasonal period to search, if any.
    pub fn validate(&self) -> Result<Option<usize>> {
        if !(self.train_ratio > 0.0 && self.train_ratio <= 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "train_ratio must be in (0, 1], got {}",
                self.train_ratio
            )));
        }
        if self.forecast_periods == 0 {
            return Err(ForecastError::InvalidParameter(
                "forecast_periods must be at least 1".to_string(),
            ));
        }
        if !self.seasonal {
            return Ok(None);
        }
        match self.seasonal_period {
            Some(period) if period >= 2 => Ok(Some(period)),
            Some(period) => Err(ForecastError::InvalidParameter(format!(
                "seasonal_period must be at least 2, got {period}"
            ))),
            None => Err(ForecastError::InvalidParameter(
                "seasonal_period is required when seasonal is enabled".to_string(),
            )),
        }
    }
}

/// Pipeline settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Order search settings (the seasonal period is taken from the input).
    pub search: AutoARIMAConfig,
    /// Coverage of the forecast intervals.
    pub confidence_level: f64,
    /// Share of spacings the modal interval must exceed to be trusted.
    pub frequency_tolerance: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            search: AutoARIMAConfig::default(),
            confidence_level: 0.95,
            frequency_tolerance: 0.5,
        }
    }
}

impl PipelineConfig {
    /// Set the order search settings.
    pub fn with_search(mut self, search: AutoARIMAConfig) -> Self {
        self.search = search;
        self
    }

    /// Set the interval coverage.
    pub fn with_confidence_level(mut self, level: f64) -> Self {
        self.confidence_level = level;
        self
    }

    /// Set the frequency inference tolerance.
    pub fn with_frequency_tolerance(mut self, tolerance: f64) -> Self {
        self.frequency_tolerance = tolerance;
        self
    }

    fn validate(&self) -> Result<()> {
        if !(self.confidence_level > 0.0 && self.confidence_level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence_level must be in (0, 1), got {}",
                self.confidence_level
            )));
        }
        if !(0.0..1.0).contains(&self.frequency_tolerance) {
            return Err(ForecastError::InvalidParameter(format!(
                "frequency_tolerance must be in [0, 1), got {}",
                self.frequency_tolerance
            )));
        }
        Ok(())
    }
}

/// Coarse progress points of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Milestone {
    SearchStarted,
    SearchFinished(OrderSpec),
    HoldoutFitted,
    Evaluated,
    FullFitted,
    ForecastFinished,
}

/// Receives progress milestones. Advisory only; it cannot affect the run.
pub trait ProgressObserver {
    fn on_milestone(&self, milestone: Milestone);
}

impl<F: Fn(Milestone)> ProgressObserver for F {
    fn on_milestone(&self, milestone: Milestone) {
        self(milestone)
    }
}

/// Observer that ignores every milestone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Silent;

impl ProgressObserver for Silent {
    fn on_milestone(&self, _: Milestone) {}
}

/// Forecasting pipeline over an [`ArimaBackend`].
#[derive(Debug, Clone)]
pub struct Pipeline<B: ArimaBackend = AutoArimaBackend> {
    backend: B,
    config: PipelineConfig,
}

impl Pipeline<AutoArimaBackend> {
    /// Pipeline using the built-in AutoARIMA search.
    pub fn new(config: PipelineConfig) -> Self {
        let backend = AutoArimaBackend::new(config.search.clone());
        Self { backend, config }
    }
}

impl Default for Pipeline<AutoArimaBackend> {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

impl<B: ArimaBackend> Pipeline<B> {
    /// Pipeline over a caller-supplied backend; `config.search` is unused.
    pub fn with_backend(backend: B, config: PipelineConfig) -> Self {
        Self { backend, config }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline once.
    pub fn run(&self, input: &PipelineInput) -> Result<ResultRecord> {
        self.run_with_observer(input, &Silent)
    }

    /// Run the pipeline once, reporting milestones to `observer`.
    pub fn run_with_observer(
        &self,
        input: &PipelineInput,
        observer: &dyn ProgressObserver,
    ) -> Result<ResultRecord> {
        self.config.validate()?;
        let seasonal_period = input.validate()?;

        let series = prepare_series(&input.rows)?;
        let parts = split(&series, input.train_ratio)?;
        tracing::info!(
            observations = series.len(),
            dropped = input.rows.len() - series.len(),
            train = parts.train.len(),
            test = parts.test.len(),
            "series prepared"
        );

        observer.on_milestone(Milestone::SearchStarted);
        tracing::info!(seasonal_period, "order search started");
        let order = self.backend.select_order(&parts.train, seasonal_period)?;
        tracing::info!(%order, "order search finished");
        observer.on_milestone(Milestone::SearchFinished(order));

        let (holdout_predictions, metrics) = if parts.test.is_empty() {
            tracing::info!("empty holdout, evaluation skipped");
            (Vec::new(), None)
        } else {
            let (model, _) = self.fit_order(&parts.train, &order)?;
            observer.on_milestone(Milestone::HoldoutFitted);

            let predictions = model.predict(parts.test.len())?.point().to_vec();
            let metrics = evaluate(parts.test.values(), &predictions)?;
            tracing::info!(
                mae = metrics.mae,
                rmse = metrics.rmse,
                mape = metrics.mape,
                "holdout evaluated"
            );
            observer.on_milestone(Milestone::Evaluated);
            (predictions, Some(metrics))
        };

        let (model, summary) = self.fit_order(&series, &order)?;
        observer.on_milestone(Milestone::FullFitted);

        let forecast =
            model.predict_with_intervals(input.forecast_periods, self.config.confidence_level)?;
        let frequency =
            Frequency::infer_or_daily(series.timestamps(), self.config.frequency_tolerance);
        let last = series.last_timestamp().ok_or(ForecastError::EmptySeries)?;
        let future_timestamps = frequency.future_timestamps(last, input.forecast_periods)?;
        tracing::info!(horizon = input.forecast_periods, %frequency, "forecast finished");
        observer.on_milestone(Milestone::ForecastFinished);

        ResultRecord::assemble(ResultParts {
            order,
            summary,
            residuals: model.residuals().map(<[f64]>::to_vec).unwrap_or_default(),
            metrics,
            holdout_predictions,
            forecast,
            future_timestamps,
            train_len: parts.train.len(),
            test_len: parts.test.len(),
            frequency,
        })
    }

    /// Fit exactly `order`; any failure is reported as a fit error for it.
    fn fit_order(
        &self,
        series: &TimeSeries,
        order: &OrderSpec,
    ) -> Result<(B::Model, ModelSummary)> {
        let model = self.backend.fit(series, order).map_err(|err| match err {
            ForecastError::Fit { .. } => err,
            other => ForecastError::Fit {
                order: order.to_string(),
                reason: other.to_string(),
            },
        })?;

        let summary = model.summary()?;
        if !summary.converged {
            tracing::warn!(
                %order,
                iterations = summary.iterations,
                "optimizer stopped at its iteration limit"
            );
        }
        Ok((model, summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Forecast;
    use crate::models::arima::SARIMA;
    use std::cell::{Cell, RefCell};

    fn rows(n: usize) -> Vec<RawRow> {
        let mut state: u64 = 17;
        (0..n)
            .map(|i| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                let noise = (state >> 33) as f64 / (1u64 << 31) as f64 - 0.5;
                let ts = parse_date("2024-01-01").unwrap() + chrono::Duration::days(i as i64);
                RawRow::new(ts, 50.0 + 0.2 * i as f64 + noise)
            })
            .collect()
    }

    /// Always answers with one order.
    struct FixedOrder(OrderSpec);

    impl ArimaBackend for FixedOrder {
        type Model = SARIMA;

        fn select_order(&self, _: &TimeSeries, _: Option<usize>) -> Result<OrderSpec> {
            Ok(self.0)
        }

        fn fit(&self, series: &TimeSeries, order: &OrderSpec) -> Result<SARIMA> {
            let mut model = SARIMA::new(*order);
            model.fit(series)?;
            Ok(model)
        }
    }

    /// Search fails outright.
    struct NoOrder;

    impl ArimaBackend for NoOrder {
        type Model = SARIMA;

        fn select_order(&self, _: &TimeSeries, _: Option<usize>) -> Result<OrderSpec> {
            Err(ForecastError::OrderSearch("nothing converged".to_string()))
        }

        fn fit(&self, _: &TimeSeries, _: &OrderSpec) -> Result<SARIMA> {
            unreachable!("fit must not run after a failed search")
        }
    }

    /// Wraps a fitted SARIMA and counts summary requests.
    struct Audited<'a> {
        inner: SARIMA,
        summaries: &'a Cell<usize>,
        broken_summary: bool,
    }

    impl Forecaster for Audited<'_> {
        fn fit(&mut self, series: &TimeSeries) -> Result<()> {
            self.inner.fit(series)
        }

        fn predict(&self, horizon: usize) -> Result<Forecast> {
            self.inner.predict(horizon)
        }

        fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
            self.inner.predict_with_intervals(horizon, level)
        }

        fn fitted_values(&self) -> Option<&[f64]> {
            self.inner.fitted_values()
        }

        fn residuals(&self) -> Option<&[f64]> {
            self.inner.residuals()
        }

        fn name(&self) -> &str {
            "audited"
        }
    }

    impl FittedArima for Audited<'_> {
        fn order(&self) -> OrderSpec {
            self.inner.order()
        }

        fn summary(&self) -> Result<ModelSummary> {
            self.summaries.set(self.summaries.get() + 1);
            if self.broken_summary {
                return Err(ForecastError::ComputationError("no summary".to_string()));
            }
            self.inner.summary()
        }
    }

    struct AuditedBackend<'a> {
        order: OrderSpec,
        summaries: &'a Cell<usize>,
        broken_summary: bool,
    }

    impl<'a> ArimaBackend for AuditedBackend<'a> {
        type Model = Audited<'a>;

        fn select_order(&self, _: &TimeSeries, _: Option<usize>) -> Result<OrderSpec> {
            Ok(self.order)
        }

        fn fit(&self, series: &TimeSeries, order: &OrderSpec) -> Result<Audited<'a>> {
            let mut inner = SARIMA::new(*order);
            inner.fit(series)?;
            Ok(Audited {
                inner,
                summaries: self.summaries,
                broken_summary: self.broken_summary,
            })
        }
    }

    #[test]
    fn one_summary_per_fit() {
        let summaries = Cell::new(0);
        let backend = AuditedBackend {
            order: OrderSpec::arima(0, 1, 1),
            summaries: &summaries,
            broken_summary: false,
        };
        let record = Pipeline::with_backend(backend, PipelineConfig::default())
            .run(&PipelineInput::new(rows(40), 0.75, 3))
            .unwrap();

        // Holdout fit and full fit.
        assert_eq!(summaries.get(), 2);
        assert_eq!(record.summary.nobs, 40);
    }

    #[test]
    fn summary_failure_is_reported() {
        let summaries = Cell::new(0);
        let backend = AuditedBackend {
            order: OrderSpec::arima(0, 1, 0),
            summaries: &summaries,
            broken_summary: true,
        };
        let result = Pipeline::with_backend(backend, PipelineConfig::default())
            .run(&PipelineInput::new(rows(20), 1.0, 2));
        assert!(matches!(result, Err(ForecastError::ComputationError(_))));
        assert_eq!(summaries.get(), 1);
    }

    #[test]
    fn constant_series_is_forecast_flat() {
        let constant: Vec<RawRow> = rows(30)
            .into_iter()
            .map(|row| RawRow::new(row.date, 7.0))
            .collect();
        let record = Pipeline::default()
            .run(&PipelineInput::new(constant, 0.8, 4))
            .unwrap();

        assert_eq!(record.order, OrderSpec::arima(0, 0, 0));
        let metrics = record.metrics.as_ref().unwrap();
        assert_eq!(metrics.mae, 0.0);
        for row in record.forecast_table() {
            assert_eq!(row.point_forecast, 7.0);
            assert_eq!(row.lower_bound, 7.0);
            assert_eq!(row.upper_bound, 7.0);
        }
    }

    #[test]
    fn input_validation() {
        let ok = PipelineInput::new(rows(10), 0.8, 3);
        assert_eq!(ok.validate(), Ok(None));
        assert_eq!(ok.clone().with_seasonality(7).validate(), Ok(Some(7)));

        let bad = [
            PipelineInput::new(rows(10), 0.0, 3),
            PipelineInput::new(rows(10), 1.2, 3),
            PipelineInput::new(rows(10), 0.8, 0),
            PipelineInput::new(rows(10), 0.8, 3).with_seasonality(1),
            PipelineInput {
                seasonal: true,
                ..PipelineInput::new(rows(10), 0.8, 3)
            },
        ];
        for input in bad {
            assert!(matches!(
                input.validate(),
                Err(ForecastError::InvalidParameter(_))
            ));
        }

        // A period without the seasonal flag is ignored.
        let ignored = PipelineInput {
            seasonal_period: Some(1),
            ..PipelineInput::new(rows(10), 0.8, 3)
        };
        assert_eq!(ignored.validate(), Ok(None));
    }

    #[test]
    fn config_validation() {
        let pipeline = Pipeline::new(PipelineConfig::default().with_confidence_level(1.0));
        assert!(matches!(
            pipeline.run(&PipelineInput::new(rows(30), 0.8, 3)),
            Err(ForecastError::InvalidParameter(_))
        ));

        let pipeline = Pipeline::new(PipelineConfig::default().with_frequency_tolerance(1.0));
        assert!(pipeline
            .run(&PipelineInput::new(rows(30), 0.8, 3))
            .is_err());
    }

    #[test]
    fn milestones_in_order() {
        let seen = RefCell::new(Vec::new());
        let pipeline = Pipeline::with_backend(
            FixedOrder(OrderSpec::arima(0, 1, 1)),
            PipelineConfig::default(),
        );
        let record = pipeline
            .run_with_observer(&PipelineInput::new(rows(40), 0.75, 5), &|m: Milestone| {
                seen.borrow_mut().push(m)
            })
            .unwrap();

        assert_eq!(
            seen.into_inner(),
            vec![
                Milestone::SearchStarted,
                Milestone::SearchFinished(OrderSpec::arima(0, 1, 1)),
                Milestone::HoldoutFitted,
                Milestone::Evaluated,
                Milestone::FullFitted,
                Milestone::ForecastFinished,
            ]
        );
        assert_eq!(record.train_len, 30);
        assert_eq!(record.test_len, 10);
        assert_eq!(record.holdout_predictions.len(), 10);
        assert_eq!(record.forecast.len(), 5);
        assert_eq!(record.residuals.len(), 40);
    }

    #[test]
    fn evaluation_skipped_without_holdout() {
        let seen = RefCell::new(Vec::new());
        let pipeline = Pipeline::with_backend(
            FixedOrder(OrderSpec::arima(0, 1, 0)),
            PipelineConfig::default(),
        );
        let record = pipeline
            .run_with_observer(&PipelineInput::new(rows(20), 1.0, 2), &|m: Milestone| {
                seen.borrow_mut().push(m)
            })
            .unwrap();

        assert!(record.metrics.is_none());
        assert!(record.holdout_predictions.is_empty());
        assert!(!seen.borrow().contains(&Milestone::Evaluated));
        assert_eq!(record.forecast.len(), 2);
    }

    #[test]
    fn search_failure_halts() {
        let pipeline = Pipeline::with_backend(NoOrder, PipelineConfig::default());
        assert!(matches!(
            pipeline.run(&PipelineInput::new(rows(20), 0.8, 2)),
            Err(ForecastError::OrderSearch(_))
        ));
    }

    #[test]
    fn fit_failure_is_reported_for_the_order() {
        // Too many terms for the training part; no smaller order is tried.
        let pipeline = Pipeline::with_backend(
            FixedOrder(OrderSpec::arima(5, 1, 5)),
            PipelineConfig::default(),
        );
        match pipeline.run(&PipelineInput::new(rows(12), 0.5, 2)) {
            Err(ForecastError::Fit { order, .. }) => assert_eq!(order, "ARIMA(5,1,5)"),
            other => panic!("expected fit error, got {other:?}"),
        }
    }

    #[test]
    fn parse_errors_stop_before_fitting() {
        let mut input = PipelineInput::new(rows(20), 0.8, 2);
        input.rows[4] = RawRow::new("31/31/2024", 1.0);
        let pipeline = Pipeline::with_backend(NoOrder, PipelineConfig::default());
        assert!(matches!(
            pipeline.run(&input),
            Err(ForecastError::Parse { row: 4, .. })
        ));
    }

    #[test]
    fn custom_confidence_level_is_used() {
        let pipeline = Pipeline::with_backend(
            FixedOrder(OrderSpec::arima(0, 1, 0)),
            PipelineConfig::default().with_confidence_level(0.8),
        );
        let record = pipeline
            .run(&PipelineInput::new(rows(20), 1.0, 3))
            .unwrap();
        assert_eq!(record.confidence_level, 0.8);
        assert_eq!(record.frequency, Frequency::daily());
    }
}
