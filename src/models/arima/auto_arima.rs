//! Automatic ARIMA and SARIMA order selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{difference, seasonal_difference};
use crate::models::arima::model::SARIMA;
use crate::models::arima::order::{ArimaOrder, OrderSpec, SeasonalOrder};
use crate::models::{ArimaBackend, Forecaster};
use crate::validation::{kpss_test, seasonal_differencing_order};

/// Criterion minimised during order selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InformationCriterion {
    #[default]
    Aic,
    Bic,
}

impl InformationCriterion {
    fn score(self, model: &SARIMA) -> Option<f64> {
        match self {
            Self::Aic => model.aic(),
            Self::Bic => model.bic(),
        }
    }
}

/// Configuration for AutoARIMA.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutoARIMAConfig {
    /// Maximum non-seasonal AR order to consider.
    pub max_p: usize,
    /// Maximum non-seasonal differencing order.
    pub max_d: usize,
    /// Maximum non-seasonal MA order to consider.
    pub max_q: usize,
    /// Maximum seasonal AR order.
    pub max_cap_p: usize,
    /// Maximum seasonal differencing order.
    pub max_cap_d: usize,
    /// Maximum seasonal MA order.
    pub max_cap_q: usize,
    /// Maximum `p + q + P + Q`.
    pub max_order: usize,
    /// Seasonal period (0 for non-seasonal).
    pub seasonal_period: usize,
    /// Use stepwise search (faster) vs exhaustive.
    pub stepwise: bool,
    /// Fit budget of the stepwise search.
    pub max_models: usize,
    /// Selection criterion.
    pub criterion: InformationCriterion,
    /// Significance level of the KPSS test choosing `d`.
    pub kpss_alpha: f64,
}

impl Default for AutoARIMAConfig {
    fn default() -> Self {
        Self {
            max_p: 5,
            max_d: 2,
            max_q: 5,
            max_cap_p: 2,
            max_cap_d: 1,
            max_cap_q: 2,
            max_order: 5,
            seasonal_period: 0,
            stepwise: true,
            max_models: 100,
            criterion: InformationCriterion::Aic,
            kpss_alpha: 0.05,
        }
    }
}

impl AutoARIMAConfig {
    /// Set maximum non-seasonal orders.
    pub fn with_max_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_p = max_p;
        self.max_d = max_d;
        self.max_q = max_q;
        self
    }

    /// Set maximum seasonal orders.
    pub fn with_seasonal_orders(mut self, max_p: usize, max_d: usize, max_q: usize) -> Self {
        self.max_cap_p = max_p;
        self.max_cap_d = max_d;
        self.max_cap_q = max_q;
        self
    }

    /// Set seasonal period.
    pub fn with_seasonal_period(mut self, period: usize) -> Self {
        self.seasonal_period = period;
        self
    }

    /// Set the selection criterion.
    pub fn with_criterion(mut self, criterion: InformationCriterion) -> Self {
        self.criterion = criterion;
        self
    }

    /// Set the stepwise fit budget.
    pub fn with_max_models(mut self, max_models: usize) -> Self {
        self.max_models = max_models;
        self
    }

    /// Use exhaustive search instead of stepwise.
    pub fn exhaustive(mut self) -> Self {
        self.stepwise = false;
        self
    }

    fn is_seasonal(&self) -> bool {
        self.seasonal_period >= 2
    }

    fn admits(&self, spec: &OrderSpec) -> bool {
        let s = spec.seasonal_or_zero();
        spec.order.p <= self.max_p
            && spec.order.q <= self.max_q
            && s.p <= self.max_cap_p
            && s.q <= self.max_cap_q
            && spec.arma_terms() <= self.max_order
    }
}

/// Number of first differences needed before KPSS stops rejecting stationarity.
pub fn ndiffs(values: &[f64], max_d: usize, alpha: f64) -> usize {
    let mut d = 0;
    let mut x = values.to_vec();
    while d < max_d && !kpss_test(&x, None, alpha).is_stationary {
        x = difference(&x, 1);
        d += 1;
    }
    d
}

fn is_constant(values: &[f64]) -> bool {
    values.windows(2).all(|pair| pair[0] == pair[1])
}

/// Bookkeeping for one search run.
struct Search<'a> {
    series: &'a TimeSeries,
    config: &'a AutoARIMAConfig,
    visited: BTreeSet<OrderSpec>,
    scores: Vec<(OrderSpec, f64)>,
    best: Option<(SARIMA, f64)>,
}

impl<'a> Search<'a> {
    fn new(series: &'a TimeSeries, config: &'a AutoARIMAConfig) -> Self {
        Self {
            series,
            config,
            visited: BTreeSet::new(),
            scores: Vec::new(),
            best: None,
        }
    }

    fn attempts(&self) -> usize {
        self.visited.len()
    }

    fn best_order(&self) -> Option<OrderSpec> {
        self.best.as_ref().map(|(model, _)| model.spec())
    }

    /// Fit `spec` unless already tried. Returns true when it became the best.
    ///
    /// Candidate failures are expected during a search; they are logged and
    /// skipped here and nowhere else.
    fn consider(&mut self, spec: OrderSpec) -> bool {
        if !self.config.admits(&spec) || !self.visited.insert(spec) {
            return false;
        }

        let mut model = SARIMA::new(spec);
        let score = model.fit(self.series).and_then(|()| {
            self.config
                .criterion
                .score(&model)
                .filter(|s| !s.is_nan())
                .ok_or_else(|| ForecastError::ComputationError("undefined criterion".into()))
        });

        match score {
            Ok(score) => {
                tracing::debug!(order = %spec, score, "candidate fitted");
                self.scores.push((spec, score));
                let improved = self.best.as_ref().map_or(true, |(_, best)| score < *best);
                if improved {
                    self.best = Some((model, score));
                }
                improved
            }
            Err(err) => {
                tracing::debug!(order = %spec, error = %err, "candidate skipped");
                false
            }
        }
    }
}

/// Automatic ARIMA/SARIMA model selection.
///
/// Differencing orders come from unit-root style tests; the ARMA orders are
/// then chosen by minimising an information criterion, either with the
/// Hyndman-Khandakar stepwise walk or by exhaustive enumeration.
#[derive(Debug, Clone)]
pub struct AutoARIMA {
    /// Configuration.
    config: AutoARIMAConfig,
    /// Selected model.
    selected_model: Option<SARIMA>,
    /// All fitted models and their scores, best first.
    model_scores: Vec<(OrderSpec, f64)>,
}

impl AutoARIMA {
    /// Create a new AutoARIMA with default configuration.
    pub fn new() -> Self {
        Self::with_config(AutoARIMAConfig::default())
    }

    /// Create AutoARIMA with custom configuration.
    pub fn with_config(config: AutoARIMAConfig) -> Self {
        Self {
            config,
            selected_model: None,
            model_scores: Vec::new(),
        }
    }

    /// Create AutoARIMA with seasonal period.
    pub fn seasonal(period: usize) -> Self {
        Self::with_config(AutoARIMAConfig::default().with_seasonal_period(period))
    }

    /// Get the configuration.
    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }

    /// Get the selected order.
    pub fn selected_order(&self) -> Option<OrderSpec> {
        self.selected_model.as_ref().map(SARIMA::spec)
    }

    /// Get the selected model.
    pub fn selected_model(&self) -> Option<&SARIMA> {
        self.selected_model.as_ref()
    }

    /// Every successfully scored candidate, ascending by criterion.
    pub fn model_scores(&self) -> &[(OrderSpec, f64)] {
        &self.model_scores
    }

    /// Choose `(d, D)` for the series.
    fn differencing_orders(&self, values: &[f64]) -> (usize, usize) {
        let period = self.config.seasonal_period;
        let cap_d = if self.config.is_seasonal() {
            seasonal_differencing_order(values, period).min(self.config.max_cap_d)
        } else {
            0
        };
        let deseasonalized = seasonal_difference(values, cap_d, period);
        let d = ndiffs(&deseasonalized, self.config.max_d, self.config.kpss_alpha);
        (d, cap_d)
    }

    fn make_spec(
        &self,
        (p, d, q): (usize, usize, usize),
        (cap_p, cap_d, cap_q): (usize, usize, usize),
    ) -> OrderSpec {
        let order = ArimaOrder::new(p, d, q);
        if self.config.is_seasonal() {
            OrderSpec::sarima(
                order,
                SeasonalOrder::new(cap_p, cap_d, cap_q, self.config.seasonal_period),
            )
        } else {
            OrderSpec {
                order,
                seasonal: None,
            }
        }
    }

    fn stepwise(&self, search: &mut Search<'_>, d: usize, cap_d: usize) {
        let seasonal = self.config.is_seasonal();
        let starts = [
            ((2, 2), (1, 1)),
            ((0, 0), (0, 0)),
            ((1, 0), (1, 0)),
            ((0, 1), (0, 1)),
        ];
        for ((p, q), (cap_p, cap_q)) in starts {
            if search.attempts() >= self.config.max_models {
                return;
            }
            let (cap_p, cap_q) = if seasonal { (cap_p, cap_q) } else { (0, 0) };
            search.consider(self.make_spec((p, d, q), (cap_p, cap_d, cap_q)));
        }

        let mut moves: Vec<(i64, i64, i64, i64)> = Vec::new();
        if seasonal {
            moves.extend([
                (0, 0, -1, 0),
                (0, 0, 1, 0),
                (0, 0, 0, -1),
                (0, 0, 0, 1),
                (0, 0, -1, -1),
                (0, 0, 1, 1),
                (0, 0, -1, 1),
                (0, 0, 1, -1),
            ]);
        }
        moves.extend([
            (-1, 0, 0, 0),
            (1, 0, 0, 0),
            (0, -1, 0, 0),
            (0, 1, 0, 0),
            (-1, -1, 0, 0),
            (1, 1, 0, 0),
            (-1, 1, 0, 0),
            (1, -1, 0, 0),
        ]);

        'walk: while let Some(current) = search.best_order() {
            let s = current.seasonal_or_zero();
            for (dp, dq, dcap_p, dcap_q) in &moves {
                if search.attempts() >= self.config.max_models {
                    tracing::debug!(attempts = search.attempts(), "model budget exhausted");
                    break 'walk;
                }
                let shift = |v: usize, delta: i64| usize::try_from(v as i64 + delta).ok();
                let (Some(p), Some(q), Some(cap_p), Some(cap_q)) = (
                    shift(current.order.p, *dp),
                    shift(current.order.q, *dq),
                    shift(s.p, *dcap_p),
                    shift(s.q, *dcap_q),
                ) else {
                    continue;
                };
                if search.consider(self.make_spec((p, d, q), (cap_p, cap_d, cap_q))) {
                    continue 'walk;
                }
            }
            break;
        }
    }

    /// A constant series admits only the mean model, fitted without search.
    fn fit_constant(&mut self, series: &TimeSeries) -> Result<()> {
        let spec = self.make_spec((0, 0, 0), (0, 0, 0));
        let mut model = SARIMA::new(spec);
        if let Err(err) = model.fit(series) {
            self.selected_model = None;
            self.model_scores.clear();
            return Err(ForecastError::OrderSearch(format!(
                "constant series of {} observations: {err}",
                series.len()
            )));
        }
        tracing::debug!(order = %spec, "constant series, mean model selected");
        let score = self.config.criterion.score(&model).unwrap_or(f64::NAN);
        self.model_scores = vec![(spec, score)];
        self.selected_model = Some(model);
        Ok(())
    }

    fn exhaustive(&self, search: &mut Search<'_>, d: usize, cap_d: usize) {
        let (max_cap_p, max_cap_q) = if self.config.is_seasonal() {
            (self.config.max_cap_p, self.config.max_cap_q)
        } else {
            (0, 0)
        };
        for p in 0..=self.config.max_p {
            for q in 0..=self.config.max_q {
                for cap_p in 0..=max_cap_p {
                    for cap_q in 0..=max_cap_q {
                        search.consider(self.make_spec((p, d, q), (cap_p, cap_d, cap_q)));
                    }
                }
            }
        }
    }
}

impl Default for AutoARIMA {
    fn default() -> Self {
        Self::new()
    }
}

impl Forecaster for AutoARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if self.config.seasonal_period == 1 {
            return Err(ForecastError::InvalidParameter(
                "seasonal period must be 0 or at least 2".to_string(),
            ));
        }

        if is_constant(series.values()) {
            return self.fit_constant(series);
        }

        let (d, cap_d) = self.differencing_orders(series.values());
        tracing::debug!(d, cap_d, stepwise = self.config.stepwise, "differencing chosen");

        let mut search = Search::new(series, &self.config);
        if self.config.stepwise {
            self.stepwise(&mut search, d, cap_d);
        } else {
            self.exhaustive(&mut search, d, cap_d);
        }

        let attempts = search.attempts();
        let Search {
            mut scores, best, ..
        } = search;
        scores.sort_by(|a, b| a.1.total_cmp(&b.1));

        match best {
            Some((model, score)) => {
                tracing::debug!(order = %model.spec(), score, attempts, "order selected");
                self.selected_model = Some(model);
                self.model_scores = scores;
                Ok(())
            }
            None => {
                self.selected_model = None;
                self.model_scores.clear();
                Err(ForecastError::OrderSearch(format!(
                    "none of {attempts} candidate orders could be fitted to {} observations",
                    series.len()
                )))
            }
        }
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        self.selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict(horizon)
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        self.selected_model
            .as_ref()
            .ok_or(ForecastError::FitRequired)?
            .predict_with_intervals(horizon, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.fitted_values()
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.selected_model.as_ref()?.residuals()
    }

    fn name(&self) -> &str {
        if self.config.is_seasonal() {
            "AutoARIMA (SARIMA)"
        } else {
            "AutoARIMA"
        }
    }
}

/// [`ArimaBackend`] backed by [`AutoARIMA`] search and [`SARIMA`] fits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoArimaBackend {
    config: AutoARIMAConfig,
}

impl AutoArimaBackend {
    /// Create a backend searching with `config`.
    ///
    /// The seasonal period of `config` is overridden per call by
    /// [`ArimaBackend::select_order`].
    pub fn new(config: AutoARIMAConfig) -> Self {
        Self { config }
    }

    /// Get the search configuration.
    pub fn config(&self) -> &AutoARIMAConfig {
        &self.config
    }
}

impl ArimaBackend for AutoArimaBackend {
    type Model = SARIMA;

    fn select_order(&self, train: &TimeSeries, seasonal_period: Option<usize>) -> Result<OrderSpec> {
        let config = self
            .config
            .clone()
            .with_seasonal_period(seasonal_period.unwrap_or(0));
        let mut search = AutoARIMA::with_config(config);
        search.fit(train)?;
        search.selected_order().ok_or(ForecastError::FitRequired)
    }

    fn fit(&self, series: &TimeSeries, order: &OrderSpec) -> Result<SARIMA> {
        let mut model = SARIMA::new(*order);
        model.fit(series)?;
        Ok(model)
    }
}
