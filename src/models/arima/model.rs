//! Seasonal ARIMA model estimated by conditional sum of squares.

use std::f64::consts::PI;
use std::fmt;

use serde::Serialize;

use crate::core::{Forecast, TimeSeries};
use crate::error::{ForecastError, Result};
use crate::models::arima::diff::{differencing_loss, full_difference};
use crate::models::arima::order::OrderSpec;
use crate::models::arima::polynomial::{
    ar_polynomial, differencing_polynomial, is_invertible, is_stationary, ma_polynomial,
    poly_mul, psi_weights,
};
use crate::models::{FittedArima, Forecaster};
use crate::utils::optimization::{nelder_mead, NelderMeadConfig};
use crate::utils::stats::{mean, quantile_normal};
use crate::validation::residual_tests::{ljung_box, LjungBoxResult};

/// Estimated coefficients of a seasonal ARIMA model.
#[derive(Debug, Clone, Default, PartialEq)]
struct Coefficients {
    mean: Option<f64>,
    ar: Vec<f64>,
    ma: Vec<f64>,
    seasonal_ar: Vec<f64>,
    seasonal_ma: Vec<f64>,
}

impl Coefficients {
    /// Unpack an optimizer vector laid out as `[mean?, ar, ma, sar, sma]`.
    fn from_vector(spec: &OrderSpec, params: &[f64]) -> Self {
        let seasonal = spec.seasonal_or_zero();
        let mut rest = params;
        let mut take = |n: usize| {
            let (head, tail) = rest.split_at(n);
            rest = tail;
            head.to_vec()
        };

        let mean = spec.has_mean().then(|| take(1)[0]);
        Self {
            mean,
            ar: take(spec.order.p),
            ma: take(spec.order.q),
            seasonal_ar: take(seasonal.p),
            seasonal_ma: take(seasonal.q),
        }
    }

    fn is_admissible(&self) -> bool {
        is_stationary(&self.ar)
            && is_stationary(&self.seasonal_ar)
            && is_invertible(&self.ma)
            && is_invertible(&self.seasonal_ma)
    }

    /// Multiplied-out `φ(B)Φ(B^m)` and `θ(B)Θ(B^m)`.
    fn arma_polynomials(&self, period: usize) -> (Vec<f64>, Vec<f64>) {
        let ar = poly_mul(
            &ar_polynomial(&self.ar, 1),
            &ar_polynomial(&self.seasonal_ar, period),
        );
        let ma = poly_mul(
            &ma_polynomial(&self.ma, 1),
            &ma_polynomial(&self.seasonal_ma, period),
        );
        (ar, ma)
    }
}

/// Conditional residuals of the ARMA recursion on `w`.
///
/// `ar` and `ma` are lag polynomials with a leading 1. Pre-sample deviations
/// and innovations are zero, so every observation of `w` yields a residual
/// and all orders sharing `(d, D)` are scored on the same window.
fn css_residuals(w: &[f64], ar: &[f64], ma: &[f64], mean: f64) -> Vec<f64> {
    let mut e = vec![0.0; w.len()];
    for t in 0..w.len() {
        let mut pred = 0.0;
        for k in 1..ar.len().min(t + 1) {
            pred -= ar[k] * (w[t - k] - mean);
        }
        for k in 1..ma.len().min(t + 1) {
            pred += ma[k] * e[t - k];
        }
        e[t] = w[t] - mean - pred;
    }
    e
}

/// State produced by a successful fit.
#[derive(Debug, Clone)]
struct FittedState {
    coefs: Coefficients,
    /// `φ(B)Φ(B^m)(1-B)^d(1-B^m)^D`.
    integrated_ar: Vec<f64>,
    /// `θ(B)Θ(B^m)`.
    ma: Vec<f64>,
    sigma2: f64,
    log_likelihood: f64,
    aic: f64,
    bic: f64,
    n_eff: usize,
    /// First residual index past differencing and AR start-up.
    burn_in: usize,
    history: Vec<f64>,
    residuals: Vec<f64>,
    fitted: Vec<f64>,
    iterations: usize,
    converged: bool,
}

/// Fit report of a seasonal ARIMA model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub order: OrderSpec,
    /// Observations in the fitted series.
    pub nobs: usize,
    /// Observations contributing to the conditional sum of squares, i.e. the
    /// length of the differenced series.
    pub n_effective: usize,
    pub log_likelihood: f64,
    pub aic: f64,
    pub bic: f64,
    /// Innovation variance.
    pub sigma2: f64,
    pub mean: Option<f64>,
    pub ar: Vec<f64>,
    pub ma: Vec<f64>,
    pub seasonal_ar: Vec<f64>,
    pub seasonal_ma: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
    /// Portmanteau test on the informative residuals.
    pub ljung_box: LjungBoxResult,
}

impl fmt::Display for ModelSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "=".repeat(44);
        let thin = "-".repeat(44);
        writeln!(f, "{} Results", self.order)?;
        writeln!(f, "{rule}")?;
        writeln!(f, "{:<24}{:>20}", "No. Observations:", self.nobs)?;
        writeln!(f, "{:<24}{:>20}", "Effective Obs.:", self.n_effective)?;
        writeln!(f, "{:<24}{:>20.3}", "Log Likelihood:", self.log_likelihood)?;
        writeln!(f, "{:<24}{:>20.3}", "AIC:", self.aic)?;
        writeln!(f, "{:<24}{:>20.3}", "BIC:", self.bic)?;
        writeln!(f, "{thin}")?;
        writeln!(f, "{:<24}{:>20}", "", "coef")?;
        if let Some(mean) = self.mean {
            writeln!(f, "{:<24}{:>20.4}", "mean", mean)?;
        }
        let period = self.order.period();
        let rows = [
            ("ar.L", &self.ar, 1),
            ("ma.L", &self.ma, 1),
            ("ar.S.L", &self.seasonal_ar, period),
            ("ma.S.L", &self.seasonal_ma, period),
        ];
        for (prefix, coefs, stride) in rows {
            for (i, c) in coefs.iter().enumerate() {
                let name = format!("{prefix}{}", (i + 1) * stride);
                writeln!(f, "{name:<24}{c:>20.4}")?;
            }
        }
        writeln!(f, "{:<24}{:>20.4}", "sigma2", self.sigma2)?;
        writeln!(f, "{thin}")?;
        write!(
            f,
            "Ljung-Box (L{}): Q = {:.3}, p = {:.3}",
            self.ljung_box.lags, self.ljung_box.statistic, self.ljung_box.p_value
        )
    }
}

/// Seasonal ARIMA(p, d, q)(P, D, Q)\[m\] model.
///
/// `φ(B)Φ(B^m)(1-B)^d(1-B^m)^D (y_t - μ) = θ(B)Θ(B^m) e_t`, where the mean
/// `μ` is only estimated when the model is not differenced. Coefficients
/// minimise the conditional sum of squares subject to stationarity and
/// invertibility; non-seasonal orders leave `seasonal` empty.
///
/// # Example
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use sarima_forecast::core::TimeSeries;
/// use sarima_forecast::models::arima::{OrderSpec, SARIMA};
/// use sarima_forecast::models::Forecaster;
///
/// let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
/// let timestamps = (0..6).map(|i| start + Duration::days(i)).collect();
/// let series = TimeSeries::new(timestamps, vec![1.0, 3.0, 2.0, 5.0, 4.0, 6.0]).unwrap();
///
/// let mut model = SARIMA::new(OrderSpec::arima(0, 1, 0));
/// model.fit(&series).unwrap();
/// assert_eq!(model.predict(2).unwrap().point(), &[6.0, 6.0]);
/// ```
#[derive(Debug, Clone)]
pub struct SARIMA {
    spec: OrderSpec,
    state: Option<FittedState>,
}

impl SARIMA {
    /// Create an unfitted model with the given order.
    pub fn new(spec: OrderSpec) -> Self {
        Self { spec, state: None }
    }

    /// Create a non-seasonal ARIMA(p, d, q) model.
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self::new(OrderSpec::arima(p, d, q))
    }

    /// Get the model order.
    pub fn spec(&self) -> OrderSpec {
        self.spec
    }

    /// Get AIC.
    pub fn aic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.aic)
    }

    /// Get BIC.
    pub fn bic(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.bic)
    }

    /// Get the innovation variance.
    pub fn sigma2(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sigma2)
    }

    /// Get the non-seasonal AR coefficients.
    pub fn ar_coefficients(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.coefs.ar.as_slice())
    }

    /// Get the non-seasonal MA coefficients.
    pub fn ma_coefficients(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.coefs.ma.as_slice())
    }

    /// Get the estimated mean (undifferenced models only).
    pub fn mean(&self) -> Option<f64> {
        self.state.as_ref().and_then(|s| s.coefs.mean)
    }

    /// Whether the optimizer met its tolerance before the iteration budget ran out.
    pub fn converged(&self) -> Option<bool> {
        self.state.as_ref().map(|s| s.converged)
    }

    fn state(&self) -> Result<&FittedState> {
        self.state.as_ref().ok_or(ForecastError::FitRequired)
    }

    /// Minimise the CSS over admissible coefficients.
    fn estimate(&self, w: &[f64]) -> Result<(Coefficients, usize, bool)> {
        let spec = self.spec;
        let period = spec.period();

        let mut initial = vec![0.0; spec.num_coefficients()];
        if spec.has_mean() {
            initial[0] = mean(w);
        }
        if initial.is_empty() {
            return Ok((Coefficients::default(), 0, true));
        }

        let css = |params: &[f64]| {
            let coefs = Coefficients::from_vector(&spec, params);
            if !coefs.is_admissible() {
                return f64::INFINITY;
            }
            let (ar, ma) = coefs.arma_polynomials(period);
            let e = css_residuals(w, &ar, &ma, coefs.mean.unwrap_or(0.0));
            e.iter().map(|r| r * r).sum::<f64>()
        };

        // Relative tolerance: the objective is scaled by its starting value.
        let scale = match css(&initial) {
            s if s.is_finite() && s > 0.0 => s,
            _ => 1.0,
        };

        let result = nelder_mead(
            |params| css(params) / scale,
            &initial,
            None,
            NelderMeadConfig::default(),
        );

        if !result.optimal_value.is_finite() {
            return Err(ForecastError::ComputationError(
                "no stationary and invertible parameters found".to_string(),
            ));
        }

        Ok((
            Coefficients::from_vector(&spec, &result.optimal_point),
            result.iterations,
            result.converged,
        ))
    }
}

impl Forecaster for SARIMA {
    fn fit(&mut self, series: &TimeSeries) -> Result<()> {
        if !self.spec.is_valid() {
            return Err(ForecastError::InvalidParameter(
                "seasonal period must be at least 2".to_string(),
            ));
        }
        if series.has_missing_values() {
            return Err(ForecastError::MissingValues);
        }
        let values = series.values();

        let seasonal = self.spec.seasonal_or_zero();
        let period = seasonal.period;
        let loss = differencing_loss(self.spec.order.d, seasonal.d, period);
        let burn_in = self.spec.order.p + seasonal.p * period;
        let needed = loss + burn_in + self.spec.num_coefficients() + 2;

        if values.len() < needed {
            return Err(ForecastError::InsufficientData {
                needed,
                got: values.len(),
            });
        }

        let w = full_difference(values, self.spec.order.d, seasonal.d, period);
        let (coefs, iterations, converged) = self.estimate(&w)?;
        let (ar, ma) = coefs.arma_polynomials(period);
        let e = css_residuals(&w, &ar, &ma, coefs.mean.unwrap_or(0.0));

        let n_eff = w.len();
        let css: f64 = e.iter().map(|r| r * r).sum();
        let sigma2 = css / n_eff as f64;
        // Zero variance is accepted only for models without ARMA terms.
        let exact = sigma2 == 0.0 && self.spec.arma_terms() == 0;
        if !(sigma2.is_finite() && (sigma2 > 0.0 || exact)) {
            return Err(ForecastError::ComputationError(format!(
                "residual variance is {sigma2}"
            )));
        }

        let n = n_eff as f64;
        let k = (self.spec.num_coefficients() + 1) as f64;
        let log_likelihood = if exact {
            f64::INFINITY
        } else {
            -0.5 * n * ((2.0 * PI * sigma2).ln() + 1.0)
        };

        let mut residuals = vec![0.0; values.len()];
        residuals[loss..].copy_from_slice(&e);
        let fitted = values
            .iter()
            .zip(&residuals)
            .map(|(y, r)| y - r)
            .collect();

        let integrated_ar = poly_mul(
            &ar,
            &differencing_polynomial(self.spec.order.d, seasonal.d, period),
        );

        self.state = Some(FittedState {
            coefs,
            integrated_ar,
            ma,
            sigma2,
            log_likelihood,
            aic: -2.0 * log_likelihood + 2.0 * k,
            bic: -2.0 * log_likelihood + k * n.ln(),
            n_eff,
            burn_in: loss + burn_in,
            history: values.to_vec(),
            residuals,
            fitted,
            iterations,
            converged,
        });

        Ok(())
    }

    fn predict(&self, horizon: usize) -> Result<Forecast> {
        let state = self.state()?;
        let mean = state.coefs.mean.unwrap_or(0.0);
        let ar = &state.integrated_ar;
        let ma = &state.ma;

        let n = state.history.len();
        let mut x: Vec<f64> = state.history.iter().map(|y| y - mean).collect();
        let mut e = state.residuals.clone();

        for _ in 0..horizon {
            let t = x.len();
            let mut pred = 0.0;
            for k in 1..ar.len() {
                pred -= ar[k] * x[t - k];
            }
            for k in 1..ma.len().min(t + 1) {
                pred += ma[k] * e[t - k];
            }
            x.push(pred);
            // Future innovations have zero expectation.
            e.push(0.0);
        }

        Ok(Forecast::from_values(
            x[n..].iter().map(|v| v + mean).collect(),
        ))
    }

    fn predict_with_intervals(&self, horizon: usize, level: f64) -> Result<Forecast> {
        if !(level > 0.0 && level < 1.0) {
            return Err(ForecastError::InvalidParameter(format!(
                "confidence level must be in (0, 1), got {level}"
            )));
        }
        let state = self.state()?;
        let point = self.predict(horizon)?.point().to_vec();

        let z = quantile_normal((1.0 + level) / 2.0);
        let psi = psi_weights(&state.integrated_ar, &state.ma, horizon);

        let mut lower = Vec::with_capacity(horizon);
        let mut upper = Vec::with_capacity(horizon);
        let mut cumulative = 0.0;
        for (value, weight) in point.iter().zip(&psi) {
            cumulative += weight * weight;
            let half_width = z * (state.sigma2 * cumulative).sqrt();
            lower.push(value - half_width);
            upper.push(value + half_width);
        }

        Forecast::from_values_with_intervals(point, lower, upper, level)
    }

    fn fitted_values(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    fn residuals(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.residuals.as_slice())
    }

    fn name(&self) -> &str {
        if self.spec.seasonal.is_some() {
            "SARIMA"
        } else {
            "ARIMA"
        }
    }
}

impl FittedArima for SARIMA {
    fn order(&self) -> OrderSpec {
        self.spec
    }

    fn summary(&self) -> Result<ModelSummary> {
        let state = self.state()?;
        Ok(ModelSummary {
            order: self.spec,
            nobs: state.history.len(),
            n_effective: state.n_eff,
            log_likelihood: state.log_likelihood,
            aic: state.aic,
            bic: state.bic,
            sigma2: state.sigma2,
            mean: state.coefs.mean,
            ar: state.coefs.ar.clone(),
            ma: state.coefs.ma.clone(),
            seasonal_ar: state.coefs.seasonal_ar.clone(),
            seasonal_ma: state.coefs.seasonal_ma.clone(),
            iterations: state.iterations,
            converged: state.converged,
            ljung_box: ljung_box(
                &state.residuals[state.burn_in..],
                None,
                self.spec.arma_terms(),
            ),
        })
    }
}
