//! Residual diagnostics for fitted models.

use serde::Serialize;
use statrs::distribution::{ChiSquared, ContinuousCDF};

/// Ljung-Box test result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LjungBoxResult {
    /// Test statistic Q
    pub statistic: f64,
    /// P-value from the chi-squared distribution
    pub p_value: f64,
    /// Number of lags tested
    pub lags: usize,
    /// Degrees of freedom
    pub df: usize,
}

impl LjungBoxResult {
    /// True when the white-noise null is not rejected at `alpha`.
    pub fn is_white_noise(&self, alpha: f64) -> bool {
        self.p_value > alpha
    }
}

/// Ljung-Box portmanteau test for autocorrelation in residuals.
///
/// # Arguments
/// * `residuals` - Model residuals
/// * `lags` - Number of lags to include (default: min(10, n/5))
/// * `fitted_params` - ARMA parameters estimated, subtracted from the degrees of freedom
pub fn ljung_box(residuals: &[f64], lags: Option<usize>, fitted_params: usize) -> LjungBoxResult {
    let n = residuals.len();

    if n < 3 {
        return LjungBoxResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            df: 0,
        };
    }

    let lags = lags.unwrap_or_else(|| 10.min(n / 5)).clamp(1, n - 1);
    let df = lags.saturating_sub(fitted_params).max(1);

    let mean = residuals.iter().sum::<f64>() / n as f64;
    let centered: Vec<f64> = residuals.iter().map(|x| x - mean).collect();
    let denom: f64 = centered.iter().map(|x| x * x).sum();

    if denom == 0.0 {
        return LjungBoxResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            df,
        };
    }

    let q = (1..=lags)
        .map(|k| {
            let acf: f64 = centered
                .iter()
                .skip(k)
                .zip(&centered)
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / denom;
            acf * acf / (n - k) as f64
        })
        .sum::<f64>()
        * (n * (n + 2)) as f64;

    let p_value = match ChiSquared::new(df as f64) {
        Ok(dist) => 1.0 - dist.cdf(q),
        Err(_) => f64::NAN,
    };

    LjungBoxResult {
        statistic: q,
        p_value,
        lags,
        df,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alternating_residuals_are_autocorrelated() {
        let residuals: Vec<f64> = (0..60).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }).collect();
        let result = ljung_box(&residuals, Some(5), 0);
        assert!(result.statistic > 50.0);
        assert!(!result.is_white_noise(0.05));
    }

    fn lcg_noise(n: usize) -> Vec<f64> {
        let mut state: u64 = 42;
        (0..n)
            .map(|_| {
                state = state
                    .wrapping_mul(6364136223846793005)
                    .wrapping_add(1442695040888963407);
                (state >> 33) as f64 / (1u64 << 31) as f64 - 0.5
            })
            .collect()
    }

    #[test]
    fn pseudo_noise_passes() {
        let residuals = lcg_noise(200);
        let result = ljung_box(&residuals, None, 0);
        assert_eq!(result.lags, 10);
        assert!(result.is_white_noise(0.01), "p = {}", result.p_value);
    }

    #[test]
    fn degrees_of_freedom_account_for_parameters() {
        let residuals: Vec<f64> = (0..50).map(|i| (i as f64).sin()).collect();
        assert_eq!(ljung_box(&residuals, Some(10), 3).df, 7);
        assert_eq!(ljung_box(&residuals, Some(2), 5).df, 1);
    }

    #[test]
    fn degenerate_inputs() {
        assert!(ljung_box(&[1.0, 2.0], None, 0).statistic.is_nan());
        let flat = ljung_box(&[0.0; 20], None, 0);
        assert_eq!(flat.statistic, 0.0);
        assert_eq!(flat.p_value, 1.0);
    }
}
