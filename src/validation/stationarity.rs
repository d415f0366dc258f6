//! Stationarity tests used to choose differencing orders.

use crate::utils::stats::mean;

/// Result of a stationarity test.
#[derive(Debug, Clone)]
pub struct StationarityResult {
    /// Test statistic
    pub statistic: f64,
    /// P-value (approximate, interpolated from the critical value table)
    pub p_value: f64,
    /// Number of lags used for the long-run variance
    pub lags: usize,
    /// Whether series appears stationary at the requested significance
    pub is_stationary: bool,
}

/// KPSS critical values for level stationarity (Kwiatkowski et al., 1992).
const KPSS_TABLE: [(f64, f64); 4] = [(0.10, 0.347), (0.05, 0.463), (0.025, 0.574), (0.01, 0.739)];

/// KPSS test for level stationarity.
///
/// The null hypothesis is stationarity, so a large statistic (small p-value)
/// means the series needs differencing.
///
/// # Arguments
/// * `series` - Time series data
/// * `lags` - Lags for the Bartlett long-run variance (default: ⌊4·(n/100)^¼⌋)
/// * `alpha` - Significance level used for `is_stationary`
pub fn kpss_test(series: &[f64], lags: Option<usize>, alpha: f64) -> StationarityResult {
    let n = series.len();

    if n < 4 {
        // Too short to reject anything.
        return StationarityResult {
            statistic: f64::NAN,
            p_value: f64::NAN,
            lags: 0,
            is_stationary: true,
        };
    }

    let lags = lags
        .unwrap_or_else(|| (4.0 * (n as f64 / 100.0).powf(0.25)).floor() as usize)
        .clamp(1, n / 2);

    let level = mean(series);
    let residuals: Vec<f64> = series.iter().map(|&x| x - level).collect();

    let mut partial = 0.0;
    let eta: f64 = residuals
        .iter()
        .map(|r| {
            partial += r;
            partial * partial
        })
        .sum::<f64>()
        / (n * n) as f64;

    let mut long_run = residuals.iter().map(|r| r * r).sum::<f64>() / n as f64;
    for j in 1..=lags {
        let weight = 1.0 - j as f64 / (lags + 1) as f64;
        let autocov = residuals
            .iter()
            .skip(j)
            .zip(&residuals)
            .map(|(a, b)| a * b)
            .sum::<f64>()
            / n as f64;
        long_run += 2.0 * weight * autocov;
    }

    if long_run <= f64::EPSILON {
        // Constant series.
        return StationarityResult {
            statistic: 0.0,
            p_value: 1.0,
            lags,
            is_stationary: true,
        };
    }

    let statistic = eta / long_run;
    let p_value = kpss_p_value(statistic);

    StationarityResult {
        statistic,
        p_value,
        lags,
        is_stationary: p_value >= alpha,
    }
}

/// Interpolate the p-value from the critical value table, clipped to [0.01, 0.10].
fn kpss_p_value(stat: f64) -> f64 {
    let (first_p, first_cv) = KPSS_TABLE[0];
    if stat <= first_cv {
        return first_p;
    }
    for pair in KPSS_TABLE.windows(2) {
        let (p_hi, cv_lo) = pair[0];
        let (p_lo, cv_hi) = pair[1];
        if stat <= cv_hi {
            let t = (stat - cv_lo) / (cv_hi - cv_lo);
            return p_hi + t * (p_lo - p_hi);
        }
    }
    KPSS_TABLE[KPSS_TABLE.len() - 1].0
}

/// Strength-of-seasonality heuristic for seasonal differencing.
///
/// Returns 1 when lag-`period` differencing shrinks the variance below 70%
/// of the original; requires at least two full cycles.
pub fn seasonal_differencing_order(values: &[f64], period: usize) -> usize {
    if period < 2 || values.len() < 2 * period {
        return 0;
    }

    let population_variance = |xs: &[f64]| {
        let m = mean(xs);
        xs.iter().map(|v| (v - m).powi(2)).sum::<f64>() / xs.len() as f64
    };

    let seasonal_diffs: Vec<f64> = (period..values.len())
        .map(|i| values[i] - values[i - period])
        .collect();

    if population_variance(&seasonal_diffs) < 0.7 * population_variance(values) {
        1
    } else {
        0
    }
}
