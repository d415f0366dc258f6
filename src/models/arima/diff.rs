//! Differencing utilities for ARIMA models.

/// Apply differencing to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Differencing order (number of times to difference)
///
/// # Returns
/// The differenced series, `d` values shorter than the input (empty when
/// the series is too short).
pub fn difference(series: &[f64], d: usize) -> Vec<f64> {
    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= 1 {
            return Vec::new();
        }
        result = result.windows(2).map(|w| w[1] - w[0]).collect();
    }
    result
}

/// Apply seasonal differencing `(1 - B^period)^d` to a time series.
///
/// # Arguments
/// * `series` - The input series
/// * `d` - Seasonal differencing order
/// * `period` - Seasonal period
///
/// # Returns
/// The seasonally differenced series, `d * period` values shorter than the
/// input (empty when the series is too short).
pub fn seasonal_difference(series: &[f64], d: usize, period: usize) -> Vec<f64> {
    if d == 0 || period == 0 {
        return series.to_vec();
    }

    let mut result = series.to_vec();
    for _ in 0..d {
        if result.len() <= period {
            return Vec::new();
        }
        result = result
            .iter()
            .skip(period)
            .zip(result.iter())
            .map(|(curr, prev)| curr - prev)
            .collect();
    }
    result
}

/// Apply `(1 - B)^d (1 - B^period)^seasonal_d` in one pass.
pub fn full_difference(series: &[f64], d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    seasonal_difference(&difference(series, d), seasonal_d, period)
}

/// Number of leading observations consumed by differencing.
pub fn differencing_loss(d: usize, seasonal_d: usize, period: usize) -> usize {
    d + seasonal_d * period
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difference_order_0() {
        let series = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(difference(&series, 0), series);
    }

    #[test]
    fn difference_order_1() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        assert_eq!(difference(&series, 1), vec![2.0, 3.0, 4.0, 5.0]);
    }

    #[test]
    fn difference_order_2() {
        let series = vec![1.0, 3.0, 6.0, 10.0, 15.0];
        // [2, 3, 4, 5] -> [1, 1, 1]
        assert_eq!(difference(&series, 2), vec![1.0, 1.0, 1.0]);
    }

    #[test]
    fn difference_too_short() {
        assert!(difference(&[1.0], 1).is_empty());
        assert!(difference(&[1.0, 2.0], 2).is_empty());
        assert!(difference(&[], 1).is_empty());
    }

    #[test]
    fn seasonal_difference_basic() {
        // Quarterly data: each quarter rises by 10 year over year
        let series = vec![
            100.0, 120.0, 80.0, 90.0, // Year 1
            110.0, 130.0, 90.0, 100.0, // Year 2
        ];
        assert_eq!(
            seasonal_difference(&series, 1, 4),
            vec![10.0, 10.0, 10.0, 10.0]
        );
    }

    #[test]
    fn seasonal_difference_order_0_and_short() {
        let series = vec![1.0, 2.0, 3.0, 4.0];
        assert_eq!(seasonal_difference(&series, 0, 2), series);
        assert!(seasonal_difference(&series, 1, 4).is_empty());
    }

    #[test]
    fn full_difference_combines_both() {
        // Linear trend plus period-3 pattern vanishes under (1-B)(1-B^3)
        let series: Vec<f64> = (0..12)
            .map(|i| 2.0 * i as f64 + [5.0, -1.0, 3.0][i % 3])
            .collect();
        let result = full_difference(&series, 1, 1, 3);
        assert_eq!(result.len(), 12 - differencing_loss(1, 1, 3));
        assert!(result.iter().all(|v| v.abs() < 1e-12));
    }
}
