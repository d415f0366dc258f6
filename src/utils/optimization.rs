//! Derivative-free optimization used for parameter estimation.

use std::cmp::Ordering;

/// Result of Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadResult {
    /// The optimal point found.
    pub optimal_point: Vec<f64>,
    /// The objective function value at the optimal point.
    pub optimal_value: f64,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the simplex collapsed below the tolerance.
    pub converged: bool,
}

/// Configuration for Nelder-Mead optimization.
#[derive(Debug, Clone)]
pub struct NelderMeadConfig {
    /// Maximum number of iterations.
    pub max_iter: usize,
    /// Convergence tolerance on the spread of objective values.
    pub tolerance: f64,
    /// Reflection coefficient.
    pub alpha: f64,
    /// Expansion coefficient.
    pub gamma: f64,
    /// Contraction coefficient.
    pub rho: f64,
    /// Shrinkage coefficient.
    pub sigma: f64,
    /// Initial simplex step size.
    pub initial_step: f64,
}

impl Default for NelderMeadConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-8,
            alpha: 1.0,
            gamma: 2.0,
            rho: 0.5,
            sigma: 0.5,
            initial_step: 0.1,
        }
    }
}

/// Minimise `objective` starting from `initial` with the Nelder-Mead simplex method.
///
/// Points are clamped into `bounds` (one `(min, max)` pair per dimension)
/// before every evaluation. Non-finite objective values are treated as
/// `+inf`, so callers may reject infeasible points by returning `f64::INFINITY`.
///
/// # Example
/// ```
/// use sarima_forecast::utils::optimization::{nelder_mead, NelderMeadConfig};
///
/// let result = nelder_mead(
///     |x| (x[0] - 2.0).powi(2) + (x[1] + 1.0).powi(2),
///     &[0.0, 0.0],
///     None,
///     NelderMeadConfig::default(),
/// );
///
/// assert!((result.optimal_point[0] - 2.0).abs() < 1e-3);
/// assert!((result.optimal_point[1] + 1.0).abs() < 1e-3);
/// ```
pub fn nelder_mead<F>(
    objective: F,
    initial: &[f64],
    bounds: Option<&[(f64, f64)]>,
    config: NelderMeadConfig,
) -> NelderMeadResult
where
    F: Fn(&[f64]) -> f64,
{
    let n = initial.len();
    let eval = |x: &[f64]| {
        let v = objective(x);
        if v.is_nan() {
            f64::INFINITY
        } else {
            v
        }
    };

    if n == 0 {
        return NelderMeadResult {
            optimal_point: vec![],
            optimal_value: eval(&[]),
            iterations: 0,
            converged: true,
        };
    }

    let start = clamp(initial.to_vec(), bounds);
    let mut simplex: Vec<(Vec<f64>, f64)> = Vec::with_capacity(n + 1);
    simplex.push((start.clone(), eval(&start)));
    for i in 0..n {
        let mut vertex = start.clone();
        vertex[i] += if vertex[i].abs() > 1e-8 {
            config.initial_step * vertex[i].abs()
        } else {
            config.initial_step
        };
        let vertex = clamp(vertex, bounds);
        let value = eval(&vertex);
        simplex.push((vertex, value));
    }

    let mut iterations = 0;
    let mut converged = false;

    while iterations < config.max_iter {
        iterations += 1;
        simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));

        let best = simplex[0].1;
        let worst = simplex[n].1;
        let second_worst = simplex[n - 1].1;

        if best.is_finite() && worst.is_finite() && (worst - best).abs() <= config.tolerance {
            converged = true;
            break;
        }

        let centroid: Vec<f64> = (0..n)
            .map(|j| simplex[..n].iter().map(|(v, _)| v[j]).sum::<f64>() / n as f64)
            .collect();

        let towards = |coef: f64, from: &[f64]| -> Vec<f64> {
            let point = centroid
                .iter()
                .zip(from)
                .map(|(c, x)| c + coef * (x - c))
                .collect();
            clamp(point, bounds)
        };

        let reflected = towards(-config.alpha, &simplex[n].0);
        let reflected_value = eval(&reflected);

        if reflected_value < best {
            let expanded = towards(config.gamma, &reflected);
            let expanded_value = eval(&expanded);
            simplex[n] = if expanded_value < reflected_value {
                (expanded, expanded_value)
            } else {
                (reflected, reflected_value)
            };
            continue;
        }

        if reflected_value < second_worst {
            simplex[n] = (reflected, reflected_value);
            continue;
        }

        let (contracted, contracted_value) = if reflected_value < worst {
            let outside = towards(config.rho, &reflected);
            let value = eval(&outside);
            (outside, value)
        } else {
            let inside = towards(config.rho, &simplex[n].0);
            let value = eval(&inside);
            (inside, value)
        };

        if contracted_value < worst.min(reflected_value) {
            simplex[n] = (contracted, contracted_value);
            continue;
        }

        let anchor = simplex[0].0.clone();
        for (vertex, value) in simplex.iter_mut().skip(1) {
            let shrunk = anchor
                .iter()
                .zip(vertex.iter())
                .map(|(a, x)| a + config.sigma * (x - a))
                .collect();
            *vertex = clamp(shrunk, bounds);
            *value = eval(vertex);
        }
    }

    simplex.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let (optimal_point, optimal_value) = simplex.swap_remove(0);

    NelderMeadResult {
        optimal_point,
        optimal_value,
        iterations,
        converged,
    }
}

fn clamp(mut point: Vec<f64>, bounds: Option<&[(f64, f64)]>) -> Vec<f64> {
    if let Some(bounds) = bounds {
        for (x, &(lo, hi)) in point.iter_mut().zip(bounds) {
            *x = x.clamp(lo, hi);
        }
    }
    point
}
