//! Lag-polynomial algebra for seasonal ARIMA models.
//!
//! Polynomials are stored by ascending power of the backshift operator `B`,
//! so `[1.0, -0.5]` is `1 - 0.5B`.

/// Multiply two lag polynomials.
pub fn poly_mul(a: &[f64], b: &[f64]) -> Vec<f64> {
    if a.is_empty() || b.is_empty() {
        return Vec::new();
    }
    let mut out = vec![0.0; a.len() + b.len() - 1];
    for (i, x) in a.iter().enumerate() {
        if *x == 0.0 {
            continue;
        }
        for (j, y) in b.iter().enumerate() {
            out[i + j] += x * y;
        }
    }
    out
}

/// `1 - φ_1 B^s - φ_2 B^2s - ...` for autoregressive coefficients at stride `s`.
pub fn ar_polynomial(coefs: &[f64], stride: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * stride + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * stride] = -c;
    }
    poly
}

/// `1 + θ_1 B^s + θ_2 B^2s + ...` for moving-average coefficients at stride `s`.
pub fn ma_polynomial(coefs: &[f64], stride: usize) -> Vec<f64> {
    let mut poly = vec![0.0; coefs.len() * stride + 1];
    poly[0] = 1.0;
    for (i, c) in coefs.iter().enumerate() {
        poly[(i + 1) * stride] = *c;
    }
    poly
}

/// `(1 - B)^d (1 - B^period)^seasonal_d`.
pub fn differencing_polynomial(d: usize, seasonal_d: usize, period: usize) -> Vec<f64> {
    let mut poly = vec![1.0];
    for _ in 0..d {
        poly = poly_mul(&poly, &[1.0, -1.0]);
    }
    for _ in 0..seasonal_d {
        poly = poly_mul(&poly, &ar_polynomial(&[1.0], period));
    }
    poly
}

/// Whether `1 - φ_1 z - ... - φ_p z^p` has every root outside the unit circle.
///
/// Runs the Durbin-Levinson recursion backwards: the polynomial is stationary
/// iff every partial autocorrelation it implies lies strictly inside (-1, 1).
pub fn is_stationary(phi: &[f64]) -> bool {
    if phi.iter().any(|c| !c.is_finite()) {
        return false;
    }
    let mut a = phi.to_vec();
    while let Some(&k) = a.last() {
        if k.abs() >= 1.0 - 1e-8 {
            return false;
        }
        let m = a.len() - 1;
        let denom = 1.0 - k * k;
        a = (0..m).map(|i| (a[i] + k * a[m - 1 - i]) / denom).collect();
    }
    true
}

/// Whether `1 + θ_1 z + ... + θ_q z^q` has every root outside the unit circle.
pub fn is_invertible(theta: &[f64]) -> bool {
    let negated: Vec<f64> = theta.iter().map(|c| -c).collect();
    is_stationary(&negated)
}

/// First `n` ψ-weights of `ma(B) / ar(B)`, where `ar[0] == 1`.
pub fn psi_weights(ar: &[f64], ma: &[f64], n: usize) -> Vec<f64> {
    let mut psi = Vec::with_capacity(n);
    for j in 0..n {
        let mut value = ma.get(j).copied().unwrap_or(0.0);
        for k in 1..=j.min(ar.len().saturating_sub(1)) {
            value -= ar[k] * psi[j - k];
        }
        psi.push(value);
    }
    psi
}
