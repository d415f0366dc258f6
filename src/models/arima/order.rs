//! Order tuples for ARIMA and seasonal ARIMA models.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Non-seasonal order `(p, d, q)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArimaOrder {
    /// AR order (p)
    pub p: usize,
    /// Differencing order (d)
    pub d: usize,
    /// MA order (q)
    pub q: usize,
}

impl ArimaOrder {
    /// Create a new non-seasonal order.
    pub fn new(p: usize, d: usize, q: usize) -> Self {
        Self { p, d, q }
    }
}

/// Seasonal order `(P, D, Q, m)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeasonalOrder {
    /// Seasonal AR order (P)
    pub p: usize,
    /// Seasonal differencing order (D)
    pub d: usize,
    /// Seasonal MA order (Q)
    pub q: usize,
    /// Periods per seasonal cycle (m)
    pub period: usize,
}

impl SeasonalOrder {
    /// Create a new seasonal order.
    pub fn new(p: usize, d: usize, q: usize, period: usize) -> Self {
        Self { p, d, q, period }
    }
}

/// Full model order: `(p, d, q)` plus an optional `(P, D, Q, m)`.
///
/// The seasonal part is present exactly when seasonal modelling was
/// requested, even if every seasonal term is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderSpec {
    pub order: ArimaOrder,
    pub seasonal: Option<SeasonalOrder>,
}

impl OrderSpec {
    /// Non-seasonal ARIMA(p, d, q).
    pub fn arima(p: usize, d: usize, q: usize) -> Self {
        Self {
            order: ArimaOrder::new(p, d, q),
            seasonal: None,
        }
    }

    /// Seasonal ARIMA(p, d, q)(P, D, Q)\[m\].
    pub fn sarima(order: ArimaOrder, seasonal: SeasonalOrder) -> Self {
        Self {
            order,
            seasonal: Some(seasonal),
        }
    }

    /// Seasonal period, or 0 when non-seasonal.
    pub fn period(&self) -> usize {
        self.seasonal.map_or(0, |s| s.period)
    }

    /// Seasonal part, with all-zero orders standing in for `None`.
    pub(crate) fn seasonal_or_zero(&self) -> SeasonalOrder {
        self.seasonal.unwrap_or(SeasonalOrder::new(0, 0, 0, 0))
    }

    /// Total differencing `d + D` (not weighted by the period).
    pub fn total_differencing(&self) -> usize {
        self.order.d + self.seasonal.map_or(0, |s| s.d)
    }

    /// Sum of the ARMA orders `p + q + P + Q`.
    pub fn arma_terms(&self) -> usize {
        let s = self.seasonal_or_zero();
        self.order.p + self.order.q + s.p + s.q
    }

    /// Whether a mean term is estimated (only for undifferenced models).
    pub fn has_mean(&self) -> bool {
        self.total_differencing() == 0
    }

    /// Number of estimated coefficients, excluding the innovation variance.
    pub fn num_coefficients(&self) -> usize {
        self.arma_terms() + usize::from(self.has_mean())
    }

    /// Validate the seasonal period.
    pub fn is_valid(&self) -> bool {
        self.seasonal.map_or(true, |s| s.period >= 2)
    }
}

impl fmt::Display for OrderSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ArimaOrder { p, d, q } = self.order;
        match self.seasonal {
            Some(s) => write!(
                f,
                "SARIMA({p},{d},{q})({},{},{})[{}]",
                s.p, s.d, s.q, s.period
            ),
            None => write!(f, "ARIMA({p},{d},{q})"),
        }
    }
}
