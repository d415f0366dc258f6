//! ARIMA and SARIMA (Autoregressive Integrated Moving Average) models.
//!
//! This module provides:
//! - SARIMA models with optional seasonal components (P, D, Q)\[m\]
//! - AutoARIMA for automatic order selection
//! - [`AutoArimaBackend`], the default fitting capability of the pipeline

mod auto_arima;
mod diff;
mod model;
mod order;
mod polynomial;

pub use auto_arima::{ndiffs, AutoARIMA, AutoARIMAConfig, AutoArimaBackend, InformationCriterion};
pub use diff::{difference, full_difference, seasonal_difference};
pub use model::{ModelSummary, SARIMA};
pub use order::{ArimaOrder, OrderSpec, SeasonalOrder};
pub use polynomial::{is_invertible, is_stationary};
