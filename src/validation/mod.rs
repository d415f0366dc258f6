//! Statistical tests that guide model identification and diagnostics.

pub mod residual_tests;
pub mod stationarity;

pub use residual_tests::{ljung_box, LjungBoxResult};
pub use stationarity::{kpss_test, seasonal_differencing_order, StationarityResult};
