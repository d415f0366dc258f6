//! # sarima-forecast
//!
//! Automatic ARIMA/SARIMA forecasting of a single univariate series.
//!
//! A [`Pipeline`](pipeline::Pipeline) run takes raw `{date, value}` rows and
//! produces a [`ResultRecord`](pipeline::ResultRecord): the selected order,
//! the full-data fit summary, holdout accuracy metrics, and a forecast with
//! confidence intervals on an extended time index.
//!
//! ```no_run
//! use sarima_forecast::prelude::*;
//!
//! let rows: Vec<RawRow> = (0..36)
//!     .map(|i| RawRow::new(format!("{}-{:02}", 2021 + i / 12, i % 12 + 1), i as f64))
//!     .collect();
//! let input = PipelineInput::new(rows, 0.8, 12).with_seasonality(12);
//! let record = Pipeline::default().run(&input)?;
//! println!("{}", record.summary);
//! # Ok::<(), ForecastError>(())
//! ```

#![allow(clippy::upper_case_acronyms)]
#![allow(clippy::needless_range_loop)]

pub mod core;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod utils;
pub mod validation;

pub use error::{ForecastError, Result};

pub mod prelude {
    pub use crate::core::{Forecast, Frequency, TimeSeries};
    pub use crate::error::{ForecastError, Result};
    pub use crate::models::arima::{AutoARIMAConfig, OrderSpec, SARIMA};
    pub use crate::models::{ArimaBackend, FittedArima, Forecaster};
    pub use crate::pipeline::{
        Milestone, Pipeline, PipelineConfig, PipelineInput, ProgressObserver, RawRow, RawValue,
        ResultRecord, Silent,
    };
    pub use crate::utils::{evaluate, quantile_normal, EvaluationMetrics};
}
