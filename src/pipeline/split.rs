//! Chronological train/holdout split.

use serde::Serialize;

use crate::core::TimeSeries;
use crate::error::{ForecastError, Result};

/// A contiguous training prefix and the holdout suffix that follows it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SplitResult {
    pub train: TimeSeries,
    pub test: TimeSeries,
}

/// Index at which `len` observations are cut for `ratio`.
///
/// `floor(len * ratio)` clamped to `[1, len]`, so the training part is
/// never empty while the holdout may be.
pub fn split_index(len: usize, ratio: f64) -> usize {
    ((len as f64 * ratio).floor() as usize).clamp(1, len.max(1))
}

/// Split `series` positionally; no shuffling, no look-ahead.
pub fn split(series: &TimeSeries, ratio: f64) -> Result<SplitResult> {
    if !(ratio > 0.0 && ratio <= 1.0) {
        return Err(ForecastError::InvalidParameter(format!(
            "train ratio must be in (0, 1], got {ratio}"
        )));
    }
    if series.is_empty() {
        return Err(ForecastError::EmptySeries);
    }

    let cut = split_index(series.len(), ratio);
    Ok(SplitResult {
        train: series.slice(0, cut)?,
        test: series.slice(cut, series.len())?,
    })
}
