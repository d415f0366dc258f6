//! Sampling frequency inference and future timestamp generation.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc, Weekday};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Sampling interval of a time series index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frequency {
    /// A fixed wall-clock spacing.
    Fixed(Duration),
    /// Calendar-month spacing (monthly, quarterly, yearly, ...).
    ///
    /// With `month_end` every timestamp sits on the last day of its month;
    /// otherwise the day of month and time of day are carried over from the
    /// last observation.
    Months { step: u32, month_end: bool },
    /// Monday to Friday, skipping weekends.
    BusinessDays,
}

impl Frequency {
    /// One calendar day, the fallback when nothing else can be inferred.
    pub fn daily() -> Self {
        Frequency::Fixed(Duration::days(1))
    }

    /// Infer the dominant spacing of a strictly increasing index.
    ///
    /// Calendar-month patterns are recognised first, because month lengths
    /// vary and would otherwise split the modal spacing. A weekday-only index
    /// whose steps mostly move to the next business day (crossing at least
    /// one weekend) is business-daily. Otherwise the most common spacing wins
    /// when its share of all spacings strictly exceeds `tolerance`.
    pub fn infer(timestamps: &[DateTime<Utc>], tolerance: f64) -> Result<Frequency> {
        if !(0.0..1.0).contains(&tolerance) {
            return Err(ForecastError::InvalidParameter(format!(
                "frequency tolerance must be in [0, 1), got {tolerance}"
            )));
        }
        if timestamps.len() < 2 {
            return Err(ForecastError::InsufficientData {
                needed: 2,
                got: timestamps.len(),
            });
        }

        if let Some(freq) = infer_calendar_months(timestamps) {
            return Ok(freq);
        }
        if let Some(freq) = infer_business_days(timestamps, tolerance) {
            return Ok(freq);
        }

        let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
        for w in timestamps.windows(2) {
            *counts.entry((w[1] - w[0]).num_seconds()).or_insert(0) += 1;
        }

        // Smallest spacing wins ties, so the result never depends on map order.
        let (modal_diff, modal_count) = counts
            .iter()
            .fold(None, |best: Option<(i64, usize)>, (&diff, &count)| match best {
                Some((_, c)) if c >= count => best,
                _ => Some((diff, count)),
            })
            .ok_or_else(|| ForecastError::FrequencyInference("empty spacing data".to_string()))?;

        let total = timestamps.len() - 1;
        let modal_ratio = modal_count as f64 / total as f64;
        if modal_ratio <= tolerance || modal_diff <= 0 {
            return Err(ForecastError::FrequencyInference(format!(
                "no dominant spacing (modal share {modal_ratio:.2})"
            )));
        }

        Ok(Frequency::Fixed(Duration::seconds(modal_diff)))
    }

    /// Like [`Frequency::infer`], falling back to daily spacing.
    pub fn infer_or_daily(timestamps: &[DateTime<Utc>], tolerance: f64) -> Frequency {
        match Self::infer(timestamps, tolerance) {
            Ok(freq) => freq,
            Err(err) => {
                tracing::debug!(error = %err, "frequency inference failed, using daily spacing");
                Self::daily()
            }
        }
    }

    /// Generate `horizon` timestamps strictly after `last`, in ascending order.
    ///
    /// Every step is measured from `last`, so month clamping never drifts.
    pub fn future_timestamps(
        &self,
        last: DateTime<Utc>,
        horizon: usize,
    ) -> Result<Vec<DateTime<Utc>>> {
        (1..=horizon).map(|i| self.step_from(last, i)).collect()
    }

    fn step_from(&self, last: DateTime<Utc>, steps: usize) -> Result<DateTime<Utc>> {
        let overflow = || {
            ForecastError::TimestampError(format!(
                "timestamp {steps} steps after {last} is out of range"
            ))
        };

        match *self {
            Frequency::Fixed(spacing) => {
                let offset = spacing
                    .num_seconds()
                    .checked_mul(steps as i64)
                    .and_then(Duration::try_seconds)
                    .ok_or_else(overflow)?;
                last.checked_add_signed(offset).ok_or_else(overflow)
            }
            Frequency::Months { step, month_end } => {
                let months = u32::try_from(steps)
                    .ok()
                    .and_then(|s| s.checked_mul(step))
                    .ok_or_else(overflow)?;
                let shifted = last
                    .checked_add_months(Months::new(months))
                    .ok_or_else(overflow)?;
                if !month_end {
                    return Ok(shifted);
                }
                let end = last_day_of_month(shifted.date_naive()).ok_or_else(overflow)?;
                Ok(end.and_time(shifted.time()).and_utc())
            }
            Frequency::BusinessDays => {
                // A weekend anchor counts from the Friday before it.
                let weekday = i64::from(last.weekday().num_days_from_monday());
                let total = i64::try_from(steps)
                    .ok()
                    .and_then(|s| s.checked_add(weekday.min(4)))
                    .ok_or_else(overflow)?;
                let offset = (total / 5)
                    .checked_mul(7)
                    .map(|days| days + total % 5 - weekday)
                    .and_then(Duration::try_days)
                    .ok_or_else(overflow)?;
                last.checked_add_signed(offset).ok_or_else(overflow)
            }
        }
    }
}

impl Default for Frequency {
    fn default() -> Self {
        Self::daily()
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Frequency::Fixed(spacing) => {
                let secs = spacing.num_seconds();
                if secs % 86_400 == 0 {
                    write!(f, "{}D", secs / 86_400)
                } else if secs % 3_600 == 0 {
                    write!(f, "{}h", secs / 3_600)
                } else if secs % 60 == 0 {
                    write!(f, "{}min", secs / 60)
                } else {
                    write!(f, "{secs}s")
                }
            }
            Frequency::Months { step, month_end } => {
                let suffix = if month_end { "ME" } else { "MS" };
                write!(f, "{step}{suffix}")
            }
            Frequency::BusinessDays => f.write_str("B"),
        }
    }
}

impl Serialize for Frequency {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Recognise a constant k-month spacing anchored on a day of month or on month ends.
fn infer_calendar_months(timestamps: &[DateTime<Utc>]) -> Option<Frequency> {
    let month_index = |t: &DateTime<Utc>| t.year() as i64 * 12 + t.month0() as i64;

    let first_step = month_index(&timestamps[1]) - month_index(&timestamps[0]);
    if first_step < 1 {
        return None;
    }

    let same_step = timestamps
        .windows(2)
        .all(|w| month_index(&w[1]) - month_index(&w[0]) == first_step);
    let same_time = timestamps.iter().all(|t| t.time() == timestamps[0].time());
    if !same_step || !same_time {
        return None;
    }

    let step = u32::try_from(first_step).ok()?;
    let same_day = timestamps.iter().all(|t| t.day() == timestamps[0].day());
    let all_month_end = timestamps.iter().all(|t| is_month_end(t.date_naive()));

    if all_month_end {
        Some(Frequency::Months {
            step,
            month_end: true,
        })
    } else if same_day {
        Some(Frequency::Months {
            step,
            month_end: false,
        })
    } else {
        None
    }
}

fn infer_business_days(timestamps: &[DateTime<Utc>], tolerance: f64) -> Option<Frequency> {
    let on_weekdays = timestamps
        .iter()
        .all(|t| t.weekday().num_days_from_monday() < 5);
    let same_time = timestamps.iter().all(|t| t.time() == timestamps[0].time());
    if !on_weekdays || !same_time {
        return None;
    }

    let mut next_day_steps = 0;
    let mut crosses_weekend = false;
    for w in timestamps.windows(2) {
        if Frequency::BusinessDays.step_from(w[0], 1).ok() == Some(w[1]) {
            next_day_steps += 1;
            crosses_weekend |= w[0].weekday() == Weekday::Fri;
        }
    }

    let share = next_day_steps as f64 / (timestamps.len() - 1) as f64;
    (crosses_weekend && share > tolerance).then_some(Frequency::BusinessDays)
}

fn is_month_end(date: NaiveDate) -> bool {
    date.succ_opt().is_some_and(|next| next.month() != date.month())
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}
