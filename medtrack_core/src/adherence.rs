//! Expected-dose and adherence arithmetic.
//!
//! Every function here works on plain values: a medication's configuration
//! and a slice of dose logs. Logs belonging to other medications are ignored,
//! so callers may pass a medication's own logs or a wider set.
//!
//! Two adherence figures are offered and they answer different questions:
//! - [`adherence_rate`]: of the events that were logged, how many were taken
//! - [`adherence_rate_over_period`]: of the doses the schedule expected in a
//!   date window, how many were logged as taken

use crate::{DoseLog, Error, Medication, Result};
use chrono::NaiveDate;

/// Theoretical dose count for `days` days on the medication's schedule.
///
/// `days` is unsigned, so a negative day count cannot reach this function;
/// rejecting zero days is left to callers (the HTTP boundary requires a
/// positive value).
pub fn expected_doses(medication: &Medication, days: u32) -> Result<i64> {
    if medication.prescribed_per_day <= 0 {
        return Err(Error::Misconfigured(medication.prescribed_per_day));
    }
    medication
        .prescribed_per_day
        .checked_mul(i64::from(days))
        .ok_or(Error::DoseCountOverflow {
            prescribed_per_day: medication.prescribed_per_day,
            days,
        })
}

/// Percentage of logged events that were taken, rounded to 2 decimals.
///
/// Returns 0.0 when the medication has no logged events.
pub fn adherence_rate(medication: &Medication, logs: &[DoseLog]) -> f64 {
    let (total, taken) = logs
        .iter()
        .filter(|log| log.medication == medication.id)
        .fold((0u64, 0u64), |(total, taken), log| {
            (total + 1, taken + u64::from(log.was_taken))
        });

    if total == 0 {
        return 0.0;
    }
    percentage(taken, total)
}

/// Percentage of expected doses in `[start, end]` that were logged as taken.
///
/// Both bounds are inclusive calendar dates; a log counts when the UTC date
/// of its `taken_at` falls inside them.
pub fn adherence_rate_over_period(
    medication: &Medication,
    logs: &[DoseLog],
    start: NaiveDate,
    end: NaiveDate,
) -> Result<f64> {
    if start > end {
        return Err(Error::InvalidRange { start, end });
    }

    let days = u32::try_from((end - start).num_days() + 1)
        .map_err(|_| Error::InvalidRange { start, end })?;
    let expected = expected_doses(medication, days)?;
    if expected == 0 {
        return Ok(0.0);
    }

    let taken = logs
        .iter()
        .filter(|log| log.medication == medication.id && log.was_taken)
        .filter(|log| (start..=end).contains(&log.date()))
        .count() as u64;

    tracing::debug!(
        medication = medication.id,
        %start,
        %end,
        taken,
        expected,
        "Computed period adherence"
    );

    // Extra logged doses must not push the rate past 100%.
    Ok(percentage(taken, expected as u64).min(100.0))
}

fn percentage(part: u64, whole: u64) -> f64 {
    round2(100.0 * part as f64 / whole as f64)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
