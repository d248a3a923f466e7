use chrono::{DateTime, Datelike, Days, Months, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::{AppError, Result};

/// Period governing automatic materialization of a recurring transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurringInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for RecurringInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecurringInterval::Daily => write!(f, "DAILY"),
            RecurringInterval::Weekly => write!(f, "WEEKLY"),
            RecurringInterval::Monthly => write!(f, "MONTHLY"),
            RecurringInterval::Yearly => write!(f, "YEARLY"),
        }
    }
}

impl std::str::FromStr for RecurringInterval {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "DAILY" => Ok(RecurringInterval::Daily),
            "WEEKLY" => Ok(RecurringInterval::Weekly),
            "MONTHLY" => Ok(RecurringInterval::Monthly),
            "YEARLY" => Ok(RecurringInterval::Yearly),
            _ => Err(format!("Invalid recurring interval: {}", s)),
        }
    }
}

/// Calendar arithmetic for recurring transactions and report schedules.
///
/// Month and year steps clamp to the last valid day of the target month,
/// so Jan 31 + MONTHLY lands on Feb 28 (or Feb 29 in leap years).
pub struct RecurrenceCalculator;

impl RecurrenceCalculator {
    /// Add exactly one interval unit to `anchor`
    pub fn next_occurrence(anchor: NaiveDate, interval: RecurringInterval) -> Result<NaiveDate> {
        Self::step(anchor, interval, 1)
    }

    /// Earliest occurrence of `anchor`'s schedule strictly after `after`.
    ///
    /// Occurrences are counted from `anchor` itself, so a month-end anchor
    /// keeps clamping to each month's last day instead of drifting to the
    /// shortest month's day. Returns the first step when `anchor` is
    /// already past `after`.
    pub fn next_occurrence_after(
        anchor: NaiveDate,
        interval: RecurringInterval,
        after: NaiveDate,
    ) -> Result<NaiveDate> {
        if after < anchor {
            return Self::next_occurrence(anchor, interval);
        }

        // Steps below this count all land on or before `after`
        let mut steps = match interval {
            RecurringInterval::Daily => (after - anchor).num_days() + 1,
            RecurringInterval::Weekly => (after - anchor).num_days() / 7 + 1,
            RecurringInterval::Monthly => {
                i64::from(after.year() - anchor.year()) * 12 + i64::from(after.month())
                    - i64::from(anchor.month())
            }
            RecurringInterval::Yearly => i64::from(after.year() - anchor.year()),
        }
        .max(1);

        loop {
            let count = u32::try_from(steps).map_err(|_| out_of_range(anchor, interval))?;
            let candidate = Self::step(anchor, interval, count)?;
            if candidate > after {
                return Ok(candidate);
            }
            steps += 1;
        }
    }

    /// First due date for a newly created recurring transaction.
    ///
    /// A back-dated transaction does not replay missed periods: when the
    /// step from `date` already lies before `today`, the schedule restarts
    /// one interval after `today`.
    pub fn initial_next_date(
        date: NaiveDate,
        interval: RecurringInterval,
        today: NaiveDate,
    ) -> Result<NaiveDate> {
        let candidate = Self::next_occurrence(date, interval)?;
        if candidate < today {
            Self::next_occurrence(today, interval)
        } else {
            Ok(candidate)
        }
    }

    /// Start (00:00 UTC) of the first calendar month strictly after `now`
    pub fn next_report_date(now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let today = now.date_naive();
        let next = today
            .with_day(1)
            .and_then(|first| first.checked_add_months(Months::new(1)))
            .ok_or_else(|| report_date_out_of_range(now))?;
        Ok(next.and_time(NaiveTime::MIN).and_utc())
    }

    /// Start (00:00 UTC) of the first Monday strictly after `now`
    pub fn next_weekly_report_date(now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        let today = now.date_naive();
        let days_ahead = 7 - u64::from(today.weekday().num_days_from_monday());
        let next = today
            .checked_add_days(Days::new(days_ahead))
            .ok_or_else(|| report_date_out_of_range(now))?;
        Ok(next.and_time(NaiveTime::MIN).and_utc())
    }

    fn step(anchor: NaiveDate, interval: RecurringInterval, count: u32) -> Result<NaiveDate> {
        let next = match interval {
            RecurringInterval::Daily => anchor.checked_add_days(Days::new(u64::from(count))),
            RecurringInterval::Weekly => {
                anchor.checked_add_days(Days::new(u64::from(count) * 7))
            }
            RecurringInterval::Monthly => anchor.checked_add_months(Months::new(count)),
            RecurringInterval::Yearly => count
                .checked_mul(12)
                .and_then(|months| anchor.checked_add_months(Months::new(months))),
        };
        next.ok_or_else(|| out_of_range(anchor, interval))
    }
}

fn out_of_range(anchor: NaiveDate, interval: RecurringInterval) -> AppError {
    AppError::validation(format!(
        "{} step from {} leaves the supported date range",
        interval, anchor
    ))
}

fn report_date_out_of_range(now: DateTime<Utc>) -> AppError {
    AppError::validation(format!(
        "no report date after {} within the supported date range",
        now
    ))
}
