use chrono::{Datelike, Days, Months, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::core::{AppError, Result};

/// Inclusive calendar window `[from, to]` that a report aggregates over
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateWindow {
    /// Build a window, rejecting `from > to`
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self> {
        if from > to {
            return Err(AppError::validation(format!(
                "from ({}) must be before or equal to to ({})",
                from, to
            )));
        }
        Ok(Self { from, to })
    }

    /// The full calendar month before the month containing `today`
    pub fn previous_month(today: NaiveDate) -> Result<Self> {
        let first_of_current = today.with_day(1).ok_or_else(|| out_of_range(today))?;
        let from = first_of_current
            .checked_sub_months(Months::new(1))
            .ok_or_else(|| out_of_range(today))?;
        let to = first_of_current.pred_opt().ok_or_else(|| out_of_range(today))?;
        Ok(Self { from, to })
    }

    /// The Monday-to-Sunday week before the week containing `today`
    pub fn previous_week(today: NaiveDate) -> Result<Self> {
        let days_since_monday = u64::from(today.weekday().num_days_from_monday());
        let from = today
            .checked_sub_days(Days::new(days_since_monday + 7))
            .ok_or_else(|| out_of_range(today))?;
        let to = today
            .checked_sub_days(Days::new(days_since_monday + 1))
            .ok_or_else(|| out_of_range(today))?;
        Ok(Self { from, to })
    }

    /// Human-readable period label, e.g. "June 1–30, 2025"
    pub fn label(&self) -> String {
        let (from, to) = (self.from, self.to);
        if from == to {
            return from.format("%B %-d, %Y").to_string();
        }
        if from.year() != to.year() {
            return format!("{} – {}", from.format("%B %-d, %Y"), to.format("%B %-d, %Y"));
        }
        if from.month() != to.month() {
            return format!("{} – {}", from.format("%B %-d"), to.format("%B %-d, %Y"));
        }
        format!("{}–{}", from.format("%B %-d"), to.format("%-d, %Y"))
    }
}

fn out_of_range(today: NaiveDate) -> AppError {
    AppError::validation(format!(
        "no reporting window before {} within the supported date range",
        today
    ))
}
