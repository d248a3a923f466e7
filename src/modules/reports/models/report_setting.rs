use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, DateWindow, RecurrenceCalculator, Result};

/// How often a user receives a spending report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportFrequency {
    Weekly,
    #[default]
    Monthly,
}

impl ReportFrequency {
    /// The full period before `now` that a scheduled report covers
    pub fn reporting_window(&self, now: DateTime<Utc>) -> Result<DateWindow> {
        let today = now.date_naive();
        match self {
            ReportFrequency::Weekly => DateWindow::previous_week(today),
            ReportFrequency::Monthly => DateWindow::previous_month(today),
        }
    }

    /// Start of the next reporting period strictly after `now`
    pub fn next_report_date(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
        match self {
            ReportFrequency::Weekly => RecurrenceCalculator::next_weekly_report_date(now),
            ReportFrequency::Monthly => RecurrenceCalculator::next_report_date(now),
        }
    }

    /// Capitalized name used in email subjects
    pub fn title(&self) -> &'static str {
        match self {
            ReportFrequency::Weekly => "Weekly",
            ReportFrequency::Monthly => "Monthly",
        }
    }
}

impl std::fmt::Display for ReportFrequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportFrequency::Weekly => write!(f, "WEEKLY"),
            ReportFrequency::Monthly => write!(f, "MONTHLY"),
        }
    }
}

impl std::str::FromStr for ReportFrequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "WEEKLY" => Ok(ReportFrequency::Weekly),
            "MONTHLY" => Ok(ReportFrequency::Monthly),
            _ => Err(format!("Invalid report frequency: {}", s)),
        }
    }
}

/// A user's report schedule (one row per user)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSetting {
    pub id: String,
    pub user_id: String,
    pub is_enabled: bool,
    pub frequency: ReportFrequency,
    pub last_sent_date: Option<DateTime<Utc>>,
    pub next_report_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ReportSetting {
    /// Signup default: disabled, monthly, first report at the next month start
    pub fn default_for(user_id: impl Into<String>, now: DateTime<Utc>) -> Result<Self> {
        let frequency = ReportFrequency::default();
        Ok(Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            is_enabled: false,
            frequency,
            last_sent_date: None,
            next_report_date: frequency.next_report_date(now)?,
            created_at: now,
            updated_at: now,
        })
    }

    /// Whether the batch runner should pick this row up at `now`
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.is_enabled && self.next_report_date <= now
    }

    /// Apply a partial preference update.
    ///
    /// When the result is enabled and either the frequency changed or the
    /// stored date is not in the future, the next date restarts from `now`.
    pub fn apply_update(
        &mut self,
        update: &UpdateReportSettingRequest,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let frequency_changed = update
            .frequency
            .is_some_and(|frequency| frequency != self.frequency);

        if let Some(is_enabled) = update.is_enabled {
            self.is_enabled = is_enabled;
        }
        if let Some(frequency) = update.frequency {
            self.frequency = frequency;
        }

        if self.is_enabled && (frequency_changed || self.next_report_date <= now) {
            self.next_report_date = self.frequency.next_report_date(now)?;
        }
        self.updated_at = now;
        Ok(())
    }
}

/// Partial update of a user's report preferences
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateReportSettingRequest {
    #[serde(default)]
    pub is_enabled: Option<bool>,
    #[serde(default)]
    pub frequency: Option<ReportFrequency>,
}

impl UpdateReportSettingRequest {
    pub fn validate(&self) -> Result<()> {
        if self.is_enabled.is_none() && self.frequency.is_none() {
            return Err(AppError::validation(
                "at least one of isEnabled or frequency must be provided",
            ));
        }
        Ok(())
    }
}

/// Schedule state written back after processing a due row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleAdvance {
    pub setting_id: String,
    pub last_sent_date: Option<DateTime<Utc>>,
    pub next_report_date: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Raw `report_settings` row
#[derive(Debug, FromRow)]
pub(crate) struct ReportSettingRow {
    pub id: String,
    pub user_id: String,
    pub is_enabled: bool,
    pub frequency: String,
    pub last_sent_date: Option<DateTime<Utc>>,
    pub next_report_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ReportSettingRow> for ReportSetting {
    type Error = AppError;

    fn try_from(row: ReportSettingRow) -> Result<Self> {
        Ok(ReportSetting {
            id: row.id,
            user_id: row.user_id,
            is_enabled: row.is_enabled,
            frequency: row.frequency.parse().map_err(AppError::Data)?,
            last_sent_date: row.last_sent_date,
            next_report_date: row.next_report_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
