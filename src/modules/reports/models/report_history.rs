use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, Result};

/// Outcome of one processing attempt of a report schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    Sent,
    Failed,
    NoActivity,
}

impl std::fmt::Display for ReportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportStatus::Sent => write!(f, "SENT"),
            ReportStatus::Failed => write!(f, "FAILED"),
            ReportStatus::NoActivity => write!(f, "NO_ACTIVITY"),
        }
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "SENT" => Ok(ReportStatus::Sent),
            "FAILED" => Ok(ReportStatus::Failed),
            "NO_ACTIVITY" => Ok(ReportStatus::NoActivity),
            _ => Err(format!("Invalid report status: {}", s)),
        }
    }
}

/// Append-only record of a report attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportHistoryEntry {
    pub id: String,
    pub user_id: String,
    pub sent_date: DateTime<Utc>,
    /// Human-readable window label, e.g. "June 1–30, 2025"
    pub period: String,
    pub status: ReportStatus,
    pub created_at: DateTime<Utc>,
}

impl ReportHistoryEntry {
    pub fn new(
        user_id: impl Into<String>,
        period: impl Into<String>,
        status: ReportStatus,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            sent_date: now,
            period: period.into(),
            status,
            created_at: now,
        }
    }
}

#[derive(Debug, FromRow)]
pub(crate) struct ReportHistoryRow {
    pub id: String,
    pub user_id: String,
    pub sent_date: DateTime<Utc>,
    pub period: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ReportHistoryRow> for ReportHistoryEntry {
    type Error = AppError;

    fn try_from(row: ReportHistoryRow) -> Result<Self> {
        Ok(ReportHistoryEntry {
            id: row.id,
            user_id: row.user_id,
            sent_date: row.sent_date,
            period: row.period,
            status: row.status.parse().map_err(AppError::Data)?,
            created_at: row.created_at,
        })
    }
}
