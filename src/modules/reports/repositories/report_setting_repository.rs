use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, Result, UnitOfWork};
use crate::modules::reports::models::{
    ReportHistoryEntry, ReportSetting, ReportSettingRow, ScheduleAdvance,
};
use crate::modules::reports::repositories::report_history_repository::insert_history;

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, user_id, is_enabled, frequency, last_sent_date, next_report_date,
        created_at, updated_at
    FROM report_settings
"#;

/// Writes staged while processing one due schedule
#[async_trait]
pub trait ReportUnitOfWork: UnitOfWork {
    async fn insert_history(&mut self, entry: &ReportHistoryEntry) -> Result<()>;

    async fn advance_schedule(&mut self, advance: &ScheduleAdvance) -> Result<()>;
}

/// Persistence for per-user report schedules
#[async_trait]
pub trait ReportSettingRepository: Send + Sync {
    /// Enabled schedules with `next_report_date <= now`, keyset-paged by id
    async fn find_due_page(
        &self,
        now: DateTime<Utc>,
        after_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ReportSetting>>;

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<ReportSetting>>;

    /// Insert unless the user already has a row. Returns whether a row was written.
    async fn create_if_absent(&self, setting: &ReportSetting) -> Result<bool>;

    async fn update(&self, setting: &ReportSetting) -> Result<()>;

    /// Begin a unit of work spanning schedules and history
    async fn begin(&self) -> Result<Box<dyn ReportUnitOfWork>>;
}

pub struct MySqlReportSettingRepository {
    pool: MySqlPool,
}

impl MySqlReportSettingRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn into_settings(rows: Vec<ReportSettingRow>) -> Result<Vec<ReportSetting>> {
    rows.into_iter().map(ReportSetting::try_from).collect()
}

#[async_trait]
impl ReportSettingRepository for MySqlReportSettingRepository {
    async fn find_due_page(
        &self,
        now: DateTime<Utc>,
        after_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<ReportSetting>> {
        let sql = format!(
            "{} WHERE is_enabled = TRUE AND next_report_date <= ? AND id > ? ORDER BY id ASC LIMIT ?",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ReportSettingRow>(&sql)
            .bind(now)
            .bind(after_id.unwrap_or(""))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::transient(format!("Failed to fetch due report settings: {}", e)))?;

        into_settings(rows)
    }

    async fn find_by_user_id(&self, user_id: &str) -> Result<Option<ReportSetting>> {
        let sql = format!("{} WHERE user_id = ?", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, ReportSettingRow>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::transient(format!("Failed to fetch report settings: {}", e)))?;

        row.map(ReportSetting::try_from).transpose()
    }

    async fn create_if_absent(&self, setting: &ReportSetting) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT IGNORE INTO report_settings (
                id, user_id, is_enabled, frequency, last_sent_date, next_report_date,
                created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&setting.id)
        .bind(&setting.user_id)
        .bind(setting.is_enabled)
        .bind(setting.frequency.to_string())
        .bind(setting.last_sent_date)
        .bind(setting.next_report_date)
        .bind(setting.created_at)
        .bind(setting.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::transient(format!("Failed to create report settings: {}", e)))?;

        Ok(result.rows_affected() > 0)
    }

    async fn update(&self, setting: &ReportSetting) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE report_settings
            SET is_enabled = ?, frequency = ?, next_report_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(setting.is_enabled)
        .bind(setting.frequency.to_string())
        .bind(setting.next_report_date)
        .bind(setting.updated_at)
        .bind(&setting.id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::transient(format!("Failed to update report settings: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Report settings {} not found",
                setting.id
            )));
        }
        Ok(())
    }

    async fn begin(&self) -> Result<Box<dyn ReportUnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::transient(format!("Failed to start transaction: {}", e)))?;

        Ok(Box::new(MySqlReportUnitOfWork { tx }))
    }
}

/// Unit of work backed by a MySQL transaction; dropping it rolls back
pub struct MySqlReportUnitOfWork {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl UnitOfWork for MySqlReportUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::transient(format!("Failed to commit report cycle: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AppError::transient(format!("Failed to roll back report cycle: {}", e)))
    }
}

#[async_trait]
impl ReportUnitOfWork for MySqlReportUnitOfWork {
    async fn insert_history(&mut self, entry: &ReportHistoryEntry) -> Result<()> {
        insert_history(&mut *self.tx, entry).await
    }

    async fn advance_schedule(&mut self, advance: &ScheduleAdvance) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE report_settings
            SET last_sent_date = ?, next_report_date = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(advance.last_sent_date)
        .bind(advance.next_report_date)
        .bind(advance.updated_at)
        .bind(&advance.setting_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::transient(format!("Failed to advance report schedule: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Report settings {} not found",
                advance.setting_id
            )));
        }
        Ok(())
    }
}
