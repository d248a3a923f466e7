use async_trait::async_trait;
use sqlx::{MySql, MySqlPool};

use crate::core::{AppError, PageRequest, Result};
use crate::modules::reports::models::{ReportHistoryEntry, ReportHistoryRow};

/// Append-only store of report attempts
#[async_trait]
pub trait ReportHistoryRepository: Send + Sync {
    /// One page of a user's history, newest first, plus the user's total count
    async fn list_for_user(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<(Vec<ReportHistoryEntry>, u64)>;

    async fn insert(&self, entry: &ReportHistoryEntry) -> Result<()>;
}

pub struct MySqlReportHistoryRepository {
    pool: MySqlPool,
}

impl MySqlReportHistoryRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

pub(crate) async fn insert_history<'a, E>(executor: E, entry: &ReportHistoryEntry) -> Result<()>
where
    E: sqlx::Executor<'a, Database = MySql>,
{
    sqlx::query(
        r#"
        INSERT INTO report_history (id, user_id, sent_date, period, status, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.user_id)
    .bind(entry.sent_date)
    .bind(&entry.period)
    .bind(entry.status.to_string())
    .bind(entry.created_at)
    .execute(executor)
    .await
    .map_err(|e| AppError::transient(format!("Failed to insert report history: {}", e)))?;

    Ok(())
}

#[async_trait]
impl ReportHistoryRepository for MySqlReportHistoryRepository {
    async fn list_for_user(
        &self,
        user_id: &str,
        page: PageRequest,
    ) -> Result<(Vec<ReportHistoryEntry>, u64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM report_history WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::transient(format!("Failed to count report history: {}", e)))?;

        let rows = sqlx::query_as::<_, ReportHistoryRow>(
            r#"
            SELECT id, user_id, sent_date, period, status, created_at
            FROM report_history
            WHERE user_id = ?
            ORDER BY sent_date DESC, id DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(user_id)
        .bind(page.page_size)
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::transient(format!("Failed to fetch report history: {}", e)))?;

        let entries = rows
            .into_iter()
            .map(ReportHistoryEntry::try_from)
            .collect::<Result<Vec<_>>>()?;

        Ok((entries, total.max(0) as u64))
    }

    async fn insert(&self, entry: &ReportHistoryEntry) -> Result<()> {
        insert_history(&self.pool, entry).await
    }
}
