use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{MySql, MySqlPool, Transaction};

use crate::core::{AppError, PageRequest, Result, UnitOfWork};
use crate::modules::transactions::models::{
    RecurringStatus, TransactionFilter, TransactionRecord, TransactionRow,
};

const SELECT_COLUMNS: &str = r#"
    SELECT
        id, user_id, title, amount, kind, category, date,
        is_recurring, recurring_interval, next_recurring_date, last_processed,
        created_at, updated_at
    FROM transactions
"#;

/// Writes staged while materializing one recurring template
#[async_trait]
pub trait TransactionUnitOfWork: UnitOfWork {
    /// Insert a new transaction row
    async fn insert(&mut self, record: &TransactionRecord) -> Result<()>;

    /// Move a template's schedule forward
    async fn advance_recurrence(
        &mut self,
        template_id: &str,
        next_recurring_date: NaiveDate,
        last_processed: NaiveDate,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;
}

/// Persistence for transaction records
#[async_trait]
pub trait TransactionRepository: Send + Sync {
    /// All of a user's transactions dated within `[from, to]`, oldest first
    async fn find_in_range(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TransactionRecord>>;

    /// Recurring templates due on or before `today`, keyset-paged by id
    async fn find_due_recurring_page(
        &self,
        today: NaiveDate,
        after_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TransactionRecord>>;

    /// One page of a user's transactions matching `filter`, newest first,
    /// plus the total number of matches
    async fn list_for_user(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<TransactionRecord>, u64)>;

    /// A transaction owned by `user_id`
    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<TransactionRecord>>;

    async fn create(&self, record: &TransactionRecord) -> Result<()>;

    /// Insert every record or none of them
    async fn create_many(&self, records: &[TransactionRecord]) -> Result<u64>;

    /// Overwrite a stored transaction's editable and recurrence fields
    async fn update(&self, record: &TransactionRecord) -> Result<()>;

    /// Delete the user's transactions among `ids`, returning how many went
    async fn delete_many(&self, user_id: &str, ids: &[String]) -> Result<u64>;

    /// Begin a unit of work for one template
    async fn begin(&self) -> Result<Box<dyn TransactionUnitOfWork>>;
}

pub struct MySqlTransactionRepository {
    pool: MySqlPool,
}

impl MySqlTransactionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

async fn insert_record<'a, E>(executor: E, record: &TransactionRecord) -> Result<()>
where
    E: sqlx::Executor<'a, Database = MySql>,
{
    sqlx::query(
        r#"
        INSERT INTO transactions (
            id, user_id, title, amount, kind, category, date,
            is_recurring, recurring_interval, next_recurring_date, last_processed,
            created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&record.id)
    .bind(&record.user_id)
    .bind(&record.title)
    .bind(record.amount)
    .bind(record.kind.to_string())
    .bind(&record.category)
    .bind(record.date)
    .bind(record.is_recurring)
    .bind(record.recurring_interval.map(|i| i.to_string()))
    .bind(record.next_recurring_date)
    .bind(record.last_processed)
    .bind(record.created_at)
    .bind(record.updated_at)
    .execute(executor)
    .await
    .map_err(|e| AppError::transient(format!("Failed to insert transaction: {}", e)))?;

    Ok(())
}

fn into_records(rows: Vec<TransactionRow>) -> Result<Vec<TransactionRecord>> {
    rows.into_iter().map(TransactionRecord::try_from).collect()
}

/// WHERE clause for a listing and its bind values, in placeholder order
fn filter_clause(user_id: &str, filter: &TransactionFilter) -> (String, Vec<String>) {
    let mut clause = String::from("WHERE user_id = ?");
    let mut binds = vec![user_id.to_string()];

    if let Some(keyword) = filter.keyword() {
        let pattern = format!("%{}%", escape_like(keyword));
        clause.push_str(" AND (title LIKE ? OR category LIKE ?)");
        binds.push(pattern.clone());
        binds.push(pattern);
    }
    if let Some(kind) = filter.kind {
        clause.push_str(" AND kind = ?");
        binds.push(kind.to_string());
    }
    match filter.recurring_status {
        Some(RecurringStatus::Recurring) => clause.push_str(" AND is_recurring = TRUE"),
        Some(RecurringStatus::NonRecurring) => clause.push_str(" AND is_recurring = FALSE"),
        None => {}
    }

    (clause, binds)
}

fn escape_like(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

#[async_trait]
impl TransactionRepository for MySqlTransactionRepository {
    async fn find_in_range(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TransactionRecord>> {
        let sql = format!(
            "{} WHERE user_id = ? AND date BETWEEN ? AND ? ORDER BY date ASC, id ASC",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(user_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::transient(format!("Failed to fetch transactions: {}", e)))?;

        into_records(rows)
    }

    async fn find_due_recurring_page(
        &self,
        today: NaiveDate,
        after_id: Option<&str>,
        limit: u32,
    ) -> Result<Vec<TransactionRecord>> {
        let sql = format!(
            "{} WHERE is_recurring = TRUE AND next_recurring_date <= ? AND id > ? ORDER BY id ASC LIMIT ?",
            SELECT_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(today)
            .bind(after_id.unwrap_or(""))
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::transient(format!("Failed to fetch due recurring transactions: {}", e))
            })?;

        into_records(rows)
    }

    async fn list_for_user(
        &self,
        user_id: &str,
        filter: &TransactionFilter,
        page: PageRequest,
    ) -> Result<(Vec<TransactionRecord>, u64)> {
        let (clause, binds) = filter_clause(user_id, filter);

        let count_sql = format!("SELECT COUNT(*) FROM transactions {}", clause);
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        for value in &binds {
            count_query = count_query.bind(value);
        }
        let total = count_query
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::transient(format!("Failed to count transactions: {}", e)))?;

        let sql = format!(
            "{} {} ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, clause
        );
        let mut query = sqlx::query_as::<_, TransactionRow>(&sql);
        for value in &binds {
            query = query.bind(value);
        }
        let rows = query
            .bind(page.page_size)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::transient(format!("Failed to fetch transactions: {}", e)))?;

        Ok((into_records(rows)?, total.max(0) as u64))
    }

    async fn find_by_id(&self, user_id: &str, id: &str) -> Result<Option<TransactionRecord>> {
        let sql = format!("{} WHERE id = ? AND user_id = ?", SELECT_COLUMNS);
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::transient(format!("Failed to fetch transaction: {}", e)))?;

        row.map(TransactionRecord::try_from).transpose()
    }

    async fn create(&self, record: &TransactionRecord) -> Result<()> {
        insert_record(&self.pool, record).await
    }

    async fn create_many(&self, records: &[TransactionRecord]) -> Result<u64> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::transient(format!("Failed to start transaction: {}", e)))?;

        for record in records {
            insert_record(&mut *tx, record).await?;
        }

        tx.commit()
            .await
            .map_err(|e| AppError::transient(format!("Failed to commit transaction: {}", e)))?;

        Ok(records.len() as u64)
    }

    async fn update(&self, record: &TransactionRecord) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET title = ?, amount = ?, kind = ?, category = ?, date = ?,
                is_recurring = ?, recurring_interval = ?, next_recurring_date = ?,
                updated_at = ?
            WHERE id = ? AND user_id = ?
            "#,
        )
        .bind(&record.title)
        .bind(record.amount)
        .bind(record.kind.to_string())
        .bind(&record.category)
        .bind(record.date)
        .bind(record.is_recurring)
        .bind(record.recurring_interval.map(|i| i.to_string()))
        .bind(record.next_recurring_date)
        .bind(record.updated_at)
        .bind(&record.id)
        .bind(&record.user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::transient(format!("Failed to update transaction: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Transaction {} not found",
                record.id
            )));
        }
        Ok(())
    }

    async fn delete_many(&self, user_id: &str, ids: &[String]) -> Result<u64> {
        if ids.is_empty() {
            return Ok(0);
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "DELETE FROM transactions WHERE user_id = ? AND id IN ({})",
            placeholders
        );
        let mut query = sqlx::query(&sql).bind(user_id);
        for id in ids {
            query = query.bind(id);
        }
        let result = query
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::transient(format!("Failed to delete transactions: {}", e)))?;

        Ok(result.rows_affected())
    }

    async fn begin(&self) -> Result<Box<dyn TransactionUnitOfWork>> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::transient(format!("Failed to start transaction: {}", e)))?;

        Ok(Box::new(MySqlTransactionUnitOfWork { tx }))
    }
}

/// Unit of work backed by a MySQL transaction; dropping it rolls back
pub struct MySqlTransactionUnitOfWork {
    tx: Transaction<'static, MySql>,
}

#[async_trait]
impl UnitOfWork for MySqlTransactionUnitOfWork {
    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| AppError::transient(format!("Failed to commit transaction: {}", e)))
    }

    async fn rollback(self: Box<Self>) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(|e| AppError::transient(format!("Failed to roll back transaction: {}", e)))
    }
}

#[async_trait]
impl TransactionUnitOfWork for MySqlTransactionUnitOfWork {
    async fn insert(&mut self, record: &TransactionRecord) -> Result<()> {
        insert_record(&mut *self.tx, record).await
    }

    async fn advance_recurrence(
        &mut self,
        template_id: &str,
        next_recurring_date: NaiveDate,
        last_processed: NaiveDate,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET next_recurring_date = ?, last_processed = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(next_recurring_date)
        .bind(last_processed)
        .bind(updated_at)
        .bind(template_id)
        .execute(&mut *self.tx)
        .await
        .map_err(|e| AppError::transient(format!("Failed to advance recurrence: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!(
                "Recurring transaction {} not found",
                template_id
            )));
        }
        Ok(())
    }
}
