use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::core::{AppError, RecurrenceCalculator, RecurringInterval, Result};

/// Largest amount accepted for a single transaction, in minor units
pub const MAX_TRANSACTION_AMOUNT: i64 = 1_000_000_000;

/// Most transactions accepted by one bulk import
pub const MAX_BULK_TRANSACTIONS: usize = 300;

/// Direction of money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionKind::Income => write!(f, "INCOME"),
            TransactionKind::Expense => write!(f, "EXPENSE"),
        }
    }
}

impl std::str::FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "INCOME" => Ok(TransactionKind::Income),
            "EXPENSE" => Ok(TransactionKind::Expense),
            _ => Err(format!("Invalid transaction kind: {}", s)),
        }
    }
}

/// A user's income or expense entry; amounts are integer minor units
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub next_recurring_date: Option<NaiveDate>,
    pub last_processed: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransactionRecord {
    /// Plain (non-recurring) record
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        amount: i64,
        kind: TransactionKind,
        category: impl Into<String>,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            title: title.into(),
            amount,
            kind,
            category: category.into(),
            date,
            is_recurring: false,
            recurring_interval: None,
            next_recurring_date: None,
            last_processed: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Turn this record into a recurring template due on `next_recurring_date`
    pub fn with_recurrence(
        mut self,
        interval: RecurringInterval,
        next_recurring_date: NaiveDate,
    ) -> Self {
        self.is_recurring = true;
        self.recurring_interval = Some(interval);
        self.next_recurring_date = Some(next_recurring_date);
        self
    }

    /// Check the recurrence invariants
    pub fn validate(&self) -> Result<()> {
        if self.is_recurring && self.recurring_interval.is_none() {
            return Err(AppError::validation(
                "recurring transactions require a recurringInterval",
            ));
        }
        if let (Some(next), Some(last)) = (self.next_recurring_date, self.last_processed) {
            if next < last {
                return Err(AppError::validation(format!(
                    "nextRecurringDate ({}) precedes lastProcessed ({})",
                    next, last
                )));
            }
        }
        Ok(())
    }

    /// The concrete, non-recurring entry produced when this template comes due
    pub fn materialize(&self, due: NaiveDate, now: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord::new(
            self.user_id.clone(),
            self.title.clone(),
            self.amount,
            self.kind,
            self.category.clone(),
            due,
            now,
        )
    }

    /// A non-recurring copy under a new id, titled "Duplicate - {title}"
    pub fn duplicate(&self, now: DateTime<Utc>) -> TransactionRecord {
        TransactionRecord::new(
            self.user_id.clone(),
            format!("Duplicate - {}", self.title),
            self.amount,
            self.kind,
            self.category.clone(),
            self.date,
            now,
        )
    }

    /// Apply a partial edit and re-seed the recurrence.
    ///
    /// A record that stays (or becomes) recurring gets a fresh due date from
    /// its possibly new `date` and interval, following the creation rule.
    /// Turning recurrence off clears the interval and due date.
    pub fn apply_update(
        &mut self,
        update: UpdateTransactionRequest,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        update.validate()?;

        if let Some(title) = update.title {
            self.title = title.trim().to_string();
        }
        if let Some(amount) = update.amount {
            self.amount = amount;
        }
        if let Some(kind) = update.kind {
            self.kind = kind;
        }
        if let Some(category) = update.category {
            self.category = category.trim().to_string();
        }
        if let Some(date) = update.date {
            self.date = date;
        }

        let is_recurring = update.is_recurring.unwrap_or(self.is_recurring);
        let interval = update.recurring_interval.or(self.recurring_interval);
        match (is_recurring, interval) {
            (true, Some(interval)) => {
                self.is_recurring = true;
                self.recurring_interval = Some(interval);
                self.next_recurring_date = Some(RecurrenceCalculator::initial_next_date(
                    self.date, interval, today,
                )?);
            }
            (true, None) => {
                return Err(AppError::validation(
                    "recurringInterval is required when isRecurring is true",
                ));
            }
            (false, _) => {
                self.is_recurring = false;
                self.recurring_interval = None;
                self.next_recurring_date = None;
            }
        }

        self.updated_at = now;
        self.validate()
    }
}

/// Payload for creating a transaction
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub title: String,
    pub amount: i64,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub category: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub recurring_interval: Option<RecurringInterval>,
}

impl CreateTransactionRequest {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(AppError::validation("title is required"));
        }
        if self.category.trim().is_empty() {
            return Err(AppError::validation("category is required"));
        }
        validate_amount(self.amount)?;
        if self.is_recurring && self.recurring_interval.is_none() {
            return Err(AppError::validation(
                "recurringInterval is required when isRecurring is true",
            ));
        }
        Ok(())
    }

    /// Build the stored record, seeding the first due date for recurring entries
    pub fn into_record(
        self,
        user_id: &str,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        self.validate()?;

        let record = TransactionRecord::new(
            user_id,
            self.title.trim(),
            self.amount,
            self.kind,
            self.category.trim(),
            self.date,
            now,
        );

        match (self.is_recurring, self.recurring_interval) {
            (true, Some(interval)) => {
                let next = RecurrenceCalculator::initial_next_date(self.date, interval, today)?;
                Ok(record.with_recurrence(interval, next))
            }
            _ => Ok(record),
        }
    }
}

fn validate_amount(amount: i64) -> Result<()> {
    if amount <= 0 {
        return Err(AppError::validation("amount must be positive"));
    }
    if amount > MAX_TRANSACTION_AMOUNT {
        return Err(AppError::validation(format!(
            "amount must not exceed {}",
            MAX_TRANSACTION_AMOUNT
        )));
    }
    Ok(())
}

/// Partial edit of a transaction; absent fields keep their stored value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTransactionRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub amount: Option<i64>,
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub is_recurring: Option<bool>,
    #[serde(default)]
    pub recurring_interval: Option<RecurringInterval>,
}

impl UpdateTransactionRequest {
    pub fn validate(&self) -> Result<()> {
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::validation("title must not be empty"));
        }
        if self.category.as_deref().is_some_and(|c| c.trim().is_empty()) {
            return Err(AppError::validation("category must not be empty"));
        }
        if let Some(amount) = self.amount {
            validate_amount(amount)?;
        }
        Ok(())
    }
}

/// Whether a listing should include recurring templates, plain entries, or both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RecurringStatus {
    Recurring,
    NonRecurring,
}

/// Listing filters (`?keyword=&type=&recurringStatus=`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionFilter {
    /// Case-insensitive match on title or category
    #[serde(default)]
    pub keyword: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<TransactionKind>,
    #[serde(default)]
    pub recurring_status: Option<RecurringStatus>,
}

impl TransactionFilter {
    /// Trimmed keyword, `None` when blank
    pub fn keyword(&self) -> Option<&str> {
        self.keyword
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }

    pub fn matches(&self, record: &TransactionRecord) -> bool {
        if let Some(keyword) = self.keyword() {
            let keyword = keyword.to_lowercase();
            if !record.title.to_lowercase().contains(&keyword)
                && !record.category.to_lowercase().contains(&keyword)
            {
                return false;
            }
        }
        if self.kind.is_some_and(|kind| kind != record.kind) {
            return false;
        }
        match self.recurring_status {
            Some(RecurringStatus::Recurring) => record.is_recurring,
            Some(RecurringStatus::NonRecurring) => !record.is_recurring,
            None => true,
        }
    }
}

/// Payload for deleting several transactions at once
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteRequest {
    pub transaction_ids: Vec<String>,
}

impl BulkDeleteRequest {
    pub fn validate(&self) -> Result<()> {
        if self.transaction_ids.is_empty() {
            return Err(AppError::validation(
                "At least one transaction ID must be provided",
            ));
        }
        if self.transaction_ids.iter().any(|id| id.trim().is_empty()) {
            return Err(AppError::validation("transaction IDs must not be empty"));
        }
        Ok(())
    }
}

/// Payload for importing many transactions in one call
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCreateRequest {
    pub transactions: Vec<CreateTransactionRequest>,
}

impl BulkCreateRequest {
    /// Validate every entry and build the stored records.
    ///
    /// Imported entries are always stored as plain, non-recurring records.
    pub fn into_records(self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<TransactionRecord>> {
        if self.transactions.is_empty() {
            return Err(AppError::validation("At least one transaction is required"));
        }
        if self.transactions.len() > MAX_BULK_TRANSACTIONS {
            return Err(AppError::validation(format!(
                "Must not be more than {} transactions",
                MAX_BULK_TRANSACTIONS
            )));
        }

        self.transactions
            .into_iter()
            .enumerate()
            .map(|(index, mut request)| {
                request.is_recurring = false;
                request.recurring_interval = None;
                request
                    .into_record(user_id, now.date_naive(), now)
                    .map_err(|e| match e {
                        AppError::Validation(msg) => {
                            AppError::validation(format!("transactions[{}]: {}", index, msg))
                        }
                        other => other,
                    })
            })
            .collect()
    }
}

/// Raw `transactions` row; enum columns are stored as strings
#[derive(Debug, FromRow)]
pub(crate) struct TransactionRow {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub amount: i64,
    pub kind: String,
    pub category: String,
    pub date: NaiveDate,
    pub is_recurring: bool,
    pub recurring_interval: Option<String>,
    pub next_recurring_date: Option<NaiveDate>,
    pub last_processed: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<TransactionRow> for TransactionRecord {
    type Error = AppError;

    fn try_from(row: TransactionRow) -> Result<Self> {
        let kind = row.kind.parse().map_err(AppError::Data)?;
        let recurring_interval = row
            .recurring_interval
            .map(|raw| raw.parse::<RecurringInterval>())
            .transpose()
            .map_err(AppError::Data)?;

        Ok(TransactionRecord {
            id: row.id,
            user_id: row.user_id,
            title: row.title,
            amount: row.amount,
            kind,
            category: row.category,
            date: row.date,
            is_recurring: row.is_recurring,
            recurring_interval,
            next_recurring_date: row.next_recurring_date,
            last_processed: row.last_processed,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
