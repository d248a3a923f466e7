use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::info;

use crate::core::{AppError, Page, PageRequest, Result};
use crate::modules::insights::ReceiptScanner;
use crate::modules::transactions::models::{
    BulkCreateRequest, BulkDeleteRequest, CreateTransactionRequest, ScannedReceipt,
    TransactionFilter, TransactionRecord, UpdateTransactionRequest,
};
use crate::modules::transactions::repositories::TransactionRepository;

/// Upper bound on uploaded receipt images
pub const MAX_RECEIPT_BYTES: usize = 5 * 1024 * 1024;

pub struct TransactionService {
    transactions: Arc<dyn TransactionRepository>,
    scanner: Arc<dyn ReceiptScanner>,
}

impl TransactionService {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        scanner: Arc<dyn ReceiptScanner>,
    ) -> Self {
        Self {
            transactions,
            scanner,
        }
    }

    /// Validate and store a new transaction, seeding its recurrence if any
    pub async fn create_transaction(
        &self,
        user_id: &str,
        request: CreateTransactionRequest,
        now: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        let record = request.into_record(user_id, now.date_naive(), now)?;
        self.transactions.create(&record).await?;

        info!(
            transaction_id = %record.id,
            user_id = %user_id,
            recurring = record.is_recurring,
            next_recurring_date = ?record.next_recurring_date,
            "Transaction created"
        );
        Ok(record)
    }

    /// A user's transactions matching `filter`, newest first
    pub async fn list_transactions(
        &self,
        user_id: &str,
        filter: TransactionFilter,
        request: PageRequest,
    ) -> Result<Page<TransactionRecord>> {
        request.validate()?;
        let (items, total) = self
            .transactions
            .list_for_user(user_id, &filter, request)
            .await?;
        Ok(Page::new(items, request, total))
    }

    pub async fn get_transaction(&self, user_id: &str, id: &str) -> Result<TransactionRecord> {
        self.transactions
            .find_by_id(user_id, id)
            .await?
            .ok_or_else(|| AppError::not_found("Transaction not found"))
    }

    /// Apply a partial edit; recurring records get their due date re-seeded
    pub async fn update_transaction(
        &self,
        user_id: &str,
        id: &str,
        update: UpdateTransactionRequest,
        now: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        let mut record = self.get_transaction(user_id, id).await?;
        record.apply_update(update, now.date_naive(), now)?;
        self.transactions.update(&record).await?;

        info!(
            transaction_id = %record.id,
            user_id = %user_id,
            recurring = record.is_recurring,
            next_recurring_date = ?record.next_recurring_date,
            "Transaction updated"
        );
        Ok(record)
    }

    pub async fn delete_transaction(&self, user_id: &str, id: &str) -> Result<()> {
        let deleted = self
            .transactions
            .delete_many(user_id, &[id.to_string()])
            .await?;
        if deleted == 0 {
            return Err(AppError::not_found("Transaction not found"));
        }

        info!(transaction_id = %id, user_id = %user_id, "Transaction deleted");
        Ok(())
    }

    /// Delete several of the user's transactions; ids owned by others are ignored
    pub async fn bulk_delete(&self, user_id: &str, request: BulkDeleteRequest) -> Result<u64> {
        request.validate()?;
        let deleted = self
            .transactions
            .delete_many(user_id, &request.transaction_ids)
            .await?;
        if deleted == 0 {
            return Err(AppError::not_found("No transactions found"));
        }

        info!(
            user_id = %user_id,
            requested = request.transaction_ids.len(),
            deleted,
            "Transactions deleted"
        );
        Ok(deleted)
    }

    /// Store a plain copy of an existing transaction
    pub async fn duplicate_transaction(
        &self,
        user_id: &str,
        id: &str,
        now: DateTime<Utc>,
    ) -> Result<TransactionRecord> {
        let original = self.get_transaction(user_id, id).await?;
        let copy = original.duplicate(now);
        self.transactions.create(&copy).await?;

        info!(
            transaction_id = %copy.id,
            source_id = %original.id,
            user_id = %user_id,
            "Transaction duplicated"
        );
        Ok(copy)
    }

    /// Import many plain transactions in one write
    pub async fn bulk_create(
        &self,
        user_id: &str,
        request: BulkCreateRequest,
        now: DateTime<Utc>,
    ) -> Result<u64> {
        let records = request.into_records(user_id, now)?;
        let inserted = self.transactions.create_many(&records).await?;

        info!(user_id = %user_id, inserted, "Transactions imported");
        Ok(inserted)
    }

    /// Extract transaction fields from a receipt image
    pub async fn scan_receipt(&self, image: &[u8], mime_type: &str) -> Result<ScannedReceipt> {
        if image.is_empty() {
            return Err(AppError::validation("No file uploaded"));
        }
        if image.len() > MAX_RECEIPT_BYTES {
            return Err(AppError::validation(format!(
                "Receipt image exceeds {} bytes",
                MAX_RECEIPT_BYTES
            )));
        }
        if !mime_type.starts_with("image/") {
            return Err(AppError::validation(format!(
                "Unsupported receipt content type: {}",
                mime_type
            )));
        }

        self.scanner.scan(image, mime_type).await
    }
}
