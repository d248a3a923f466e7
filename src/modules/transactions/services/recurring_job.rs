use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument};

use crate::core::unit_of_work::settle;
use crate::core::{
    AppError, CycleSummary, KeysetCursor, PageSource, RecurrenceCalculator, Result,
    ScheduledJob,
};
use crate::modules::transactions::models::TransactionRecord;
use crate::modules::transactions::repositories::TransactionRepository;

/// Recurring templates due on a given day, paged by id
pub struct DueRecurringTransactions {
    repo: Arc<dyn TransactionRepository>,
    today: NaiveDate,
}

#[async_trait]
impl PageSource for DueRecurringTransactions {
    type Item = TransactionRecord;

    async fn fetch_page(&self, after: Option<&str>, limit: u32) -> Result<Vec<TransactionRecord>> {
        self.repo
            .find_due_recurring_page(self.today, after, limit)
            .await
    }

    fn key(item: &TransactionRecord) -> String {
        item.id.clone()
    }
}

/// Materializes recurring transactions on their due dates.
///
/// Each due template yields one concrete transaction dated at its due date.
/// In the same unit of work its schedule moves to the first occurrence
/// after today, so a template that fell behind skips the missed periods
/// rather than replaying them one cycle at a time.
pub struct RecurringTransactionJob {
    transactions: Arc<dyn TransactionRepository>,
    commit_timeout: Duration,
    batch_size: u32,
}

impl RecurringTransactionJob {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        commit_timeout: Duration,
        batch_size: u32,
    ) -> Self {
        Self {
            transactions,
            commit_timeout,
            batch_size,
        }
    }

    /// Process every template due on or before `now`'s date
    pub async fn run(&self, now: DateTime<Utc>) -> Result<CycleSummary> {
        let today = now.date_naive();
        let source = DueRecurringTransactions {
            repo: self.transactions.clone(),
            today,
        };

        let mut cursor = KeysetCursor::open(source, self.batch_size)
            .await
            .map_err(|e| {
                error!(error = %e, "Could not open recurring transaction cursor");
                e
            })?;

        info!(%today, "Running recurring transaction materialization");

        let mut summary = CycleSummary::started();
        loop {
            let template = match cursor.next().await {
                Ok(Some(template)) => template,
                Ok(None) => break,
                Err(e) => {
                    error!(
                        error = %e,
                        position = ?cursor.position(),
                        "Recurring transaction cursor failed mid-cycle"
                    );
                    summary.success = false;
                    break;
                }
            };

            let span = tracing::info_span!(
                "recurring_transaction",
                transaction_id = %template.id,
                user_id = %template.user_id
            );
            let outcome = self
                .materialize(&template, today, now)
                .instrument(span)
                .await;

            if let Err(ref e) = outcome {
                warn!(
                    transaction_id = %template.id,
                    error = %e,
                    fault = ?e.fault_kind(),
                    "Failed to materialize recurring transaction"
                );
            }
            summary.record(&outcome);
        }

        info!(
            processed = summary.processed,
            failed = summary.failed,
            success = summary.success,
            "Recurring transaction cycle finished"
        );

        Ok(summary)
    }

    async fn materialize(
        &self,
        template: &TransactionRecord,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let interval = template.recurring_interval.ok_or_else(|| {
            AppError::data(format!(
                "Recurring transaction {} has no interval",
                template.id
            ))
        })?;
        let due = template.next_recurring_date.ok_or_else(|| {
            AppError::data(format!(
                "Recurring transaction {} has no due date",
                template.id
            ))
        })?;

        let next = RecurrenceCalculator::next_occurrence_after(due, interval, today)?;
        if due < today {
            info!(%due, %next, "Recurring transaction was behind, skipping missed periods");
        }
        let copy = template.materialize(due, now);

        let mut unit = self.transactions.begin().await?;
        let staged = async {
            unit.insert(&copy).await?;
            unit.advance_recurrence(&template.id, next, today, now).await
        }
        .await;
        settle(unit, staged, self.commit_timeout).await?;

        debug!(%due, %next, materialized_id = %copy.id, "Recurring transaction materialized");
        Ok(())
    }
}

#[async_trait]
impl ScheduledJob for RecurringTransactionJob {
    fn name(&self) -> &'static str {
        "recurring-transactions"
    }

    async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleSummary> {
        self.run(now).await
    }
}
