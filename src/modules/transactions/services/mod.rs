pub mod recurring_job;
pub mod transaction_service;

pub use recurring_job::{DueRecurringTransactions, RecurringTransactionJob};
pub use transaction_service::TransactionService;
