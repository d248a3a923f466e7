pub mod receipt;
pub mod transaction;

pub use receipt::ScannedReceipt;
pub use transaction::{
    BulkCreateRequest, BulkDeleteRequest, CreateTransactionRequest, RecurringStatus,
    TransactionFilter, TransactionKind, TransactionRecord, UpdateTransactionRequest,
    MAX_BULK_TRANSACTIONS, MAX_TRANSACTION_AMOUNT,
};
pub(crate) use transaction::TransactionRow;
