pub mod controllers;
pub mod models;
pub mod repositories;
pub mod services;

pub use models::{CreateTransactionRequest, ScannedReceipt, TransactionKind, TransactionRecord};
pub use repositories::{MySqlTransactionRepository, TransactionRepository};
pub use services::{RecurringTransactionJob, TransactionService};
