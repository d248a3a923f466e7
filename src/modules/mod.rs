pub mod health;
pub mod insights;
pub mod notifications;
pub mod reports;
pub mod transactions;
pub mod users;
