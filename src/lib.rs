//! Personal finance backend: recurring transactions and periodic spending reports.
//!
//! The batch engine lives in [`core`] (calendar math, keyset cursors, units of
//! work) and [`modules::reports`] (aggregation and the report job runner).

pub mod config;
pub mod core;
pub mod middleware;
pub mod modules;
pub mod scheduler;

use actix_web::web;

// Re-export commonly used types
pub use modules::reports;
pub use modules::transactions;

/// Register every HTTP route: health checks at the root, the API under `/api`
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(modules::health::configure).service(
        web::scope("/api")
            .configure(modules::reports::controllers::configure)
            .configure(modules::transactions::controllers::configure),
    );
}
