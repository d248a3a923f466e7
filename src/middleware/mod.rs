pub mod auth;
pub mod error_handler;
pub mod request_id;

pub use auth::{CurrentUser, USER_ID_HEADER};
pub use error_handler::{json_config, query_config};
pub use request_id::{RequestId, RequestIdValue};
