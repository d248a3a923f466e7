pub mod models;
pub mod repositories;

pub use models::UserContact;
pub use repositories::{MySqlUserDirectory, UserDirectory};
