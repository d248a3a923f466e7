use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::users::models::UserContact;

/// Lookup of account holders' contact information
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_contact(&self, user_id: &str) -> Result<Option<UserContact>>;
}

pub struct MySqlUserDirectory {
    pool: MySqlPool,
}

impl MySqlUserDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserDirectory for MySqlUserDirectory {
    async fn find_contact(&self, user_id: &str) -> Result<Option<UserContact>> {
        sqlx::query_as::<_, UserContact>(
            r#"
            SELECT id, email, name
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::transient(format!("Failed to fetch user {}: {}", user_id, e)))
    }
}
