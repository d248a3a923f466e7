use async_trait::async_trait;
use std::time::Duration;
use tracing::warn;

use crate::core::{AppError, Result};

/// A unit of work scoped to exactly one batch record.
///
/// Writes staged on the unit are invisible until `commit`. Implementations
/// must discard staged writes when the unit is dropped without a commit.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn commit(self: Box<Self>) -> Result<()>;

    async fn rollback(self: Box<Self>) -> Result<()>;
}

/// Finish a unit of work: commit when staging succeeded (within `budget`),
/// otherwise roll back and return the staging error.
pub async fn settle<U>(unit: Box<U>, staged: Result<()>, budget: Duration) -> Result<()>
where
    U: UnitOfWork + ?Sized,
{
    match staged {
        Ok(()) => match tokio::time::timeout(budget, unit.commit()).await {
            Ok(result) => result,
            Err(_) => Err(AppError::transient(format!(
                "commit exceeded its {}ms budget",
                budget.as_millis()
            ))),
        },
        Err(err) => {
            if let Err(rollback_err) = unit.rollback().await {
                warn!(error = %rollback_err, "Rollback after failed staging also failed");
            }
            Err(err)
        }
    }
}
