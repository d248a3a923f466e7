use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;

use crate::core::{AppError, Result};

/// Source of keyset-ordered pages for a [`KeysetCursor`]
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Fetch up to `limit` items whose key sorts strictly after `after`
    async fn fetch_page(&self, after: Option<&str>, limit: u32) -> Result<Vec<Self::Item>>;

    /// Sort key of an item; pages are ordered by this key ascending
    fn key(item: &Self::Item) -> String;
}

/// Lazy, restartable pull-sequence over a [`PageSource`].
///
/// Holds at most one page in memory. Because the position is a key rather
/// than an offset, an item is yielded at most once per cursor even when
/// processing it did not remove it from the underlying filter.
pub struct KeysetCursor<S: PageSource> {
    source: S,
    after: Option<String>,
    buffer: VecDeque<S::Item>,
    batch_size: u32,
    exhausted: bool,
}

impl<S: PageSource> KeysetCursor<S> {
    /// Open the cursor by fetching the first page.
    ///
    /// An error here means the source is unreachable.
    pub async fn open(source: S, batch_size: u32) -> Result<Self> {
        Self::resume(source, None, batch_size).await
    }

    /// Reopen a cursor after a previously observed position
    pub async fn resume(source: S, after: Option<String>, batch_size: u32) -> Result<Self> {
        if batch_size == 0 {
            return Err(AppError::validation("cursor batch size must be greater than 0"));
        }

        let mut cursor = Self {
            source,
            after,
            buffer: VecDeque::new(),
            batch_size,
            exhausted: false,
        };
        cursor.fill().await?;
        Ok(cursor)
    }

    /// Pull the next item, fetching a new page when the buffer runs dry
    pub async fn next(&mut self) -> Result<Option<S::Item>> {
        if self.buffer.is_empty() && !self.exhausted {
            self.fill().await?;
        }

        let item = self.buffer.pop_front();
        if let Some(ref item) = item {
            self.after = Some(S::key(item));
        }
        Ok(item)
    }

    /// Key of the last yielded item
    pub fn position(&self) -> Option<&str> {
        self.after.as_deref()
    }

    async fn fill(&mut self) -> Result<()> {
        let page = self
            .source
            .fetch_page(self.after.as_deref(), self.batch_size)
            .await?;
        if (page.len() as u32) < self.batch_size {
            self.exhausted = true;
        }
        self.buffer.extend(page);
        Ok(())
    }
}

/// Counters produced by one batch cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
    pub processed: u64,
    pub failed: u64,
    pub success: bool,
}

impl CycleSummary {
    pub fn started() -> Self {
        Self {
            processed: 0,
            failed: 0,
            success: true,
        }
    }

    /// Fold one record outcome into the counters
    pub fn record<T>(&mut self, outcome: &Result<T>) {
        match outcome {
            Ok(_) => self.processed += 1,
            Err(_) => self.failed += 1,
        }
    }
}

/// A batch job invoked once per period by the scheduler
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &'static str;

    /// Run one cycle. Errors only when the candidate cursor cannot be opened.
    async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleSummary>;
}
