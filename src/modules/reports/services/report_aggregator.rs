use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::{DateWindow, Result};
use crate::modules::insights::InsightGenerator;
use crate::modules::reports::models::{ReportSummary, SpendingAggregates};
use crate::modules::transactions::repositories::TransactionRepository;

/// Computes a user's spending summary over a date window
pub struct ReportAggregator {
    transactions: Arc<dyn TransactionRepository>,
    insights: Arc<dyn InsightGenerator>,
    insight_timeout: Duration,
}

impl ReportAggregator {
    pub fn new(
        transactions: Arc<dyn TransactionRepository>,
        insights: Arc<dyn InsightGenerator>,
        insight_timeout: Duration,
    ) -> Self {
        Self {
            transactions,
            insights,
            insight_timeout,
        }
    }

    /// Summarize `[from, to]` inclusive. `Ok(None)` means no activity.
    pub async fn generate(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Option<ReportSummary>> {
        let window = DateWindow::new(from, to)?;
        self.generate_for(user_id, window).await
    }

    pub async fn generate_for(
        &self,
        user_id: &str,
        window: DateWindow,
    ) -> Result<Option<ReportSummary>> {
        let transactions = self
            .transactions
            .find_in_range(user_id, window.from, window.to)
            .await?;

        let Some(aggregates) = SpendingAggregates::from_transactions(&transactions) else {
            debug!(user_id = %user_id, period = %window.label(), "No transactions in window");
            return Ok(None);
        };

        let period = window.label();
        let insights = self.insights_for(user_id, &period, &aggregates).await;

        Ok(Some(ReportSummary::new(window, aggregates, insights)))
    }

    /// Insight text never fails a report; any error or timeout yields an empty list
    async fn insights_for(
        &self,
        user_id: &str,
        period: &str,
        aggregates: &SpendingAggregates,
    ) -> Vec<String> {
        match tokio::time::timeout(
            self.insight_timeout,
            self.insights.generate_insights(period, aggregates),
        )
        .await
        {
            Ok(Ok(insights)) => insights,
            Ok(Err(e)) => {
                warn!(
                    user_id = %user_id,
                    error = %e,
                    fault = ?e.fault_kind(),
                    "Insight generation failed, continuing without insights"
                );
                Vec::new()
            }
            Err(_) => {
                warn!(
                    user_id = %user_id,
                    timeout_ms = self.insight_timeout.as_millis() as u64,
                    "Insight generation timed out, continuing without insights"
                );
                Vec::new()
            }
        }
    }
}
