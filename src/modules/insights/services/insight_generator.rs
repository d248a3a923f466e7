use async_trait::async_trait;
use std::sync::Arc;

use super::gemini_client::{GeminiClient, GeminiPart};
use crate::core::money::{format_minor_units, format_percent};
use crate::core::{AppError, Result};
use crate::modules::reports::models::SpendingAggregates;
use crate::modules::transactions::models::receipt::strip_code_fences;

/// Number of observations requested per report
pub const INSIGHT_COUNT: usize = 3;

/// Produces short narrative observations about a report's numbers.
///
/// Output is opaque to the caller; callers must tolerate errors.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    async fn generate_insights(
        &self,
        period: &str,
        aggregates: &SpendingAggregates,
    ) -> Result<Vec<String>>;
}

/// Used when no generator is configured
pub struct NoopInsightGenerator;

#[async_trait]
impl InsightGenerator for NoopInsightGenerator {
    async fn generate_insights(
        &self,
        _period: &str,
        _aggregates: &SpendingAggregates,
    ) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}

pub struct GeminiInsightGenerator {
    client: Arc<GeminiClient>,
    currency_symbol: String,
}

impl GeminiInsightGenerator {
    pub fn new(client: Arc<GeminiClient>, currency_symbol: impl Into<String>) -> Self {
        Self {
            client,
            currency_symbol: currency_symbol.into(),
        }
    }
}

#[async_trait]
impl InsightGenerator for GeminiInsightGenerator {
    async fn generate_insights(
        &self,
        period: &str,
        aggregates: &SpendingAggregates,
    ) -> Result<Vec<String>> {
        let prompt = insight_prompt(period, aggregates, &self.currency_symbol);
        let output = self.client.generate(vec![GeminiPart::text(prompt)]).await?;
        parse_insights(&output)
    }
}

/// Coaching prompt asking for a JSON array of short observations
pub fn insight_prompt(period: &str, aggregates: &SpendingAggregates, symbol: &str) -> String {
    let categories = aggregates
        .top_categories
        .iter()
        .map(|c| {
            format!(
                "- {}: {} ({}%)",
                c.name,
                format_minor_units(c.amount, symbol),
                c.percent
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"You are a personal finance coach reviewing a user's spending report.
Give exactly {count} short, realistic observations. Be encouraging, but point out overspending.

Report period: {period}
- Total income: {income}
- Total expenses: {expenses}
- Available balance: {balance}
- Savings rate: {savings}

Expense breakdown:
{categories}

Guidelines:
- Use the {symbol} symbol when referring to money.
- If the savings rate is above 70%, acknowledge it.
- If expenses exceed 40% of income, call out overspending.
- Name the largest expense category and suggest moderation.
- Each observation is one short sentence.

Respond with only a JSON array of {count} strings."#,
        count = INSIGHT_COUNT,
        period = period,
        income = format_minor_units(aggregates.income, symbol),
        expenses = format_minor_units(aggregates.expenses, symbol),
        balance = format_minor_units(aggregates.balance, symbol),
        savings = format_percent(aggregates.savings_rate),
        categories = categories,
        symbol = symbol,
    )
}

/// Parse model output into insight strings; anything but a JSON string array is a data fault
pub fn parse_insights(output: &str) -> Result<Vec<String>> {
    let cleaned = strip_code_fences(output);
    let insights: Vec<String> = serde_json::from_str(cleaned)
        .map_err(|e| AppError::data(format!("Insight output is not a JSON string array: {}", e)))?;

    Ok(insights
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}
