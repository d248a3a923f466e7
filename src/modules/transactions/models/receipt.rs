use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::transaction::TransactionKind;
use crate::core::{AppError, Result};

/// Transaction fields extracted from a receipt image, ready to prefill a form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScannedReceipt {
    pub title: String,
    /// Minor units
    pub amount: i64,
    pub date: NaiveDate,
    pub description: String,
    pub category: String,
    pub payment_method: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    title: Option<String>,
    amount: Option<Decimal>,
    date: Option<String>,
    description: Option<String>,
    category: Option<String>,
    payment_method: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl ScannedReceipt {
    /// Parse the JSON object returned by the extraction model.
    ///
    /// Markdown code fences are tolerated. `amount` and `date` are required;
    /// everything else falls back to defaults.
    pub fn from_model_output(text: &str) -> Result<Self> {
        let cleaned = strip_code_fences(text);
        if cleaned.is_empty() {
            return Err(AppError::data("Could not read receipt content"));
        }

        let raw: RawReceipt = serde_json::from_str(cleaned)
            .map_err(|e| AppError::data(format!("Receipt output is not valid JSON: {}", e)))?;

        let (Some(amount), Some(date)) = (raw.amount, raw.date) else {
            return Err(AppError::data("Receipt missing required information"));
        };

        let amount = (amount.abs() * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .filter(|minor| *minor > 0)
            .ok_or_else(|| AppError::data(format!("Receipt amount out of range: {}", amount)))?;

        let date = NaiveDate::parse_from_str(date.get(..10).unwrap_or(&date), "%Y-%m-%d")
            .map_err(|_| AppError::data(format!("Receipt date is not YYYY-MM-DD: {}", date)))?;

        let kind = raw
            .kind
            .and_then(|k| k.parse().ok())
            .unwrap_or(TransactionKind::Expense);

        Ok(Self {
            title: non_empty(raw.title).unwrap_or_else(|| "Receipt".to_string()),
            amount,
            date,
            description: raw.description.unwrap_or_default(),
            category: non_empty(raw.category).unwrap_or_else(|| "General".to_string()),
            payment_method: non_empty(raw.payment_method).unwrap_or_else(|| "CASH".to_string()),
            kind,
        })
    }
}

/// Remove surrounding ```json fences that generative models like to add
pub fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let without_open = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .unwrap_or(trimmed);
    without_open
        .strip_suffix("```")
        .unwrap_or(without_open)
        .trim()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
