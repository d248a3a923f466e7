use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::core::DateWindow;
use crate::modules::transactions::models::{TransactionKind, TransactionRecord};

/// Number of expense categories kept in a report
pub const TOP_CATEGORY_LIMIT: usize = 5;

/// One ranked expense category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorySpend {
    pub name: String,
    /// Minor units
    pub amount: i64,
    /// Share of total expense, two decimal places
    pub percent: Decimal,
}

/// Numeric aggregates of a user's transactions over one window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpendingAggregates {
    pub income: i64,
    pub expenses: i64,
    pub balance: i64,
    /// balance / income × 100, one decimal place; zero when there is no income
    pub savings_rate: Decimal,
    pub top_categories: Vec<CategorySpend>,
}

impl SpendingAggregates {
    /// Aggregate a window's transactions. `None` when there are none.
    pub fn from_transactions(transactions: &[TransactionRecord]) -> Option<Self> {
        if transactions.is_empty() {
            return None;
        }

        let mut income: i64 = 0;
        let mut expenses: i64 = 0;
        let mut by_category: HashMap<&str, i64> = HashMap::new();

        for tx in transactions {
            match tx.kind {
                TransactionKind::Income => income += tx.amount,
                TransactionKind::Expense => {
                    expenses += tx.amount;
                    *by_category.entry(tx.category.as_str()).or_insert(0) += tx.amount;
                }
            }
        }

        let balance = income - expenses;
        let savings_rate = if income > 0 {
            (Decimal::from(balance) * Decimal::ONE_HUNDRED / Decimal::from(income)).round_dp(1)
        } else {
            Decimal::ZERO
        };

        Some(Self {
            income,
            expenses,
            balance,
            savings_rate,
            top_categories: rank_categories(by_category, expenses),
        })
    }
}

/// Sort descending by amount (ties by name ascending) and keep the top entries
fn rank_categories(by_category: HashMap<&str, i64>, expenses: i64) -> Vec<CategorySpend> {
    if expenses <= 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(&str, i64)> = by_category.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(TOP_CATEGORY_LIMIT);

    ranked
        .into_iter()
        .map(|(name, amount)| CategorySpend {
            name: name.to_string(),
            amount,
            percent: (Decimal::from(amount) * Decimal::ONE_HUNDRED / Decimal::from(expenses))
                .round_dp(2),
        })
        .collect()
}

/// A computed spending report for one user and window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    pub period: String,
    pub window: DateWindow,
    pub summary: SpendingAggregates,
    pub insights: Vec<String>,
}

impl ReportSummary {
    pub fn new(window: DateWindow, summary: SpendingAggregates, insights: Vec<String>) -> Self {
        Self {
            period: window.label(),
            window,
            summary,
            insights,
        }
    }
}
