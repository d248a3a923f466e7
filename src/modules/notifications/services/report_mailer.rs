use std::fmt::Write as _;
use std::sync::Arc;

use super::email_dispatch::{EmailDispatch, EmailMessage};
use crate::core::money::{format_minor_units, format_percent};
use crate::core::Result;
use crate::modules::reports::models::ReportSummary;
use crate::modules::users::UserContact;

/// Renders spending reports and hands them to an [`EmailDispatch`].
///
/// `frequency` is the capitalized label shown in the subject, e.g. "Monthly".
pub struct ReportMailer {
    dispatch: Arc<dyn EmailDispatch>,
    currency_symbol: String,
}

impl ReportMailer {
    pub fn new(dispatch: Arc<dyn EmailDispatch>, currency_symbol: impl Into<String>) -> Self {
        Self {
            dispatch,
            currency_symbol: currency_symbol.into(),
        }
    }

    pub async fn send_report(
        &self,
        contact: &UserContact,
        report: &ReportSummary,
        frequency: &str,
    ) -> Result<()> {
        let message = self.render(contact, report, frequency);
        self.dispatch.send(&message).await
    }

    pub fn render(
        &self,
        contact: &UserContact,
        report: &ReportSummary,
        frequency: &str,
    ) -> EmailMessage {
        EmailMessage {
            to: contact.email.clone(),
            subject: format!("{} Financial Report - {}", frequency, report.period),
            text_body: self.render_text(contact, report, frequency),
            html_body: self.render_html(contact, report, frequency),
        }
    }

    fn money(&self, amount: i64) -> String {
        format_minor_units(amount, &self.currency_symbol)
    }

    fn render_text(
        &self,
        contact: &UserContact,
        report: &ReportSummary,
        frequency: &str,
    ) -> String {
        let s = &report.summary;
        let mut body = format!(
            "Hi {},\n\nYour {} Financial Report ({})\n\nIncome: {}\nExpenses: {}\nBalance: {}\nSavings Rate: {}\n",
            contact.display_name(),
            frequency,
            report.period,
            self.money(s.income),
            self.money(s.expenses),
            self.money(s.balance),
            format_percent(s.savings_rate),
        );

        if !s.top_categories.is_empty() {
            body.push_str("\nTop Spending Categories:\n");
            for category in &s.top_categories {
                let _ = writeln!(
                    body,
                    "- {}: {} ({}%)",
                    category.name,
                    self.money(category.amount),
                    category.percent
                );
            }
        }

        if !report.insights.is_empty() {
            body.push_str("\nInsights:\n");
            for insight in &report.insights {
                let _ = writeln!(body, "- {}", insight);
            }
        }

        body
    }

    fn render_html(
        &self,
        contact: &UserContact,
        report: &ReportSummary,
        frequency: &str,
    ) -> String {
        let s = &report.summary;

        let mut rows = String::new();
        for category in &s.top_categories {
            let _ = write!(
                rows,
                "<tr><td>{}</td><td style=\"text-align:right\">{}</td><td style=\"text-align:right\">{}%</td></tr>",
                escape_html(&category.name),
                escape_html(&self.money(category.amount)),
                category.percent
            );
        }

        let mut insights = String::new();
        for insight in &report.insights {
            let _ = write!(insights, "<li>{}</li>", escape_html(insight));
        }

        format!(
            r#"<!DOCTYPE html>
<html>
<body style="font-family:Arial,sans-serif;color:#1f2937">
  <h2>{frequency} Financial Report</h2>
  <p>Hi {name}, here is your summary for <strong>{period}</strong>.</p>
  <table cellpadding="6">
    <tr><td>Income</td><td style="text-align:right">{income}</td></tr>
    <tr><td>Expenses</td><td style="text-align:right">{expenses}</td></tr>
    <tr><td>Balance</td><td style="text-align:right">{balance}</td></tr>
    <tr><td>Savings Rate</td><td style="text-align:right">{savings}</td></tr>
  </table>
  <h3>Top Spending Categories</h3>
  <table cellpadding="6">{rows}</table>
  <h3>Insights</h3>
  <ul>{insights}</ul>
</body>
</html>"#,
            frequency = escape_html(frequency),
            name = escape_html(contact.display_name()),
            period = escape_html(&report.period),
            income = escape_html(&self.money(s.income)),
            expenses = escape_html(&self.money(s.expenses)),
            balance = escape_html(&self.money(s.balance)),
            savings = format_percent(s.savings_rate),
            rows = rows,
            insights = insights,
        )
    }
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}
