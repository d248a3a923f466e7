use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{info, warn};

use crate::core::{AppError, Page, PageRequest, Result};
use crate::modules::notifications::ReportMailer;
use crate::modules::reports::models::{
    ReportHistoryEntry, ReportSetting, ReportStatus, ReportSummary, UpdateReportSettingRequest,
};
use crate::modules::reports::repositories::{ReportHistoryRepository, ReportSettingRepository};
use crate::modules::reports::services::ReportAggregator;
use crate::modules::users::UserDirectory;

/// Subject label for reports requested outside the schedule
pub const AD_HOC_REPORT_LABEL: &str = "Custom";

/// Result of an on-demand report request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdHocReport {
    Generated {
        report: ReportSummary,
        email_sent: bool,
    },
    NoTransactions,
}

/// Consumer-facing report operations
pub struct ReportService {
    settings: Arc<dyn ReportSettingRepository>,
    history: Arc<dyn ReportHistoryRepository>,
    users: Arc<dyn UserDirectory>,
    aggregator: Arc<ReportAggregator>,
    mailer: Arc<ReportMailer>,
}

impl ReportService {
    pub fn new(
        settings: Arc<dyn ReportSettingRepository>,
        history: Arc<dyn ReportHistoryRepository>,
        users: Arc<dyn UserDirectory>,
        aggregator: Arc<ReportAggregator>,
        mailer: Arc<ReportMailer>,
    ) -> Self {
        Self {
            settings,
            history,
            users,
            aggregator,
            mailer,
        }
    }

    /// A page of the user's report history, newest first
    pub async fn list_reports(
        &self,
        user_id: &str,
        request: PageRequest,
    ) -> Result<Page<ReportHistoryEntry>> {
        request.validate()?;
        let (items, total) = self.history.list_for_user(user_id, request).await?;
        Ok(Page::new(items, request, total))
    }

    /// Create the signup default (disabled, monthly) unless the user already has settings
    pub async fn create_default_settings(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ReportSetting> {
        let default = ReportSetting::default_for(user_id, now)?;
        if self.settings.create_if_absent(&default).await? {
            info!(user_id = %user_id, "Created default report settings");
        }

        self.settings
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Report settings for user {}", user_id)))
    }

    /// Current settings; users created before settings existed get the default
    pub async fn get_settings(&self, user_id: &str, now: DateTime<Utc>) -> Result<ReportSetting> {
        match self.settings.find_by_user_id(user_id).await? {
            Some(setting) => Ok(setting),
            None => self.create_default_settings(user_id, now).await,
        }
    }

    pub async fn update_settings(
        &self,
        user_id: &str,
        update: UpdateReportSettingRequest,
        now: DateTime<Utc>,
    ) -> Result<ReportSetting> {
        update.validate()?;

        let mut setting = self
            .settings
            .find_by_user_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Report settings for user {}", user_id)))?;

        setting.apply_update(&update, now)?;
        self.settings.update(&setting).await?;

        info!(
            user_id = %user_id,
            is_enabled = setting.is_enabled,
            frequency = %setting.frequency,
            next_report_date = %setting.next_report_date,
            "Report settings updated"
        );
        Ok(setting)
    }

    /// Compute a report for an arbitrary window and try to email it.
    ///
    /// The summary is returned even when the email fails. A SENT history
    /// entry is written only after a successful send.
    pub async fn generate_ad_hoc(
        &self,
        user_id: &str,
        from: NaiveDate,
        to: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<AdHocReport> {
        let contact = self
            .users
            .find_contact(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", user_id)))?;

        let Some(report) = self.aggregator.generate(user_id, from, to).await? else {
            return Ok(AdHocReport::NoTransactions);
        };

        let email_sent = match self
            .mailer
            .send_report(&contact, &report, AD_HOC_REPORT_LABEL)
            .await
        {
            Ok(()) => {
                let entry =
                    ReportHistoryEntry::new(user_id, report.period.clone(), ReportStatus::Sent, now);
                if let Err(e) = self.history.insert(&entry).await {
                    warn!(user_id = %user_id, error = %e, "Failed to record ad hoc report history");
                }
                true
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "Ad hoc report email failed");
                false
            }
        };

        Ok(AdHocReport::Generated { report, email_sent })
    }
}
