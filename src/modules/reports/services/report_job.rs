use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn, Instrument};

use crate::core::unit_of_work::settle;
use crate::core::{AppError, CycleSummary, KeysetCursor, PageSource, Result, ScheduledJob};
use crate::modules::notifications::ReportMailer;
use crate::modules::reports::models::{
    ReportHistoryEntry, ReportSetting, ReportStatus, ScheduleAdvance,
};
use crate::modules::reports::repositories::ReportSettingRepository;
use crate::modules::reports::services::ReportAggregator;
use crate::modules::users::UserDirectory;

/// Enabled schedules due at a given instant, paged by id
pub struct DueReportSchedules {
    settings: Arc<dyn ReportSettingRepository>,
    now: DateTime<Utc>,
}

#[async_trait]
impl PageSource for DueReportSchedules {
    type Item = ReportSetting;

    async fn fetch_page(&self, after: Option<&str>, limit: u32) -> Result<Vec<ReportSetting>> {
        self.settings.find_due_page(self.now, after, limit).await
    }

    fn key(item: &ReportSetting) -> String {
        item.id.clone()
    }
}

/// Where a single schedule is in its processing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordState {
    Pending,
    Aggregating,
    Notifying,
    Skipped,
    Committing,
    Done,
    Failed,
}

impl RecordState {
    /// Move to `Done` or `Failed` for a finished record, returning the stage it ended in
    pub fn conclude<T>(&mut self, outcome: &Result<T>) -> RecordState {
        let stage = *self;
        *self = if outcome.is_ok() {
            RecordState::Done
        } else {
            RecordState::Failed
        };
        stage
    }
}

/// Sends periodic spending reports for every due schedule.
///
/// Records are processed one at a time. A fault in one record is counted
/// and logged, and never stops the cycle or touches another record's writes.
pub struct ReportJobRunner {
    settings: Arc<dyn ReportSettingRepository>,
    users: Arc<dyn UserDirectory>,
    aggregator: Arc<ReportAggregator>,
    mailer: Arc<ReportMailer>,
    commit_timeout: Duration,
    batch_size: u32,
}

impl ReportJobRunner {
    pub fn new(
        settings: Arc<dyn ReportSettingRepository>,
        users: Arc<dyn UserDirectory>,
        aggregator: Arc<ReportAggregator>,
        mailer: Arc<ReportMailer>,
        commit_timeout: Duration,
        batch_size: u32,
    ) -> Self {
        Self {
            settings,
            users,
            aggregator,
            mailer,
            commit_timeout,
            batch_size,
        }
    }

    /// Run one report cycle.
    ///
    /// Errors only when the due-schedule cursor cannot be opened.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<CycleSummary> {
        let source = DueReportSchedules {
            settings: self.settings.clone(),
            now,
        };

        let mut cursor = KeysetCursor::open(source, self.batch_size)
            .await
            .map_err(|e| {
                error!(error = %e, "Could not open due report schedule cursor");
                e
            })?;

        info!(%now, "Running report cycle");

        let mut summary = CycleSummary::started();
        loop {
            let setting = match cursor.next().await {
                Ok(Some(setting)) => setting,
                Ok(None) => break,
                Err(e) => {
                    error!(
                        error = %e,
                        position = ?cursor.position(),
                        "Report schedule cursor failed mid-cycle"
                    );
                    summary.success = false;
                    break;
                }
            };

            let span = tracing::info_span!(
                "report_schedule",
                setting_id = %setting.id,
                user_id = %setting.user_id
            );
            let mut state = RecordState::Pending;
            let outcome = self
                .process(&setting, now, &mut state)
                .instrument(span)
                .await;

            let stage = state.conclude(&outcome);
            match &outcome {
                Ok(status) => debug!(setting_id = %setting.id, %status, "Report schedule processed"),
                Err(e) => warn!(
                    setting_id = %setting.id,
                    user_id = %setting.user_id,
                    failed_in = ?stage,
                    error = %e,
                    fault = ?e.fault_kind(),
                    "Failed to process report schedule"
                ),
            }
            summary.record(&outcome);
        }

        info!(
            processed = summary.processed,
            failed = summary.failed,
            success = summary.success,
            "Report cycle finished"
        );

        Ok(summary)
    }

    async fn process(
        &self,
        setting: &ReportSetting,
        now: DateTime<Utc>,
        state: &mut RecordState,
    ) -> Result<ReportStatus> {
        let contact = self
            .users
            .find_contact(&setting.user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {} not found", setting.user_id)))?;

        *state = RecordState::Aggregating;
        let window = setting.frequency.reporting_window(now)?;
        let report = self.aggregator.generate_for(&setting.user_id, window).await?;

        let (status, last_sent_date) = match report {
            None => {
                *state = RecordState::Skipped;
                (ReportStatus::NoActivity, setting.last_sent_date)
            }
            Some(report) => {
                *state = RecordState::Notifying;
                match self
                    .mailer
                    .send_report(&contact, &report, setting.frequency.title())
                    .await
                {
                    Ok(()) => (ReportStatus::Sent, Some(now)),
                    Err(e) => {
                        warn!(
                            user_id = %setting.user_id,
                            error = %e,
                            "Report email failed, recording as FAILED"
                        );
                        (ReportStatus::Failed, setting.last_sent_date)
                    }
                }
            }
        };

        *state = RecordState::Committing;
        let entry = ReportHistoryEntry::new(&setting.user_id, window.label(), status, now);
        let advance = ScheduleAdvance {
            setting_id: setting.id.clone(),
            last_sent_date,
            next_report_date: setting.frequency.next_report_date(now)?,
            updated_at: now,
        };

        let mut unit = self.settings.begin().await?;
        let staged = async {
            unit.insert_history(&entry).await?;
            unit.advance_schedule(&advance).await
        }
        .await;
        settle(unit, staged, self.commit_timeout).await?;

        Ok(status)
    }
}

#[async_trait]
impl ScheduledJob for ReportJobRunner {
    fn name(&self) -> &'static str {
        "report-dispatch"
    }

    async fn run_cycle(&self, now: DateTime<Utc>) -> Result<CycleSummary> {
        self.run(now).await
    }
}
