use chrono::{DateTime, Days, NaiveTime, Utc};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::core::ScheduledJob;

/// Daily trigger for batch jobs.
///
/// Each job gets its own task and runs at a fixed UTC time of day. A job's
/// cycles never overlap: the next sleep starts only after the cycle returns.
pub struct JobScheduler {
    entries: Vec<(Arc<dyn ScheduledJob>, NaiveTime)>,
}

impl Default for JobScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl JobScheduler {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Run `job` every day at `at` (UTC)
    pub fn daily(mut self, job: Arc<dyn ScheduledJob>, at: NaiveTime) -> Self {
        self.entries.push((job, at));
        self
    }

    /// Spawn one background task per job
    pub fn start(self) -> Vec<JoinHandle<()>> {
        self.entries
            .into_iter()
            .map(|(job, at)| tokio::spawn(run_daily(job, at)))
            .collect()
    }
}

/// First instant strictly after `now` whose UTC time of day is `at`
pub fn next_fire_after(now: DateTime<Utc>, at: NaiveTime) -> DateTime<Utc> {
    let today = now.date_naive().and_time(at).and_utc();
    if today > now {
        today
    } else {
        today
            .checked_add_days(Days::new(1))
            .expect("Valid next day")
    }
}

async fn run_daily(job: Arc<dyn ScheduledJob>, at: NaiveTime) {
    info!(job = job.name(), run_at = %at, "Scheduling daily job");

    loop {
        let now = Utc::now();
        let fire_at = next_fire_after(now, at);
        let wait = (fire_at - now).to_std().unwrap_or_default();
        tokio::time::sleep(wait).await;

        let started = Utc::now();
        match job.run_cycle(started).await {
            Ok(summary) => info!(
                job = job.name(),
                processed = summary.processed,
                failed = summary.failed,
                success = summary.success,
                elapsed_ms = (Utc::now() - started).num_milliseconds(),
                "Scheduled job cycle finished"
            ),
            Err(e) => error!(
                job = job.name(),
                error = %e,
                "Scheduled job cycle aborted"
            ),
        }
    }
}
