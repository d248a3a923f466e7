// Integration tests for the report job runner
//
// Runs full cycles against the in-memory store: cursor paging, per-record
// isolation, history/schedule atomicity and forward progress of
// next_report_date.

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use finreport::core::ScheduledJob;
use finreport::modules::reports::models::{ReportFrequency, ReportStatus};
use helpers::*;

fn cycle_time() -> chrono::DateTime<chrono::Utc> {
    TestDataFactory::instant(2025, 7, 1, 2, 30)
}

fn seed_active_user(harness: &ReportHarness, user_id: &str) {
    harness.store.add_user(TestDataFactory::user(user_id));
    harness.store.add_transaction(TestDataFactory::income(
        user_id,
        1_000_000,
        TestDataFactory::date(2025, 6, 1),
    ));
    harness.store.add_transaction(TestDataFactory::expense(
        user_id,
        50_000,
        "food",
        TestDataFactory::date(2025, 6, 14),
    ));
}

fn seed_due_monthly(harness: &ReportHarness, setting_id: &str, user_id: &str) {
    harness.store.add_setting(TestDataFactory::due_setting(
        setting_id,
        user_id,
        ReportFrequency::Monthly,
        TestDataFactory::instant(2025, 7, 1, 0, 0),
    ));
}

#[tokio::test]
async fn test_email_failure_is_recorded_not_counted() {
    let harness = ReportHarness::new();
    for (setting, user) in [("s1", "alice"), ("s2", "bob"), ("s3", "carol")] {
        seed_active_user(&harness, user);
        seed_due_monthly(&harness, setting, user);
    }
    harness.dispatch.fail_for("carol@example.com");

    let now = cycle_time();
    let summary = harness.runner(100).run(now).await.unwrap();

    assert_eq!(summary.processed, 3);
    assert_eq!(summary.failed, 0);
    assert!(summary.success);

    let statuses: Vec<ReportStatus> = ["alice", "bob", "carol"]
        .iter()
        .map(|user| {
            let history = harness.store.history_for(user);
            assert_eq!(history.len(), 1, "exactly one entry per attempt for {}", user);
            history[0].status
        })
        .collect();
    assert_eq!(
        statuses,
        vec![ReportStatus::Sent, ReportStatus::Sent, ReportStatus::Failed]
    );

    for id in ["s1", "s2", "s3"] {
        let setting = harness.store.setting(id).unwrap();
        assert!(setting.next_report_date > now, "{} must advance", id);
        assert_eq!(
            setting.next_report_date,
            TestDataFactory::instant(2025, 8, 1, 0, 0)
        );
    }

    assert_eq!(harness.store.setting("s1").unwrap().last_sent_date, Some(now));
    assert_eq!(harness.store.setting("s2").unwrap().last_sent_date, Some(now));
    assert_eq!(harness.store.setting("s3").unwrap().last_sent_date, None);
}

#[tokio::test]
async fn test_missing_user_counts_as_failed_and_cycle_continues() {
    let harness = ReportHarness::new();
    for (setting, user) in [
        ("s1", "u1"),
        ("s2", "u2"),
        ("s3", "u3"),
        ("s4", "u4"),
        ("s5", "u5"),
    ] {
        if user != "u3" {
            seed_active_user(&harness, user);
        }
        seed_due_monthly(&harness, setting, user);
    }

    let summary = harness.runner(2).run(cycle_time()).await.unwrap();

    assert_eq!(summary.processed, 4);
    assert_eq!(summary.failed, 1);
    assert!(summary.success);

    // Nothing committed for the orphaned schedule
    assert!(harness.store.history_for("u3").is_empty());
    assert_eq!(
        harness.store.setting("s3").unwrap().next_report_date,
        TestDataFactory::instant(2025, 7, 1, 0, 0)
    );
    assert_eq!(harness.dispatch.sent().len(), 4);
}

#[tokio::test]
async fn test_no_activity_skips_email_and_advances() {
    let harness = ReportHarness::new();
    harness.store.add_user(TestDataFactory::user("idle"));
    let previous_send = TestDataFactory::instant(2025, 6, 1, 2, 30);
    let mut setting = TestDataFactory::due_setting(
        "s1",
        "idle",
        ReportFrequency::Monthly,
        TestDataFactory::instant(2025, 7, 1, 0, 0),
    );
    setting.last_sent_date = Some(previous_send);
    harness.store.add_setting(setting);

    // Outside the reported window
    harness.store.add_transaction(TestDataFactory::expense(
        "idle",
        1_000,
        "food",
        TestDataFactory::date(2025, 7, 1),
    ));

    let summary = harness.runner(100).run(cycle_time()).await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 0);
    assert!(harness.dispatch.attempts().is_empty());

    let history = harness.store.history_for("idle");
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, ReportStatus::NoActivity);
    assert_eq!(history[0].period, "June 1–30, 2025");

    let setting = harness.store.setting("s1").unwrap();
    assert_eq!(setting.last_sent_date, Some(previous_send));
    assert_eq!(
        setting.next_report_date,
        TestDataFactory::instant(2025, 8, 1, 0, 0)
    );
}

#[tokio::test]
async fn test_cursor_open_failure_aborts_cycle() {
    let harness = ReportHarness::new();
    seed_active_user(&harness, "alice");
    seed_due_monthly(&harness, "s1", "alice");
    harness.store.fail_due_queries(QueryFailure::Always);

    let result = harness.runner(100).run(cycle_time()).await;

    assert!(result.is_err());
    assert!(harness.store.history().is_empty());
    assert!(harness.dispatch.attempts().is_empty());
}

#[tokio::test]
async fn test_cursor_failure_mid_cycle_keeps_committed_work() {
    let harness = ReportHarness::new();
    for (setting, user) in [("s1", "u1"), ("s2", "u2"), ("s3", "u3")] {
        seed_active_user(&harness, user);
        seed_due_monthly(&harness, setting, user);
    }
    harness.store.fail_due_queries(QueryFailure::AfterFirstPage);

    let summary = harness.runner(2).run(cycle_time()).await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 0);
    assert!(!summary.success);
    assert_eq!(harness.store.history().len(), 2);
    // Picked up by the next cycle
    assert!(harness.store.setting("s3").unwrap().is_due(cycle_time()));
}

#[tokio::test]
async fn test_commit_failure_isolated_to_one_record() {
    let harness = ReportHarness::new();
    for (setting, user) in [("s1", "u1"), ("s2", "u2"), ("s3", "u3")] {
        seed_active_user(&harness, user);
        seed_due_monthly(&harness, setting, user);
    }
    harness.store.fail_commit_for("s2");

    let summary = harness.runner(1).run(cycle_time()).await.unwrap();

    assert_eq!(summary.processed, 2);
    assert_eq!(summary.failed, 1);
    assert!(summary.success);

    // Neither half of the failed unit is visible
    assert!(harness.store.history_for("u2").is_empty());
    assert_eq!(
        harness.store.setting("s2").unwrap().next_report_date,
        TestDataFactory::instant(2025, 7, 1, 0, 0)
    );

    // The still-due row was attempted exactly once in this cycle
    let attempts = harness.dispatch.attempts();
    assert_eq!(
        attempts.iter().filter(|a| *a == "u2@example.com").count(),
        1
    );
    assert_eq!(harness.store.history_for("u1").len(), 1);
    assert_eq!(harness.store.history_for("u3").len(), 1);
}

#[tokio::test]
async fn test_disabled_and_future_schedules_are_ignored() {
    let harness = ReportHarness::new();
    seed_active_user(&harness, "due");
    seed_active_user(&harness, "off");
    seed_active_user(&harness, "later");
    seed_due_monthly(&harness, "s1", "due");

    let mut disabled = TestDataFactory::due_setting(
        "s2",
        "off",
        ReportFrequency::Monthly,
        TestDataFactory::instant(2025, 6, 1, 0, 0),
    );
    disabled.is_enabled = false;
    harness.store.add_setting(disabled);
    harness.store.add_setting(TestDataFactory::due_setting(
        "s3",
        "later",
        ReportFrequency::Monthly,
        TestDataFactory::instant(2025, 7, 1, 2, 31),
    ));

    let summary = harness.runner(100).run(cycle_time()).await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(harness.dispatch.attempts(), vec!["due@example.com".to_string()]);
}

#[tokio::test]
async fn test_weekly_schedule_reports_previous_week() {
    let harness = ReportHarness::new();
    harness.store.add_user(TestDataFactory::user("weekly"));
    harness.store.add_transaction(TestDataFactory::expense(
        "weekly",
        2_500,
        "transport",
        TestDataFactory::date(2025, 5, 28),
    ));
    harness.store.add_setting(TestDataFactory::due_setting(
        "s1",
        "weekly",
        ReportFrequency::Weekly,
        TestDataFactory::instant(2025, 6, 2, 0, 0),
    ));

    // Monday
    let now = TestDataFactory::instant(2025, 6, 2, 2, 30);
    let summary = harness.runner(100).run(now).await.unwrap();
    assert_eq!(summary.processed, 1);

    let sent = harness.dispatch.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        sent[0].subject,
        "Weekly Financial Report - May 26 – June 1, 2025"
    );

    let setting = harness.store.setting("s1").unwrap();
    assert_eq!(
        setting.next_report_date,
        TestDataFactory::instant(2025, 6, 9, 0, 0)
    );
    assert_eq!(setting.last_sent_date, Some(now));
}

#[tokio::test]
async fn test_second_cycle_finds_nothing_due() {
    let harness = ReportHarness::new();
    seed_active_user(&harness, "alice");
    seed_due_monthly(&harness, "s1", "alice");
    let runner = harness.runner(100);

    let first = runner.run(cycle_time()).await.unwrap();
    let second = runner
        .run(TestDataFactory::instant(2025, 7, 2, 2, 30))
        .await
        .unwrap();

    assert_eq!(first.processed, 1);
    assert_eq!(second.processed, 0);
    assert_eq!(second.failed, 0);
    assert_eq!(harness.store.history().len(), 1);
}

#[tokio::test]
async fn test_runs_through_scheduled_job_trait() {
    let harness = ReportHarness::new();
    seed_active_user(&harness, "alice");
    seed_due_monthly(&harness, "s1", "alice");

    let job: Arc<dyn ScheduledJob> = Arc::new(harness.runner(10));
    assert_eq!(job.name(), "report-dispatch");

    let summary = job.run_cycle(cycle_time()).await.unwrap();
    assert_eq!(summary.processed, 1);
    assert_eq!(harness.store.commits(), 1);
}
