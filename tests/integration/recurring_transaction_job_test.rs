// Integration tests for recurring transaction materialization

#[path = "../helpers/mod.rs"]
mod helpers;

use std::sync::Arc;

use finreport::core::RecurringInterval;
use finreport::modules::transactions::RecurringTransactionJob;
use helpers::*;

fn job(store: &InMemoryStore, batch_size: u32) -> RecurringTransactionJob {
    RecurringTransactionJob::new(Arc::new(store.clone()), COMMIT_TIMEOUT, batch_size)
}

#[tokio::test]
async fn test_due_template_materializes_and_advances() {
    let store = InMemoryStore::new();
    let template = TestDataFactory::expense("alice", 150_000, "rent", TestDataFactory::date(2025, 1, 31))
        .with_recurrence(RecurringInterval::Monthly, TestDataFactory::date(2025, 1, 31));
    let template_id = template.id.clone();
    store.add_transaction(template);

    let now = TestDataFactory::instant(2025, 1, 31, 0, 5);
    let summary = job(&store, 100).run(now).await.unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 0);

    let template = store.transaction(&template_id).unwrap();
    // Clamped to the end of February
    assert_eq!(
        template.next_recurring_date,
        Some(TestDataFactory::date(2025, 2, 28))
    );
    assert_eq!(
        template.last_processed,
        Some(TestDataFactory::date(2025, 1, 31))
    );

    let copies: Vec<_> = store
        .transactions()
        .into_iter()
        .filter(|t| t.id != template_id)
        .collect();
    assert_eq!(copies.len(), 1);
    assert!(!copies[0].is_recurring);
    assert_eq!(copies[0].date, TestDataFactory::date(2025, 1, 31));
    assert_eq!(copies[0].amount, 150_000);
    assert_eq!(copies[0].category, "rent");
}

#[tokio::test]
async fn test_templates_not_yet_due_are_untouched() {
    let store = InMemoryStore::new();
    let template = TestDataFactory::income("bob", 500_000, TestDataFactory::date(2025, 3, 1))
        .with_recurrence(RecurringInterval::Yearly, TestDataFactory::date(2026, 3, 1));
    store.add_transaction(template);

    let summary = job(&store, 100)
        .run(TestDataFactory::instant(2025, 3, 2, 0, 5))
        .await
        .unwrap();

    assert_eq!(summary.processed, 0);
    assert_eq!(store.transactions().len(), 1);
    assert_eq!(store.commits(), 0);
}

#[tokio::test]
async fn test_each_template_processed_once_per_cycle() {
    let store = InMemoryStore::new();
    // A month in arrears: one copy, then the schedule jumps past today
    let daily = TestDataFactory::expense("carol", 300, "coffee", TestDataFactory::date(2025, 5, 1))
        .with_recurrence(RecurringInterval::Daily, TestDataFactory::date(2025, 5, 1));
    let daily_id = daily.id.clone();
    store.add_transaction(daily);
    for user in ["u1", "u2", "u3"] {
        store.add_transaction(
            TestDataFactory::expense(user, 999, "gym", TestDataFactory::date(2025, 5, 1))
                .with_recurrence(RecurringInterval::Weekly, TestDataFactory::date(2025, 5, 29)),
        );
    }

    let summary = job(&store, 2)
        .run(TestDataFactory::instant(2025, 6, 1, 0, 5))
        .await
        .unwrap();

    assert_eq!(summary.processed, 4);
    assert_eq!(store.transactions().len(), 8);

    let daily = store.transaction(&daily_id).unwrap();
    assert_eq!(daily.next_recurring_date, Some(TestDataFactory::date(2025, 6, 2)));
    assert_eq!(daily.last_processed, Some(TestDataFactory::date(2025, 6, 1)));
    for template in store.transactions().iter().filter(|t| t.is_recurring) {
        template.validate().unwrap();
        assert!(template.next_recurring_date.unwrap() > TestDataFactory::date(2025, 6, 1));
    }
}

#[tokio::test]
async fn test_late_template_keeps_pace_with_daily_runs() {
    let store = InMemoryStore::new();
    let template = TestDataFactory::expense("carol", 300, "coffee", TestDataFactory::date(2025, 5, 1))
        .with_recurrence(RecurringInterval::Daily, TestDataFactory::date(2025, 5, 1));
    let template_id = template.id.clone();
    store.add_transaction(template);
    let job = job(&store, 100);

    for day in 1..=5 {
        let summary = job
            .run(TestDataFactory::instant(2025, 6, day, 0, 5))
            .await
            .unwrap();
        // Day 1 catches up; after that the template is due every run
        assert_eq!(summary.processed, 1, "run on June {}", day);

        let template = store.transaction(&template_id).unwrap();
        template.validate().unwrap();
        assert_eq!(
            template.next_recurring_date,
            Some(TestDataFactory::date(2025, 6, day + 1))
        );
        assert_eq!(
            template.last_processed,
            Some(TestDataFactory::date(2025, 6, day))
        );
    }

    let mut dates: Vec<_> = store
        .transactions()
        .into_iter()
        .filter(|t| !t.is_recurring)
        .map(|t| t.date)
        .collect();
    dates.sort();
    assert_eq!(
        dates,
        vec![
            TestDataFactory::date(2025, 5, 1),
            TestDataFactory::date(2025, 6, 2),
            TestDataFactory::date(2025, 6, 3),
            TestDataFactory::date(2025, 6, 4),
            TestDataFactory::date(2025, 6, 5),
        ]
    );
}

#[tokio::test]
async fn test_month_end_template_catches_up_without_drift() {
    let store = InMemoryStore::new();
    let template = TestDataFactory::expense("frank", 120_000, "rent", TestDataFactory::date(2025, 1, 31))
        .with_recurrence(RecurringInterval::Monthly, TestDataFactory::date(2025, 1, 31));
    let template_id = template.id.clone();
    store.add_transaction(template);

    job(&store, 100)
        .run(TestDataFactory::instant(2025, 4, 10, 0, 5))
        .await
        .unwrap();

    let template = store.transaction(&template_id).unwrap();
    assert_eq!(
        template.next_recurring_date,
        Some(TestDataFactory::date(2025, 4, 30))
    );
    template.validate().unwrap();
}

#[tokio::test]
async fn test_template_without_interval_fails_alone() {
    let store = InMemoryStore::new();
    let mut broken = TestDataFactory::expense("dave", 100, "misc", TestDataFactory::date(2025, 6, 1))
        .with_recurrence(RecurringInterval::Monthly, TestDataFactory::date(2025, 6, 1));
    broken.recurring_interval = None;
    store.add_transaction(broken);
    store.add_transaction(
        TestDataFactory::expense("erin", 100, "misc", TestDataFactory::date(2025, 6, 1))
            .with_recurrence(RecurringInterval::Monthly, TestDataFactory::date(2025, 6, 1)),
    );

    let summary = job(&store, 100)
        .run(TestDataFactory::instant(2025, 6, 1, 0, 5))
        .await
        .unwrap();

    assert_eq!(summary.processed, 1);
    assert_eq!(summary.failed, 1);
    assert!(summary.success);
    assert_eq!(store.transactions().len(), 3);
}

#[tokio::test]
async fn test_unreachable_store_aborts_cycle() {
    let store = InMemoryStore::new();
    store.fail_due_queries(QueryFailure::Always);

    let result = job(&store, 100)
        .run(TestDataFactory::instant(2025, 6, 1, 0, 5))
        .await;

    assert!(result.is_err());
}
