// Property-based tests for recurrence and report schedule arithmetic

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Timelike, Utc, Weekday};
use finreport::core::{DateWindow, RecurrenceCalculator, RecurringInterval};
use finreport::modules::reports::models::ReportFrequency;
use proptest::prelude::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn last_day_of_month(y: i32, m: u32) -> u32 {
    let (ny, nm) = if m == 12 { (y + 1, 1) } else { (y, m + 1) };
    date(ny, nm, 1).pred_opt().unwrap().day()
}

/// Monthly steps from the 31st clamp through short months
#[test]
fn test_monthly_clamping_sequence() {
    let mut anchor = date(2024, 1, 31);
    let mut seen = vec![];
    for _ in 0..3 {
        anchor = RecurrenceCalculator::next_occurrence(anchor, RecurringInterval::Monthly).unwrap();
        seen.push(anchor);
    }
    // Leap year February, then the clamped day carries forward
    assert_eq!(seen, vec![date(2024, 2, 29), date(2024, 3, 29), date(2024, 4, 29)]);
}

#[test]
fn test_yearly_from_leap_day() {
    assert_eq!(
        RecurrenceCalculator::next_occurrence(date(2024, 2, 29), RecurringInterval::Yearly)
            .unwrap(),
        date(2025, 2, 28)
    );
}

#[test]
fn test_back_dated_transaction_restarts_after_today() {
    let today = date(2025, 6, 15);
    let next = RecurrenceCalculator::initial_next_date(
        date(2025, 1, 10),
        RecurringInterval::Monthly,
        today,
    )
    .unwrap();
    assert_eq!(next, date(2025, 7, 15));

    let recent = RecurrenceCalculator::initial_next_date(
        date(2025, 6, 10),
        RecurringInterval::Weekly,
        today,
    )
    .unwrap();
    assert_eq!(recent, date(2025, 6, 17));
}

#[test]
fn test_report_windows() {
    let now = Utc.with_ymd_and_hms(2025, 3, 1, 2, 30, 0).unwrap();
    let monthly = ReportFrequency::Monthly.reporting_window(now).unwrap();
    assert_eq!(monthly, DateWindow::new(date(2025, 2, 1), date(2025, 2, 28)).unwrap());
    assert_eq!(monthly.label(), "February 1–28, 2025");

    // Wednesday
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
    let weekly = ReportFrequency::Weekly.reporting_window(now).unwrap();
    assert_eq!(weekly.from, date(2024, 12, 23));
    assert_eq!(weekly.to, date(2024, 12, 29));
    assert_eq!(weekly.label(), "December 23–29, 2024");
}

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (1990i32..2100, 1u32..=12, 1u32..=31).prop_map(|(y, m, d)| {
        date(y, m, d.min(last_day_of_month(y, m)))
    })
}

fn any_instant() -> impl Strategy<Value = DateTime<Utc>> {
    (any_date(), 0u32..24, 0u32..60, 0u32..60)
        .prop_map(|(d, h, min, s)| d.and_hms_opt(h, min, s).unwrap().and_utc())
}

fn any_interval() -> impl Strategy<Value = RecurringInterval> {
    prop_oneof![
        Just(RecurringInterval::Daily),
        Just(RecurringInterval::Weekly),
        Just(RecurringInterval::Monthly),
        Just(RecurringInterval::Yearly),
    ]
}

proptest! {
    /// Property: the next occurrence is always strictly later
    #[test]
    fn prop_next_occurrence_moves_forward(anchor in any_date(), interval in any_interval()) {
        let next = RecurrenceCalculator::next_occurrence(anchor, interval).unwrap();
        prop_assert!(next > anchor);
    }

    /// Property: daily and weekly steps are fixed lengths
    #[test]
    fn prop_fixed_length_steps(anchor in any_date()) {
        let daily = RecurrenceCalculator::next_occurrence(anchor, RecurringInterval::Daily).unwrap();
        let weekly = RecurrenceCalculator::next_occurrence(anchor, RecurringInterval::Weekly).unwrap();
        prop_assert_eq!(daily - anchor, Duration::days(1));
        prop_assert_eq!(weekly - anchor, Duration::days(7));
    }

    /// Property: monthly steps land in the following month, clamped to its length
    #[test]
    fn prop_monthly_step_clamps(anchor in any_date()) {
        let next = RecurrenceCalculator::next_occurrence(anchor, RecurringInterval::Monthly).unwrap();
        let (ey, em) = if anchor.month() == 12 {
            (anchor.year() + 1, 1)
        } else {
            (anchor.year(), anchor.month() + 1)
        };
        prop_assert_eq!(next.year(), ey);
        prop_assert_eq!(next.month(), em);
        prop_assert_eq!(next.day(), anchor.day().min(last_day_of_month(ey, em)));
    }

    /// Property: catching up lands on the first occurrence after the given day
    #[test]
    fn prop_next_occurrence_after_is_first_future_step(
        anchor in any_date(),
        interval in any_interval(),
        gap in 0i64..4000,
    ) {
        let after = anchor + Duration::days(gap);
        let next = RecurrenceCalculator::next_occurrence_after(anchor, interval, after).unwrap();
        prop_assert!(next > after);
        let bound = match interval {
            RecurringInterval::Daily => 1,
            RecurringInterval::Weekly => 7,
            RecurringInterval::Monthly => 31,
            RecurringInterval::Yearly => 366,
        };
        prop_assert!(next - after <= Duration::days(bound));
    }

    /// Property: the monthly report date is the next first-of-month at midnight
    #[test]
    fn prop_monthly_report_date(now in any_instant()) {
        let next = ReportFrequency::Monthly.next_report_date(now).unwrap();
        prop_assert!(next > now);
        prop_assert_eq!(next.day(), 1);
        prop_assert_eq!(next.num_seconds_from_midnight(), 0);
        prop_assert!(next - now <= Duration::days(31));
    }

    /// Property: the weekly report date is the next Monday at midnight
    #[test]
    fn prop_weekly_report_date(now in any_instant()) {
        let next = ReportFrequency::Weekly.next_report_date(now).unwrap();
        prop_assert!(next > now);
        prop_assert_eq!(next.weekday(), Weekday::Mon);
        prop_assert_eq!(next.num_seconds_from_midnight(), 0);
        prop_assert!(next - now <= Duration::days(7));
    }

    /// Property: a scheduled window ends before the day it is reported on
    #[test]
    fn prop_reporting_window_precedes_now(now in any_instant()) {
        for frequency in [ReportFrequency::Weekly, ReportFrequency::Monthly] {
            let window = frequency.reporting_window(now).unwrap();
            prop_assert!(window.from <= window.to);
            prop_assert!(window.to < now.date_naive());
        }
    }
}
