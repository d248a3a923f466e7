// HTTP tests for the report and transaction endpoints
//
// Builds the real route table over in-memory persistence and stub
// collaborators. The readiness check needs a database and is not covered.

#[path = "../helpers/mod.rs"]
mod helpers;

use actix_web::{http::StatusCode, test, web, App};
use serde_json::{json, Value};
use std::sync::Arc;

use finreport::configure_routes;
use finreport::middleware::{json_config, query_config, USER_ID_HEADER};
use finreport::modules::insights::UnavailableReceiptScanner;
use finreport::modules::reports::models::{ReportHistoryEntry, ReportStatus};
use finreport::modules::reports::services::ReportService;
use finreport::modules::transactions::TransactionService;
use helpers::*;

macro_rules! app {
    ($harness:expr) => {{
        let reports: Arc<ReportService> = Arc::new($harness.service());
        let transactions = Arc::new(TransactionService::new(
            Arc::new($harness.store.clone()),
            Arc::new(UnavailableReceiptScanner),
        ));
        test::init_service(
            App::new()
                .app_data(json_config())
                .app_data(query_config())
                .app_data(web::Data::new(reports))
                .app_data(web::Data::new(transactions))
                .configure(configure_routes),
        )
        .await
    }};
}

fn seed_june(harness: &ReportHarness) {
    harness.store.add_user(TestDataFactory::user("alice"));
    harness.store.add_transaction(TestDataFactory::income(
        "alice",
        10_000,
        TestDataFactory::date(2025, 6, 1),
    ));
    harness.store.add_transaction(TestDataFactory::expense(
        "alice",
        500,
        "food",
        TestDataFactory::date(2025, 6, 3),
    ));
}

#[actix_web::test]
async fn test_requests_without_user_are_rejected() {
    let harness = ReportHarness::new();
    let app = app!(harness);

    let req = test::TestRequest::get().uri("/api/reports").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], 401);
}

#[actix_web::test]
async fn test_health_check_is_public() {
    let harness = ReportHarness::new();
    let app = app!(harness);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["status"], "healthy");
}

#[actix_web::test]
async fn test_list_reports_returns_page() {
    let harness = ReportHarness::new();
    for day in 1..=3 {
        harness.store.add_history(ReportHistoryEntry::new(
            "alice",
            format!("report {}", day),
            ReportStatus::Sent,
            TestDataFactory::instant(2025, 6, day, 2, 30),
        ));
    }
    let app = app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/reports?pageNumber=1&pageSize=2")
        .insert_header((USER_ID_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["totalCount"], 3);
    assert_eq!(body["pagination"]["totalPages"], 2);
    assert_eq!(body["items"].as_array().unwrap().len(), 2);
    assert_eq!(body["items"][0]["period"], "report 3");
    assert_eq!(body["items"][0]["status"], "SENT");
}

#[actix_web::test]
async fn test_settings_round_trip() {
    let harness = ReportHarness::new();
    let app = app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/reports/settings")
        .insert_header((USER_ID_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["isEnabled"], false);
    assert_eq!(body["frequency"], "MONTHLY");

    let req = test::TestRequest::put()
        .uri("/api/reports/settings")
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({ "isEnabled": true, "frequency": "WEEKLY" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["setting"]["isEnabled"], true);
    assert_eq!(body["setting"]["frequency"], "WEEKLY");

    let stored = harness.store.setting_for_user("alice").unwrap();
    assert!(stored.is_enabled);
}

#[actix_web::test]
async fn test_settings_reject_unknown_frequency() {
    let harness = ReportHarness::new();
    let app = app!(harness);

    let req = test::TestRequest::put()
        .uri("/api/reports/settings")
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({ "frequency": "HOURLY" }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_generate_without_transactions_is_bad_request() {
    let harness = ReportHarness::new();
    harness.store.add_user(TestDataFactory::user("alice"));
    let app = app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/reports/generate?from=2025-06-01&to=2025-06-30")
        .insert_header((USER_ID_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .contains("No transactions found for the given period."));
}

#[actix_web::test]
async fn test_generate_requires_both_dates() {
    let harness = ReportHarness::new();
    let app = app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/reports/generate?from=2025-06-01")
        .insert_header((USER_ID_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_generate_returns_summary_and_emails() {
    let harness = ReportHarness::new();
    seed_june(&harness);
    let app = app!(harness);

    let req = test::TestRequest::get()
        .uri("/api/reports/generate?from=2025-06-01&to=2025-06-30")
        .insert_header((USER_ID_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["emailSent"], true);
    assert_eq!(body["period"], "June 1–30, 2025");
    assert_eq!(body["summary"]["income"], 10_000);
    assert_eq!(body["summary"]["balance"], 9_500);
    assert_eq!(harness.dispatch.sent().len(), 1);
}

#[actix_web::test]
async fn test_create_transaction() {
    let harness = ReportHarness::new();
    let app = app!(harness);

    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({
            "title": "Gym membership",
            "amount": 4_999,
            "type": "EXPENSE",
            "category": "health",
            "date": "2025-06-01",
            "isRecurring": true,
            "recurringInterval": "MONTHLY"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["transaction"]["isRecurring"], true);

    let stored = harness.store.transactions();
    assert_eq!(stored.len(), 1);
    assert!(stored[0].next_recurring_date.is_some());
}

#[actix_web::test]
async fn test_scan_receipt_without_scanner_is_unavailable() {
    let harness = ReportHarness::new();
    let app = app!(harness);

    let req = test::TestRequest::post()
        .uri("/api/transactions/scan-receipt")
        .insert_header((USER_ID_HEADER, "alice"))
        .insert_header(("content-type", "image/png"))
        .set_payload(vec![0x89, 0x50, 0x4e, 0x47])
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn test_transaction_lifecycle_over_http() {
    let harness = ReportHarness::new();
    let app = app!(harness);

    let req = test::TestRequest::post()
        .uri("/api/transactions")
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({
            "title": "Salary",
            "amount": 500_000,
            "type": "INCOME",
            "category": "salary",
            "date": "2025-06-01"
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["transaction"]["id"].as_str().unwrap().to_string();

    let req = test::TestRequest::get()
        .uri("/api/transactions?type=INCOME&recurringStatus=NON_RECURRING&pageSize=10")
        .insert_header((USER_ID_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["pagination"]["totalCount"], 1);
    assert_eq!(body["items"][0]["id"], id.as_str());

    let req = test::TestRequest::put()
        .uri(&format!("/api/transactions/{}", id))
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({ "isRecurring": true, "recurringInterval": "MONTHLY" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["transaction"]["isRecurring"], true);
    assert!(body["transaction"]["nextRecurringDate"].is_string());

    let req = test::TestRequest::get()
        .uri(&format!("/api/transactions/{}", id))
        .insert_header((USER_ID_HEADER, "bob"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::post()
        .uri(&format!("/api/transactions/{}/duplicate", id))
        .insert_header((USER_ID_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["transaction"]["isRecurring"], false);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/transactions/{}", id))
        .insert_header((USER_ID_HEADER, "alice"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(harness.store.transactions().len(), 1);
}

#[actix_web::test]
async fn test_bulk_routes() {
    let harness = ReportHarness::new();
    let app = app!(harness);

    let req = test::TestRequest::post()
        .uri("/api/transactions/bulk")
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({
            "transactions": [
                { "title": "Lunch", "amount": 1_250, "type": "EXPENSE", "category": "food", "date": "2025-06-02" },
                { "title": "Bus", "amount": 275, "type": "EXPENSE", "category": "transport", "date": "2025-06-02" }
            ]
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["insertedCount"], 2);

    let ids: Vec<String> = harness
        .store
        .transactions()
        .into_iter()
        .map(|t| t.id)
        .collect();
    let req = test::TestRequest::delete()
        .uri("/api/transactions/bulk-delete")
        .insert_header((USER_ID_HEADER, "alice"))
        .set_json(json!({ "transactionIds": ids }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["deletedCount"], 2);
    assert!(harness.store.transactions().is_empty());
}
