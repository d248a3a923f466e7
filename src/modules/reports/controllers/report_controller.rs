use actix_web::{web, HttpResponse};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::core::{AppError, PageRequest, Result};
use crate::middleware::auth::CurrentUser;
use crate::modules::reports::models::{
    ReportSummary, SpendingAggregates, UpdateReportSettingRequest,
};
use crate::modules::reports::services::{AdHocReport, ReportService};

/// Query parameters for the ad hoc report endpoint
#[derive(Debug, Deserialize)]
pub struct GenerateReportQuery {
    /// Start of the window (inclusive, format: YYYY-MM-DD)
    pub from: Option<String>,
    /// End of the window (inclusive, format: YYYY-MM-DD)
    pub to: Option<String>,
}

/// Response body of the ad hoc report endpoint
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportResponse {
    pub message: String,
    pub period: String,
    pub summary: SpendingAggregates,
    pub insights: Vec<String>,
    pub email_sent: bool,
}

impl GenerateReportResponse {
    fn new(report: ReportSummary, email_sent: bool) -> Self {
        let message = if email_sent {
            "Report generated and emailed successfully."
        } else {
            "Report generated, but the email could not be sent."
        };
        Self {
            message: message.to_string(),
            period: report.period,
            summary: report.summary,
            insights: report.insights,
            email_sent,
        }
    }
}

fn parse_date(field: &str, value: Option<&str>) -> Result<NaiveDate> {
    let value = value.ok_or_else(|| {
        AppError::validation("Please provide 'from' and 'to' query parameters.")
    })?;
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        AppError::validation(format!(
            "Invalid {} format: '{}'. Expected YYYY-MM-DD",
            field, value
        ))
    })
}

/// GET /reports
pub async fn list_reports(
    service: web::Data<Arc<ReportService>>,
    user: CurrentUser,
    query: web::Query<PageRequest>,
) -> Result<HttpResponse> {
    let page = service.list_reports(user.id(), query.into_inner()).await?;

    Ok(HttpResponse::Ok().json(page))
}

/// GET /reports/settings
pub async fn get_settings(
    service: web::Data<Arc<ReportService>>,
    user: CurrentUser,
) -> Result<HttpResponse> {
    let setting = service.get_settings(user.id(), Utc::now()).await?;
    Ok(HttpResponse::Ok().json(setting))
}

/// PUT /reports/settings
pub async fn update_settings(
    service: web::Data<Arc<ReportService>>,
    user: CurrentUser,
    body: web::Json<UpdateReportSettingRequest>,
) -> Result<HttpResponse> {
    let setting = service
        .update_settings(user.id(), body.into_inner(), Utc::now())
        .await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Report settings updated successfully",
        "setting": setting,
    })))
}

/// GET /reports/generate?from=YYYY-MM-DD&to=YYYY-MM-DD
///
/// Computes the report for the window and emails it to the caller.
/// The summary is returned even if delivery fails.
pub async fn generate_report(
    service: web::Data<Arc<ReportService>>,
    user: CurrentUser,
    query: web::Query<GenerateReportQuery>,
) -> Result<HttpResponse> {
    let from = parse_date("from", query.from.as_deref())?;
    let to = parse_date("to", query.to.as_deref())?;

    match service
        .generate_ad_hoc(user.id(), from, to, Utc::now())
        .await?
    {
        AdHocReport::Generated { report, email_sent } => {
            Ok(HttpResponse::Ok().json(GenerateReportResponse::new(report, email_sent)))
        }
        AdHocReport::NoTransactions => Err(AppError::validation(
            "No transactions found for the given period.",
        )),
    }
}

/// Configure routes for reports module
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/reports")
            .route("", web::get().to(list_reports))
            .route("/settings", web::get().to(get_settings))
            .route("/settings", web::put().to(update_settings))
            .route("/generate", web::get().to(generate_report)),
    );
}
